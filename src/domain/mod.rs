//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `trip` - Field schema, reconciliation, intent and itinerary rules
//! - `session` - Conversation session aggregate

pub mod foundation;
pub mod session;
pub mod trip;
