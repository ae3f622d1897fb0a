//! Trip Planner - conversational travel planning
//!
//! Collects the details of a trip through multi-turn dialogue with a
//! language model, tracks which fields are still missing, and generates a
//! day-by-day itinerary once the record is complete.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
