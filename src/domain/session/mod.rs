//! Session domain module.
//!
//! A session is one trip-planning conversation. The aggregate owns the
//! transcript and the latest analysis; all field reasoning lives in
//! `domain::trip`.

mod aggregate;

pub use aggregate::{Analysis, Session, SessionUpdate, Turn, TurnRole};
