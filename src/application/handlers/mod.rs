//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod session;

pub use session::{
    AnalyticsView, CompletionView, ConnectSessionHandler, ConnectedSession, CreateSessionHandler,
    HandleTurnCommand, HandleTurnHandler, ItineraryOutcome, SessionQueryHandler, TurnOutcome,
};
