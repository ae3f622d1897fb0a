//! Application layer - Services, Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Command handlers (turns, session creation) are kept apart from the
//! read-only query handler.

pub mod error;
pub mod events;
pub mod handlers;
pub mod services;
pub mod settings;

pub use error::ConversationError;
pub use events::{EventSink, EVENT_CHANNEL_CAPACITY};
pub use handlers::{
    AnalyticsView, CompletionView, ConnectSessionHandler, ConnectedSession, CreateSessionHandler,
    HandleTurnCommand, HandleTurnHandler, ItineraryOutcome, SessionQueryHandler, TurnOutcome,
};
pub use settings::{ConversationSettings, ModelSettings};
