//! Session command and query handlers.

mod connect_session;
mod create_session;
mod handle_turn;
mod queries;

pub use connect_session::{ConnectSessionHandler, ConnectedSession};
pub use create_session::CreateSessionHandler;
pub use handle_turn::{HandleTurnCommand, HandleTurnHandler, ItineraryOutcome, TurnOutcome};
pub use queries::{AnalyticsView, CompletionView, SessionQueryHandler};
