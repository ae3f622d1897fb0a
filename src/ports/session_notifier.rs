//! Session event fan-out port.
//!
//! Turn processing publishes [`SessionEvent`]s for a session; adapters
//! deliver them to every live connection joined to that session. The port
//! is passed explicitly to whoever needs it; there is no process-wide
//! registry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::SessionId;
use crate::domain::session::{Analysis, Turn, TurnRole};

/// Real-time event for clients watching a session.
///
/// Serialized as `{"type": "<snake_case variant>", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Full transcript, sent once on connect.
    History(Vec<Turn>),
    /// Current analysis, sent once on connect.
    ExtractionData(Analysis),
    /// A complete message from either side.
    Message { role: TurnRole, content: String },
    /// Assistant typing indicator.
    Typing { active: bool },
    /// Incremental reply text.
    StreamChunk { content: String },
    /// The reply for this turn is final.
    MessageComplete { content: String },
    /// Analysis after this turn's merge.
    ExtractionUpdate(Analysis),
    /// Itinerary generation progress.
    ItineraryStatus { status: ItineraryStatus },
    /// Incremental itinerary text.
    ItineraryChunk { content: String },
    /// The itinerary is final.
    ItineraryComplete { itinerary: String },
    /// Something went wrong processing the turn.
    Error { message: String },
}

/// Progress marker for itinerary generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItineraryStatus {
    Generating,
    Failed,
}

/// Port for delivering session events to connected clients.
#[async_trait]
pub trait SessionNotifier: Send + Sync {
    /// Deliver `event` to every connection joined to `session_id`.
    ///
    /// Delivery is best-effort; a session with no listeners is not an error.
    async fn notify(&self, session_id: &SessionId, event: SessionEvent);
}
