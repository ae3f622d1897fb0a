//! Session aggregate entity.
//!
//! A session is one trip-planning conversation: its transcript, the current
//! analysis of the collected fields, and the itinerary once one exists.
//!
//! # Invariants
//!
//! - `session_id` never changes after creation
//! - `messages` is append-only; turns are never reordered or removed
//! - `latest_analysis` is replaced as a whole, never patched
//! - `updated_at` moves forward on every applied update

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::trip::{Itinerary, MergeOutcome, TripField, TripRecord};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One message in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: Timestamp,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            timestamp: Timestamp::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            timestamp: Timestamp::now(),
        }
    }
}

/// Materialized view of the record after the latest merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub missing_fields: Vec<TripField>,
    pub complete: bool,
    pub extracted_data: TripRecord,
}

impl Analysis {
    /// Analysis of an empty record.
    pub fn empty() -> Self {
        Self::from(MergeOutcome::of(TripRecord::new()))
    }
}

impl Default for Analysis {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<MergeOutcome> for Analysis {
    fn from(outcome: MergeOutcome) -> Self {
        Self {
            missing_fields: outcome.missing_fields,
            complete: outcome.complete,
            extracted_data: outcome.record,
        }
    }
}

/// Changes applied to a session in one persistence call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionUpdate {
    /// Turns appended to the transcript, in order.
    pub append_messages: Vec<Turn>,
    /// Replaces the stored analysis when set.
    pub latest_analysis: Option<Analysis>,
    /// Replaces the stored itinerary when set.
    pub itinerary: Option<Itinerary>,
}

impl SessionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(mut self, turn: Turn) -> Self {
        self.append_messages.push(turn);
        self
    }

    pub fn with_analysis(mut self, analysis: Analysis) -> Self {
        self.latest_analysis = Some(analysis);
        self
    }

    pub fn with_itinerary(mut self, itinerary: Itinerary) -> Self {
        self.itinerary = Some(itinerary);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.append_messages.is_empty() && self.latest_analysis.is_none() && self.itinerary.is_none()
    }
}

/// Session aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    session_id: SessionId,
    created_at: Timestamp,
    updated_at: Timestamp,
    #[serde(default)]
    messages: Vec<Turn>,
    #[serde(default)]
    latest_analysis: Analysis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    itinerary: Option<Itinerary>,
}

impl Session {
    /// Creates an empty session.
    pub fn new(session_id: SessionId) -> Self {
        let now = Timestamp::now();
        Self {
            session_id,
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
            latest_analysis: Analysis::empty(),
            itinerary: None,
        }
    }

    /// Reconstitute a session from persistence (no validation).
    pub fn reconstitute(
        session_id: SessionId,
        created_at: Timestamp,
        updated_at: Timestamp,
        messages: Vec<Turn>,
        latest_analysis: Analysis,
        itinerary: Option<Itinerary>,
    ) -> Self {
        Self {
            session_id,
            created_at,
            updated_at,
            messages,
            latest_analysis,
            itinerary,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    pub fn messages(&self) -> &[Turn] {
        &self.messages
    }

    pub fn latest_analysis(&self) -> &Analysis {
        &self.latest_analysis
    }

    pub fn itinerary(&self) -> Option<&Itinerary> {
        self.itinerary.as_ref()
    }

    /// The accumulated trip record.
    pub fn record(&self) -> &TripRecord {
        &self.latest_analysis.extracted_data
    }

    pub fn is_complete(&self) -> bool {
        self.latest_analysis.complete
    }

    /// Content of the most recent turn, if any.
    pub fn last_message(&self) -> Option<&Turn> {
        self.messages.last()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Applies an update and refreshes `updated_at`.
    pub fn apply(&mut self, update: SessionUpdate) {
        self.messages.extend(update.append_messages);
        if let Some(analysis) = update.latest_analysis {
            self.latest_analysis = analysis;
        }
        if let Some(itinerary) = update.itinerary {
            self.itinerary = Some(itinerary);
        }
        let now = Timestamp::now();
        if now.is_after(&self.updated_at) {
            self.updated_at = now;
        }
    }
}
