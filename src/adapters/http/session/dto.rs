//! HTTP DTOs for trip-planning session endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};

use crate::application::{ItineraryOutcome, TurnOutcome};
use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::session::Turn;
use crate::domain::trip::{Itinerary, TripField};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// One user utterance.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Response for a newly created session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreatedResponse {
    pub session_id: String,
}

/// Result of one chat turn.
///
/// Carries `response` for an ordinary turn, or `itinerary` when a document
/// was produced. A failed generation keeps the reply and adds
/// `itinerary_error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub itinerary: Option<String>,
    pub missing_fields: Vec<TripField>,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub itinerary_error: Option<String>,
}

impl From<TurnOutcome> for ChatResponse {
    fn from(outcome: TurnOutcome) -> Self {
        match outcome.itinerary {
            ItineraryOutcome::Generated(itinerary) => Self {
                response: None,
                itinerary: Some(itinerary.content),
                missing_fields: Vec::new(),
                complete: true,
                itinerary_error: None,
            },
            ItineraryOutcome::Failed(error) => Self {
                response: Some(outcome.reply),
                itinerary: None,
                missing_fields: outcome.analysis.missing_fields,
                complete: outcome.analysis.complete,
                itinerary_error: Some(error.to_string()),
            },
            ItineraryOutcome::NotTriggered => Self {
                response: Some(outcome.reply),
                itinerary: None,
                missing_fields: outcome.analysis.missing_fields,
                complete: outcome.analysis.complete,
                itinerary_error: None,
            },
        }
    }
}

/// Ordered transcript of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: SessionId,
    pub messages: Vec<Turn>,
}

/// Stored itinerary document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryResponse {
    pub session_id: SessionId,
    pub itinerary: String,
    pub generated_at: Timestamp,
}

impl ItineraryResponse {
    pub fn new(session_id: SessionId, itinerary: Itinerary) -> Self {
        Self {
            session_id,
            itinerary: itinerary.content,
            generated_at: itinerary.generated_at,
        }
    }
}

/// Liveness probe body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self::new("NOT_FOUND", format!("{} not found: {}", resource_type, id))
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new("SERVICE_UNAVAILABLE", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::Analysis;
    use crate::domain::trip::{Classification, GenerationError};
    use serde_json::json;

    fn outcome(itinerary: ItineraryOutcome) -> TurnOutcome {
        TurnOutcome {
            reply: "Where are you flying from?".to_string(),
            analysis: Analysis::empty(),
            classification: Classification::from_keywords("Tokyo"),
            itinerary,
        }
    }

    #[test]
    fn ordinary_turn_carries_reply_and_missing_fields() {
        let body = serde_json::to_value(ChatResponse::from(outcome(ItineraryOutcome::NotTriggered)))
            .unwrap();

        assert_eq!(body["response"], json!("Where are you flying from?"));
        assert_eq!(body["complete"], json!(false));
        assert_eq!(body["missing_fields"][0], json!("destination"));
        assert!(body.get("itinerary").is_none());
        assert!(body.get("itinerary_error").is_none());
    }

    #[test]
    fn generated_turn_carries_itinerary_only() {
        let generated = ItineraryOutcome::Generated(Itinerary::new("Day 1: arrive"));
        let body = serde_json::to_value(ChatResponse::from(outcome(generated))).unwrap();

        assert_eq!(body["itinerary"], json!("Day 1: arrive"));
        assert_eq!(body["missing_fields"], json!([]));
        assert_eq!(body["complete"], json!(true));
        assert!(body.get("response").is_none());
    }

    #[test]
    fn failed_generation_keeps_reply_and_reports_error() {
        let failed = ItineraryOutcome::Failed(GenerationError::Provider("timeout".into()));
        let body = serde_json::to_value(ChatResponse::from(outcome(failed))).unwrap();

        assert_eq!(body["response"], json!("Where are you flying from?"));
        assert!(body["itinerary_error"]
            .as_str()
            .unwrap()
            .contains("timeout"));
    }

    #[test]
    fn not_found_error_names_the_resource() {
        let error = ErrorResponse::not_found("Session", "abc");
        assert_eq!(error.code, "NOT_FOUND");
        assert_eq!(error.message, "Session not found: abc");
    }
}
