//! WebSocket wire format.
//!
//! Server → client frames are [`SessionEvent`]s serialized as
//! `{"type": ..., "data": ...}`. Client → server frames carry one user
//! message: `{"message": "..."}`.

use serde::Deserialize;

use crate::ports::SessionEvent;

/// A message typed by the user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientFrame {
    pub message: String,
}

impl ClientFrame {
    /// Parses a text frame. Returns `None` when it is not a valid frame.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Serializes an event for the wire.
pub fn encode(event: &SessionEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::TurnRole;
    use crate::ports::ItineraryStatus;
    use serde_json::json;

    #[test]
    fn parses_client_message() {
        assert_eq!(
            ClientFrame::parse(r#"{"message": "Tokyo"}"#),
            Some(ClientFrame {
                message: "Tokyo".into()
            })
        );
    }

    #[test]
    fn rejects_other_frames() {
        assert_eq!(ClientFrame::parse("Tokyo"), None);
        assert_eq!(ClientFrame::parse(r#"{"text": "Tokyo"}"#), None);
    }

    #[test]
    fn events_use_type_and_data() {
        let message = encode(&SessionEvent::Message {
            role: TurnRole::Assistant,
            content: "Hi".into(),
        })
        .unwrap();
        let status = encode(&SessionEvent::ItineraryStatus {
            status: ItineraryStatus::Generating,
        })
        .unwrap();

        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&message).unwrap(),
            json!({"type": "message", "data": {"role": "assistant", "content": "Hi"}})
        );
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&status).unwrap(),
            json!({"type": "itinerary_status", "data": {"status": "generating"}})
        );
    }
}
