//! Extraction adapter: one utterance in, a reply and candidate fields out.

use futures::StreamExt;
use std::sync::Arc;

use crate::application::events::EventSink;
use crate::application::settings::ModelSettings;
use crate::domain::foundation::SessionId;
use crate::domain::session::Turn;
use crate::domain::trip::{
    extraction_prompt, reply_prompt, KeywordScan, ModelReply, ParseStage, TripRecord,
    APOLOGY_MESSAGE,
};
use crate::ports::{
    AIError, AIProvider, CallPurpose, CompletionRequest, MessageRole, RequestMetadata,
    SessionEvent,
};

/// How the candidate for this turn was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    Structured(ParseStage),
    /// The model answered but nothing structured could be recovered.
    Fallback,
    /// The model call failed; the apology reply was used.
    Unavailable,
}

/// Output of one extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Reply text, when the model produced one.
    pub reply: Option<String>,
    /// Proposed field values; empty when nothing was recovered.
    pub candidate: TripRecord,
    pub source: ExtractionSource,
}

impl Extraction {
    fn unavailable() -> Self {
        Self {
            reply: Some(APOLOGY_MESSAGE.to_string()),
            candidate: TripRecord::new(),
            source: ExtractionSource::Unavailable,
        }
    }
}

impl From<ModelReply> for Extraction {
    fn from(reply: ModelReply) -> Self {
        match reply {
            ModelReply::Structured(s) => Self {
                reply: s.reply,
                candidate: s.candidate,
                source: ExtractionSource::Structured(s.stage),
            },
            ModelReply::Fallback(raw) => Self {
                reply: Some(raw),
                candidate: TripRecord::new(),
                source: ExtractionSource::Fallback,
            },
        }
    }
}

/// Wraps the language model for field extraction and reply streaming.
///
/// Model failures never escape: `extract` turns them into the apology reply
/// with an empty candidate.
#[derive(Clone)]
pub struct ExtractionAdapter {
    ai_provider: Arc<dyn AIProvider>,
    settings: ModelSettings,
}

impl ExtractionAdapter {
    pub fn new(ai_provider: Arc<dyn AIProvider>, settings: ModelSettings) -> Self {
        Self {
            ai_provider,
            settings,
        }
    }

    /// Structured extraction call.
    ///
    /// `history` is the transcript before this utterance. `update` carries
    /// the keyword scan when the turn was classified as an update.
    pub async fn extract(
        &self,
        session_id: &SessionId,
        utterance: &str,
        history: &[Turn],
        record: &TripRecord,
        update: Option<&KeywordScan>,
    ) -> Extraction {
        let request = CompletionRequest::new(RequestMetadata::new(
            *session_id,
            CallPurpose::Extraction,
            format!("extract-{}", session_id),
        ))
        .with_system_prompt(extraction_prompt(history, record, update))
        .with_message(MessageRole::User, utterance)
        .with_temperature(self.settings.extraction_temperature)
        .with_json_mode();

        match self.ai_provider.complete(request).await {
            Ok(response) => {
                let extraction = Extraction::from(ModelReply::parse(&response.content));
                tracing::debug!(
                    session_id = %session_id,
                    source = ?extraction.source,
                    fields = extraction.candidate.present_count(),
                    "extraction parsed"
                );
                extraction
            }
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "extraction call failed");
                Extraction::unavailable()
            }
        }
    }

    /// Text-only reply, streamed to `sink` as `stream_chunk` events.
    ///
    /// Returns the concatenated text.
    pub async fn stream_reply(
        &self,
        session_id: &SessionId,
        utterance: &str,
        history: &[Turn],
        record: &TripRecord,
        sink: &EventSink,
    ) -> Result<String, AIError> {
        let request = CompletionRequest::new(RequestMetadata::new(
            *session_id,
            CallPurpose::Reply,
            format!("reply-{}", session_id),
        ))
        .with_system_prompt(reply_prompt(history, record))
        .with_message(MessageRole::User, utterance)
        .with_temperature(self.settings.reply_temperature);

        let mut stream = self.ai_provider.stream_complete(request).await?;
        let mut full = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) if !full.trim().is_empty() => {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %e,
                        "reply stream interrupted, keeping partial text"
                    );
                    break;
                }
                Err(e) => return Err(e),
            };
            let done = chunk.is_final();
            if !chunk.delta.is_empty() {
                full.push_str(&chunk.delta);
                sink.emit(SessionEvent::StreamChunk {
                    content: chunk.delta,
                })
                .await;
            }
            if done {
                break;
            }
        }

        Ok(full.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};

    fn adapter(provider: &MockAIProvider) -> ExtractionAdapter {
        ExtractionAdapter::new(Arc::new(provider.clone()), ModelSettings::default())
    }

    mod extract {
        use super::*;

        #[tokio::test]
        async fn structured_response_yields_reply_and_candidate() {
            let provider = MockAIProvider::new().with_response_for(
                CallPurpose::Extraction,
                r#"{"response": "Where from?", "extracted_data": {"destination": "Bali"}}"#,
            );

            let extraction = adapter(&provider)
                .extract(&SessionId::new(), "Bali", &[], &TripRecord::new(), None)
                .await;

            assert_eq!(extraction.reply.as_deref(), Some("Where from?"));
            assert_eq!(extraction.candidate.destination.as_deref(), Some("Bali"));
            assert_eq!(extraction.source, ExtractionSource::Structured(ParseStage::Direct));
        }

        #[tokio::test]
        async fn plain_text_response_falls_back_verbatim() {
            let raw = "Sorry, I didn't catch that. Where would you like to go?";
            let provider = MockAIProvider::new().with_response_for(CallPurpose::Extraction, raw);

            let extraction = adapter(&provider)
                .extract(&SessionId::new(), "hmm", &[], &TripRecord::new(), None)
                .await;

            assert_eq!(extraction.reply.as_deref(), Some(raw));
            assert_eq!(extraction.candidate, TripRecord::new());
            assert_eq!(extraction.source, ExtractionSource::Fallback);
        }

        #[tokio::test]
        async fn provider_failure_returns_apology_with_empty_candidate() {
            let provider = MockAIProvider::new().with_error_for(
                CallPurpose::Extraction,
                MockError::Timeout { timeout_secs: 30 },
            );

            let extraction = adapter(&provider)
                .extract(&SessionId::new(), "Bali", &[], &TripRecord::new(), None)
                .await;

            assert_eq!(extraction.reply.as_deref(), Some(APOLOGY_MESSAGE));
            assert_eq!(extraction.candidate, TripRecord::new());
            assert_eq!(extraction.source, ExtractionSource::Unavailable);
        }

        #[tokio::test]
        async fn request_uses_json_mode_and_extraction_temperature() {
            let provider = MockAIProvider::new();

            adapter(&provider)
                .extract(&SessionId::new(), "Bali", &[], &TripRecord::new(), None)
                .await;

            let calls = provider.calls_for(CallPurpose::Extraction);
            assert_eq!(calls.len(), 1);
            assert!(calls[0].json_mode);
            assert_eq!(calls[0].temperature, Some(0.3));
            assert_eq!(calls[0].last_user_message(), Some("Bali"));
        }

        #[tokio::test]
        async fn update_hint_reaches_prompt() {
            let provider = MockAIProvider::new();
            let scan = KeywordScan::scan("change the hotel");

            adapter(&provider)
                .extract(&SessionId::new(), "change the hotel", &[], &TripRecord::new(), Some(&scan))
                .await;

            let prompt = provider.calls_for(CallPurpose::Extraction)[0]
                .system_prompt
                .clone()
                .unwrap();
            assert!(prompt.contains("Extract ONLY the fields being updated"));
        }
    }

    mod stream_reply {
        use super::*;

        #[tokio::test]
        async fn forwards_chunks_and_returns_full_text() {
            let provider =
                MockAIProvider::new().with_response_for(CallPurpose::Reply, "Lovely choice! Where from?");
            let (sink, mut rx) = EventSink::channel(16);

            let text = adapter(&provider)
                .stream_reply(&SessionId::new(), "Bali", &[], &TripRecord::new(), &sink)
                .await
                .unwrap();
            drop(sink);

            let mut streamed = String::new();
            while let Some(event) = rx.recv().await {
                if let SessionEvent::StreamChunk { content } = event {
                    streamed.push_str(&content);
                }
            }
            assert_eq!(text, "Lovely choice! Where from?");
            assert_eq!(streamed, text);
        }

        #[tokio::test]
        async fn propagates_provider_error() {
            let provider = MockAIProvider::new()
                .with_error_for(CallPurpose::Reply, MockError::AuthenticationFailed);

            let result = adapter(&provider)
                .stream_reply(&SessionId::new(), "Bali", &[], &TripRecord::new(), &EventSink::disabled())
                .await;

            assert!(matches!(result, Err(AIError::AuthenticationFailed)));
        }

        #[tokio::test]
        async fn interrupted_stream_keeps_text_already_sent() {
            let provider = MockAIProvider::new().with_interrupted_stream_for(
                CallPurpose::Reply,
                "Lovely choice! Where ",
                MockError::Network {
                    message: "connection reset".into(),
                },
            );
            let (sink, mut rx) = EventSink::channel(16);

            let text = adapter(&provider)
                .stream_reply(&SessionId::new(), "Bali", &[], &TripRecord::new(), &sink)
                .await
                .unwrap();
            drop(sink);

            let mut streamed = String::new();
            while let Some(event) = rx.recv().await {
                if let SessionEvent::StreamChunk { content } = event {
                    streamed.push_str(&content);
                }
            }
            assert_eq!(text, "Lovely choice! Where");
            assert_eq!(streamed.trim(), text);
        }

        #[tokio::test]
        async fn interruption_before_any_text_is_an_error() {
            let provider = MockAIProvider::new().with_interrupted_stream_for(
                CallPurpose::Reply,
                "",
                MockError::Timeout { timeout_secs: 5 },
            );

            let result = adapter(&provider)
                .stream_reply(&SessionId::new(), "Bali", &[], &TripRecord::new(), &EventSink::disabled())
                .await;

            assert!(matches!(result, Err(AIError::Timeout { timeout_secs: 5 })));
        }
    }
}
