//! Itinerary generation against the model.

use futures::StreamExt;
use std::sync::Arc;

use crate::application::events::EventSink;
use crate::application::settings::ModelSettings;
use crate::domain::foundation::SessionId;
use crate::domain::trip::{render_itinerary_prompt, GenerationError, Itinerary, TripRecord};
use crate::ports::{
    AIError, AIProvider, CallPurpose, CompletionRequest, MessageRole, RequestMetadata,
    SessionEvent,
};

const GENERATE_INSTRUCTION: &str = "Please generate the itinerary based on the preferences above.";

/// Produces an itinerary from a complete record.
#[derive(Clone)]
pub struct ItineraryTrigger {
    ai_provider: Arc<dyn AIProvider>,
    settings: ModelSettings,
}

impl ItineraryTrigger {
    pub fn new(ai_provider: Arc<dyn AIProvider>, settings: ModelSettings) -> Self {
        Self {
            ai_provider,
            settings,
        }
    }

    /// Generates the itinerary for `record`.
    ///
    /// Streams `itinerary_chunk` events when `sink` is streaming, otherwise
    /// waits for the whole document.
    pub async fn generate(
        &self,
        session_id: &SessionId,
        record: &TripRecord,
        sink: &EventSink,
    ) -> Result<Itinerary, GenerationError> {
        let prompt = render_itinerary_prompt(record)?;

        let request = CompletionRequest::new(RequestMetadata::new(
            *session_id,
            CallPurpose::Itinerary,
            format!("itinerary-{}", session_id),
        ))
        .with_system_prompt(prompt)
        .with_message(MessageRole::User, GENERATE_INSTRUCTION)
        .with_temperature(self.settings.itinerary_temperature)
        .with_max_tokens(self.settings.itinerary_max_tokens);

        let content = if sink.is_streaming() {
            self.stream(request, sink).await
        } else {
            self.ai_provider
                .complete(request)
                .await
                .map(|response| response.content)
        }
        .map_err(|e| {
            tracing::error!(session_id = %session_id, error = %e, "itinerary generation failed");
            GenerationError::Provider(e.to_string())
        })?;

        let itinerary = Itinerary::new(content.trim());

        if let Some(days) = record.travel_days() {
            if !itinerary.covers_exactly(days) {
                tracing::warn!(
                    session_id = %session_id,
                    expected_days = days,
                    actual_days = itinerary.day_count(),
                    "itinerary day sections do not match travel period"
                );
            }
        }

        tracing::info!(
            session_id = %session_id,
            days = itinerary.day_count(),
            "itinerary generated"
        );
        Ok(itinerary)
    }

    async fn stream(&self, request: CompletionRequest, sink: &EventSink) -> Result<String, AIError> {
        let mut stream = self.ai_provider.stream_complete(request).await?;
        let mut full = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let done = chunk.is_final();
            if !chunk.delta.is_empty() {
                full.push_str(&chunk.delta);
                sink.emit(SessionEvent::ItineraryChunk {
                    content: chunk.delta,
                })
                .await;
            }
            if done {
                break;
            }
        }

        Ok(full)
    }
}
