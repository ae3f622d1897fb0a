//! HandleTurnHandler - processes one user utterance end to end.
//!
//! Per turn: classify (only once the record is complete), extract, merge,
//! persist, then generate the itinerary when the regeneration policy says
//! so. Turns on one session are serialized through [`SessionLocks`].
//!
//! # Streaming
//!
//! [`HandleTurnHandler::handle_streaming`] runs the same steps on a spawned
//! task and reports progress as [`SessionEvent`]s. If the receiver goes
//! away, delivery stops but the merge, persist and generation still finish.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::application::error::ConversationError;
use crate::application::events::{EventSink, EVENT_CHANNEL_CAPACITY};
use crate::application::services::{
    ExtractionAdapter, IntentClassifier, ItineraryTrigger, SessionLocks,
};
use crate::application::settings::{ConversationSettings, ModelSettings};
use crate::domain::foundation::SessionId;
use crate::domain::session::{Analysis, SessionUpdate, Turn, TurnRole};
use crate::domain::trip::{
    merge, next_question, should_generate, Classification, GenerationError, Itinerary,
    RegenerationPolicy, MAX_TRAVEL_DAYS, MIN_TRAVEL_DAYS,
};
use crate::ports::{AIProvider, ItineraryStatus, SessionEvent, SessionRepository};

/// Command to process one user message.
#[derive(Debug, Clone)]
pub struct HandleTurnCommand {
    pub session_id: SessionId,
    pub message: String,
}

impl HandleTurnCommand {
    pub fn new(session_id: SessionId, message: impl Into<String>) -> Self {
        Self {
            session_id,
            message: message.into(),
        }
    }
}

/// What happened to the itinerary on this turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ItineraryOutcome {
    NotTriggered,
    Generated(Itinerary),
    /// Generation was due but failed; the record is unchanged.
    Failed(GenerationError),
}

/// Result of a processed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Assistant reply stored in the transcript.
    pub reply: String,
    /// Analysis after this turn's merge.
    pub analysis: Analysis,
    pub classification: Classification,
    pub itinerary: ItineraryOutcome,
}

/// Handler for conversation turns.
#[derive(Clone)]
pub struct HandleTurnHandler {
    repository: Arc<dyn SessionRepository>,
    extraction: ExtractionAdapter,
    classifier: IntentClassifier,
    itinerary: ItineraryTrigger,
    locks: SessionLocks,
    regeneration: RegenerationPolicy,
}

impl HandleTurnHandler {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        ai_provider: Arc<dyn AIProvider>,
        models: ModelSettings,
        conversation: &ConversationSettings,
    ) -> Self {
        Self {
            repository,
            extraction: ExtractionAdapter::new(ai_provider.clone(), models.clone()),
            classifier: IntentClassifier::new(
                ai_provider.clone(),
                models.clone(),
                conversation.model_classifier,
            ),
            itinerary: ItineraryTrigger::new(ai_provider, models),
            locks: SessionLocks::new(),
            regeneration: conversation.regeneration,
        }
    }

    /// Processes a turn and returns once everything is persisted.
    pub async fn handle(&self, cmd: HandleTurnCommand) -> Result<TurnOutcome, ConversationError> {
        self.process(cmd, &EventSink::disabled()).await
    }

    /// Processes a turn on a spawned task, streaming events as it goes.
    pub fn handle_streaming(
        &self,
        cmd: HandleTurnCommand,
    ) -> (
        mpsc::Receiver<SessionEvent>,
        JoinHandle<Result<TurnOutcome, ConversationError>>,
    ) {
        let (sink, rx) = EventSink::channel(EVENT_CHANNEL_CAPACITY);
        let handler = self.clone();
        let task = tokio::spawn(async move { handler.process(cmd, &sink).await });
        (rx, task)
    }

    async fn process(
        &self,
        cmd: HandleTurnCommand,
        sink: &EventSink,
    ) -> Result<TurnOutcome, ConversationError> {
        let session_id = cmd.session_id;
        let utterance = cmd.message.trim();
        if utterance.is_empty() {
            return Err(ConversationError::EmptyMessage);
        }

        let _guard = self.locks.acquire(&session_id).await;

        let session = self
            .repository
            .get(&session_id)
            .await?
            .ok_or(ConversationError::SessionNotFound(session_id))?;

        sink.emit(SessionEvent::Message {
            role: TurnRole::User,
            content: utterance.to_string(),
        })
        .await;
        sink.emit(SessionEvent::Typing { active: true }).await;

        // 1. Classify; the model is consulted only once every field is known
        let was_complete = session.is_complete();
        let classification = if was_complete {
            self.classifier
                .classify(&session_id, utterance, session.record())
                .await
        } else {
            Classification::from_keywords(utterance)
        };
        let is_update = classification.intent.is_update();

        // 2. Reply stream and structured extraction
        let streamed = if sink.is_streaming() {
            match self
                .extraction
                .stream_reply(&session_id, utterance, session.messages(), session.record(), sink)
                .await
            {
                Ok(text) => Some(text).filter(|t| !t.is_empty()),
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "reply stream failed");
                    None
                }
            }
        } else {
            None
        };

        let extraction = self
            .extraction
            .extract(
                &session_id,
                utterance,
                session.messages(),
                session.record(),
                is_update.then_some(&classification.scan),
            )
            .await;

        // 3. Merge
        let outcome = merge(session.record(), &extraction.candidate, is_update, utterance);
        let changed = &outcome.record != session.record();
        let now_complete = outcome.complete;

        if let Some(days) = outcome.record.travel_days() {
            if !(MIN_TRAVEL_DAYS..=MAX_TRAVEL_DAYS).contains(&days) {
                tracing::warn!(
                    session_id = %session_id,
                    days,
                    "travel period outside supported range"
                );
            }
        }

        let reply = streamed
            .or(extraction.reply)
            .unwrap_or_else(|| next_question(&outcome.record).to_string());
        let analysis = Analysis::from(outcome);

        // 4. Persist user turn, reply and analysis together
        let update = SessionUpdate::new()
            .append(Turn::user(utterance))
            .append(Turn::assistant(reply.clone()))
            .with_analysis(analysis.clone());
        if let Err(e) = self.repository.update(&session_id, update, false).await {
            tracing::error!(session_id = %session_id, error = %e, "failed to persist turn");
            sink.emit(SessionEvent::Error {
                message: e.to_string(),
            })
            .await;
            sink.emit(SessionEvent::Typing { active: false }).await;
            return Err(e.into());
        }

        sink.emit(SessionEvent::MessageComplete {
            content: reply.clone(),
        })
        .await;
        sink.emit(SessionEvent::ExtractionUpdate(analysis.clone()))
            .await;
        sink.emit(SessionEvent::Typing { active: false }).await;

        tracing::info!(
            session_id = %session_id,
            intent = ?classification.intent,
            changed,
            complete = now_complete,
            missing = analysis.missing_fields.len(),
            "turn processed"
        );

        // 5. Itinerary
        let itinerary = if should_generate(
            was_complete,
            now_complete,
            classification.intent,
            changed,
            self.regeneration,
        ) {
            self.generate(&session_id, &analysis, sink).await?
        } else {
            ItineraryOutcome::NotTriggered
        };

        Ok(TurnOutcome {
            reply,
            analysis,
            classification,
            itinerary,
        })
    }

    async fn generate(
        &self,
        session_id: &SessionId,
        analysis: &Analysis,
        sink: &EventSink,
    ) -> Result<ItineraryOutcome, ConversationError> {
        sink.emit(SessionEvent::ItineraryStatus {
            status: ItineraryStatus::Generating,
        })
        .await;

        match self
            .itinerary
            .generate(session_id, &analysis.extracted_data, sink)
            .await
        {
            Ok(itinerary) => {
                self.repository
                    .update(
                        session_id,
                        SessionUpdate::new().with_itinerary(itinerary.clone()),
                        false,
                    )
                    .await?;
                sink.emit(SessionEvent::ItineraryComplete {
                    itinerary: itinerary.content.clone(),
                })
                .await;
                Ok(ItineraryOutcome::Generated(itinerary))
            }
            Err(e) => {
                sink.emit(SessionEvent::Error {
                    message: e.to_string(),
                })
                .await;
                sink.emit(SessionEvent::ItineraryStatus {
                    status: ItineraryStatus::Failed,
                })
                .await;
                Ok(ItineraryOutcome::Failed(e))
            }
        }
    }
}
