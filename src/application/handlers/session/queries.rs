//! Read-side queries over a session.

use serde::Serialize;
use std::sync::Arc;

use crate::application::error::ConversationError;
use crate::domain::foundation::SessionId;
use crate::domain::session::{Analysis, Session, Turn};
use crate::domain::trip::{Itinerary, TripField, TripRecord};
use crate::ports::SessionRepository;

/// Completion state as exposed to API consumers.
///
/// Complete sessions carry the record, incomplete ones the missing fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionView {
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<TripRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_fields: Option<Vec<TripField>>,
}

impl From<&Analysis> for CompletionView {
    fn from(analysis: &Analysis) -> Self {
        if analysis.complete {
            Self {
                complete: true,
                extracted_data: Some(analysis.extracted_data.clone()),
                missing_fields: None,
            }
        } else {
            Self {
                complete: false,
                extracted_data: None,
                missing_fields: Some(analysis.missing_fields.clone()),
            }
        }
    }
}

/// Session summary for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsView {
    pub session_id: SessionId,
    pub message_count: usize,
    pub latest_analysis: Analysis,
    pub completion_status: bool,
    pub collected_data: TripRecord,
    pub full_transcript: Vec<Turn>,
}

impl From<&Session> for AnalyticsView {
    fn from(session: &Session) -> Self {
        let analysis = session.latest_analysis();
        Self {
            session_id: *session.session_id(),
            message_count: session.messages().len(),
            latest_analysis: analysis.clone(),
            completion_status: analysis.complete,
            collected_data: analysis.extracted_data.clone(),
            full_transcript: session.messages().to_vec(),
        }
    }
}

/// Read-only access to stored sessions.
pub struct SessionQueryHandler {
    repository: Arc<dyn SessionRepository>,
}

impl SessionQueryHandler {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self { repository }
    }

    /// Ordered transcript.
    pub async fn history(&self, session_id: SessionId) -> Result<Vec<Turn>, ConversationError> {
        Ok(self.load(session_id).await?.messages().to_vec())
    }

    pub async fn completion(&self, session_id: SessionId) -> Result<CompletionView, ConversationError> {
        let session = self.load(session_id).await?;
        Ok(CompletionView::from(session.latest_analysis()))
    }

    pub async fn analytics(&self, session_id: SessionId) -> Result<AnalyticsView, ConversationError> {
        let session = self.load(session_id).await?;
        Ok(AnalyticsView::from(&session))
    }

    /// Stored itinerary, `None` when nothing was generated yet.
    pub async fn itinerary(
        &self,
        session_id: SessionId,
    ) -> Result<Option<Itinerary>, ConversationError> {
        Ok(self.load(session_id).await?.itinerary().cloned())
    }

    async fn load(&self, session_id: SessionId) -> Result<Session, ConversationError> {
        self.repository
            .get(&session_id)
            .await?
            .ok_or(ConversationError::SessionNotFound(session_id))
    }
}
