//! ConnectSessionHandler - prepares a session for a live connection.

use std::sync::Arc;

use crate::application::error::ConversationError;
use crate::domain::foundation::SessionId;
use crate::domain::session::{Analysis, Session, SessionUpdate, Turn};
use crate::ports::{RepositoryError, SessionRepository};

/// What a newly connected client needs to render the conversation.
#[derive(Debug, Clone)]
pub struct ConnectedSession {
    /// Transcript before this connection.
    pub history: Vec<Turn>,
    pub analysis: Analysis,
    /// Welcome turn appended by this connection, if any.
    pub welcome: Option<Turn>,
}

/// Loads or creates the session and makes sure it opens with the welcome.
pub struct ConnectSessionHandler {
    repository: Arc<dyn SessionRepository>,
    welcome_message: String,
}

impl ConnectSessionHandler {
    pub fn new(repository: Arc<dyn SessionRepository>, welcome_message: impl Into<String>) -> Self {
        Self {
            repository,
            welcome_message: welcome_message.into(),
        }
    }

    pub async fn handle(&self, session_id: SessionId) -> Result<ConnectedSession, ConversationError> {
        let session = self.get_or_create(session_id).await?;
        let history = session.messages().to_vec();
        let analysis = session.latest_analysis().clone();

        let already_welcomed = session
            .last_message()
            .is_some_and(|turn| turn.content == self.welcome_message);
        if already_welcomed {
            return Ok(ConnectedSession {
                history,
                analysis,
                welcome: None,
            });
        }

        let welcome = Turn::assistant(self.welcome_message.clone());
        self.repository
            .update(&session_id, SessionUpdate::new().append(welcome.clone()), true)
            .await?;

        Ok(ConnectedSession {
            history,
            analysis,
            welcome: Some(welcome),
        })
    }

    async fn get_or_create(&self, session_id: SessionId) -> Result<Session, ConversationError> {
        if let Some(session) = self.repository.get(&session_id).await? {
            return Ok(session);
        }

        let session = Session::new(session_id);
        match self.repository.insert(&session).await {
            Ok(()) => {
                tracing::info!(session_id = %session_id, "session created on connect");
                Ok(session)
            }
            // Another connection created it first.
            Err(RepositoryError::AlreadyExists(_)) => self
                .repository
                .get(&session_id)
                .await?
                .ok_or(ConversationError::SessionNotFound(session_id)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemorySessionRepository;
    use crate::domain::session::TurnRole;

    const WELCOME: &str = "Welcome aboard!";

    fn handler(repo: &Arc<InMemorySessionRepository>) -> ConnectSessionHandler {
        ConnectSessionHandler::new(repo.clone(), WELCOME)
    }

    #[tokio::test]
    async fn unknown_session_is_created_with_welcome() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let id = SessionId::new();

        let connected = handler(&repo).handle(id).await.unwrap();

        assert!(connected.history.is_empty());
        assert_eq!(connected.welcome.as_ref().unwrap().content, WELCOME);
        let stored = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.messages().len(), 1);
        assert_eq!(stored.messages()[0].role, TurnRole::Assistant);
    }

    #[tokio::test]
    async fn reconnect_does_not_repeat_welcome() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let id = SessionId::new();
        handler(&repo).handle(id).await.unwrap();

        let connected = handler(&repo).handle(id).await.unwrap();

        assert!(connected.welcome.is_none());
        assert_eq!(connected.history.len(), 1);
        assert_eq!(repo.get(&id).await.unwrap().unwrap().messages().len(), 1);
    }

    #[tokio::test]
    async fn welcome_is_appended_again_after_conversation_moved_on() {
        // Given a session whose last message is not the welcome
        let repo = Arc::new(InMemorySessionRepository::new());
        let id = SessionId::new();
        handler(&repo).handle(id).await.unwrap();
        repo.update(&id, SessionUpdate::new().append(Turn::user("Paris")), false)
            .await
            .unwrap();

        // When the client reconnects
        let connected = handler(&repo).handle(id).await.unwrap();

        // Then history is returned as stored and a new welcome is added
        assert_eq!(connected.history.len(), 2);
        assert!(connected.welcome.is_some());
        assert_eq!(repo.get(&id).await.unwrap().unwrap().messages().len(), 3);
    }
}
