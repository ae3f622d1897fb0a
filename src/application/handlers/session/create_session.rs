//! CreateSessionHandler - Command handler for creating new sessions.

use std::sync::Arc;

use crate::application::error::ConversationError;
use crate::domain::foundation::SessionId;
use crate::domain::session::Session;
use crate::ports::SessionRepository;

/// Handler for creating sessions.
pub struct CreateSessionHandler {
    repository: Arc<dyn SessionRepository>,
}

impl CreateSessionHandler {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self { repository }
    }

    /// Creates an empty session with a fresh id.
    pub async fn handle(&self) -> Result<Session, ConversationError> {
        let session = Session::new(SessionId::new());
        self.repository.insert(&session).await?;

        tracing::info!(
            session_id = %session.session_id(),
            backend = self.repository.backend_name(),
            "session created"
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemorySessionRepository;
    use crate::domain::session::SessionUpdate;
    use crate::ports::RepositoryError;
    use async_trait::async_trait;

    struct UnavailableRepository;

    #[async_trait]
    impl SessionRepository for UnavailableRepository {
        async fn get(&self, _id: &SessionId) -> Result<Option<Session>, RepositoryError> {
            Err(RepositoryError::Unavailable("down".into()))
        }

        async fn insert(&self, _session: &Session) -> Result<(), RepositoryError> {
            Err(RepositoryError::Unavailable("down".into()))
        }

        async fn update(
            &self,
            _id: &SessionId,
            _update: SessionUpdate,
            _upsert: bool,
        ) -> Result<Session, RepositoryError> {
            Err(RepositoryError::Unavailable("down".into()))
        }

        fn backend_name(&self) -> &'static str {
            "unavailable"
        }
    }

    #[tokio::test]
    async fn creates_and_persists_empty_session() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let handler = CreateSessionHandler::new(repo.clone());

        let session = handler.handle().await.unwrap();

        let stored = repo.get(session.session_id()).await.unwrap().unwrap();
        assert!(stored.messages().is_empty());
        assert!(!stored.is_complete());
    }

    #[tokio::test]
    async fn each_call_gets_a_distinct_id() {
        let handler = CreateSessionHandler::new(Arc::new(InMemorySessionRepository::new()));

        let a = handler.handle().await.unwrap();
        let b = handler.handle().await.unwrap();

        assert_ne!(a.session_id(), b.session_id());
    }

    #[tokio::test]
    async fn storage_failure_surfaces() {
        let handler = CreateSessionHandler::new(Arc::new(UnavailableRepository));

        let result = handler.handle().await;

        assert!(matches!(result, Err(ConversationError::Storage(_))));
    }
}
