//! In-Memory Session Repository
//!
//! Keeps sessions in a map guarded by an async lock. State is lost on
//! restart. Used for development and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::domain::session::{Session, SessionUpdate};
use crate::ports::{RepositoryError, SessionRepository};

/// In-memory session store
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Clear all stored sessions (useful for tests)
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn get(&self, id: &SessionId) -> Result<Option<Session>, RepositoryError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn insert(&self, session: &Session) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(session.session_id()) {
            return Err(RepositoryError::AlreadyExists(*session.session_id()));
        }
        sessions.insert(*session.session_id(), session.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: &SessionId,
        update: SessionUpdate,
        upsert: bool,
    ) -> Result<Session, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        let session = if upsert {
            sessions.entry(*id).or_insert_with(|| Session::new(*id))
        } else {
            sessions
                .get_mut(id)
                .ok_or(RepositoryError::NotFound(*id))?
        };
        session.apply(update);
        Ok(session.clone())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
