//! Session repository port.
//!
//! A document store keyed by session id. The turn handler relies only on
//! three primitives: read a whole session, insert a new one, and apply an
//! update that appends messages and replaces the analysis atomically.
//!
//! # Concurrency
//!
//! Each `update` call must be atomic for its session. When two updates for
//! the same session race, the last committed write wins.

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::session::{Session, SessionUpdate};

/// Errors that can occur during session persistence.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Session already exists: {0}")]
    AlreadyExists(SessionId),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to serialize session: {0}")]
    Serialization(String),
}

/// Repository port for Session persistence.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Load a session. Returns `None` if it does not exist.
    async fn get(&self, id: &SessionId) -> Result<Option<Session>, RepositoryError>;

    /// Store a new session.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if a session with the same id is stored
    async fn insert(&self, session: &Session) -> Result<(), RepositoryError>;

    /// Append messages and replace analysis or itinerary in one step.
    ///
    /// With `upsert`, a missing session is created first.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the session is missing and `upsert` is false
    async fn update(
        &self,
        id: &SessionId,
        update: SessionUpdate,
        upsert: bool,
    ) -> Result<Session, RepositoryError>;

    /// Name used in logs and the health endpoint.
    fn backend_name(&self) -> &'static str;
}
