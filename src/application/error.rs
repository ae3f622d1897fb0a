//! Errors surfaced by application handlers.

use thiserror::Error;

use crate::domain::foundation::SessionId;
use crate::ports::RepositoryError;

/// Failures a caller of the conversation handlers can observe.
///
/// Model faults never appear here; they are absorbed into benign replies.
#[derive(Debug, Clone, Error)]
pub enum ConversationError {
    /// Message content is empty or whitespace only.
    #[error("message content cannot be empty")]
    EmptyMessage,

    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The session store failed; there is no safe default to continue with.
    #[error("storage error: {0}")]
    Storage(String),

    /// The spawned turn task panicked or was cancelled.
    #[error("turn processing aborted: {0}")]
    Aborted(String),
}

impl From<RepositoryError> for ConversationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => ConversationError::SessionNotFound(id),
            other => ConversationError::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_not_found_maps_to_session_not_found() {
        let id = SessionId::new();
        let err: ConversationError = RepositoryError::NotFound(id).into();
        assert!(matches!(err, ConversationError::SessionNotFound(found) if found == id));
    }

    #[test]
    fn repository_outage_maps_to_storage() {
        let err: ConversationError = RepositoryError::Unavailable("pool timed out".into()).into();
        assert!(matches!(err, ConversationError::Storage(_)));
    }
}
