//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - Language model completions (buffered and streaming)
//! - `SessionRepository` - Session document store keyed by session id
//! - `SessionNotifier` - Per-session event fan-out to live connections

mod ai_provider;
mod session_notifier;
mod session_repository;

pub use ai_provider::{
    AIError, AIProvider, CallPurpose, ChunkStream, CompletionRequest, CompletionResponse,
    FinishReason, Message, MessageRole, ProviderInfo, RequestMetadata, StreamChunk, TokenUsage,
};
pub use session_notifier::{ItineraryStatus, SessionEvent, SessionNotifier};
pub use session_repository::{RepositoryError, SessionRepository};
