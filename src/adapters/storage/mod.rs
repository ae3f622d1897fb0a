//! Storage Adapters
//!
//! Implementations of the SessionRepository port.
//!
//! ## Available Adapters
//!
//! - **InMemorySessionRepository** - Sessions in memory (testing/development)
//! - **FileSessionRepository** - One YAML document per session on disk
//!
//! The PostgreSQL store lives in [`crate::adapters::postgres`].
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileSessionRepository, InMemorySessionRepository};
//!
//! let repo = FileSessionRepository::new("./data/sessions");
//! let repo = InMemorySessionRepository::new();
//! ```

mod file_session_repository;
mod in_memory_session_repository;

pub use file_session_repository::FileSessionRepository;
pub use in_memory_session_repository::InMemorySessionRepository;
