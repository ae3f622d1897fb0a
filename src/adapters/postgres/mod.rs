//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresSessionRepository` - Session documents in `trip_sessions`

mod session_repository;

pub use session_repository::PostgresSessionRepository;
