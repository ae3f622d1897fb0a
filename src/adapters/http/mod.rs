//! HTTP adapters - REST API and router assembly.

mod router;
pub mod session;

pub use router::{build_router, HttpOptions};
pub use session::{session_routes, ApiError, SessionHandlers};
