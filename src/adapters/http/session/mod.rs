//! HTTP adapter for trip-planning session endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    ChatRequest, ChatResponse, ErrorResponse, HealthResponse, HistoryResponse, ItineraryResponse,
    SessionCreatedResponse,
};
pub use handlers::{ApiError, SessionHandlers};
pub use routes::session_routes;
