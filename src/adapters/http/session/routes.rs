//! HTTP routes for trip-planning session endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    chat, create_session, get_analytics, get_completion, get_history, get_itinerary, health,
    SessionHandlers,
};

/// Creates the session router, meant to be nested under `/api`.
pub fn session_routes(handlers: SessionHandlers) -> Router {
    Router::new()
        .route("/sessions", post(create_session).get(create_session))
        .route("/sessions/:id/chat", post(chat))
        .route("/sessions/:id/history", get(get_history))
        .route("/sessions/:id/analytics", get(get_analytics))
        .route("/sessions/:id/completion", get(get_completion))
        .route("/sessions/:id/itinerary", get(get_itinerary))
        .route("/health", get(health))
        .with_state(handlers)
}
