//! HTTP handlers for trip-planning session endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::{
    AnalyticsView, CompletionView, ConversationError, CreateSessionHandler, HandleTurnCommand,
    HandleTurnHandler, SessionQueryHandler,
};
use crate::domain::foundation::SessionId;

use super::dto::{
    ChatRequest, ChatResponse, ErrorResponse, HealthResponse, HistoryResponse, ItineraryResponse,
    SessionCreatedResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct SessionHandlers {
    create_handler: Arc<CreateSessionHandler>,
    query_handler: Arc<SessionQueryHandler>,
    turn_handler: HandleTurnHandler,
}

impl SessionHandlers {
    pub fn new(
        create_handler: Arc<CreateSessionHandler>,
        query_handler: Arc<SessionQueryHandler>,
        turn_handler: HandleTurnHandler,
    ) -> Self {
        Self {
            create_handler,
            query_handler,
            turn_handler,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST|GET /api/sessions - Start a new session
pub async fn create_session(State(handlers): State<SessionHandlers>) -> Response {
    match handlers.create_handler.handle().await {
        Ok(session) => {
            let response = SessionCreatedResponse {
                session_id: session.session_id().to_string(),
            };
            Json(response).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// POST /api/sessions/:id/chat - Process one user message
pub async fn chat(
    State(handlers): State<SessionHandlers>,
    Path(session_id): Path<String>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let outcome = handlers
        .turn_handler
        .handle(HandleTurnCommand::new(session_id, request.message))
        .await?;

    Ok(Json(ChatResponse::from(outcome)))
}

/// GET /api/sessions/:id/history - Ordered transcript
pub async fn get_history(
    State(handlers): State<SessionHandlers>,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    let messages = handlers.query_handler.history(session_id).await?;
    Ok(Json(HistoryResponse {
        session_id,
        messages,
    }))
}

/// GET /api/sessions/:id/analytics - Session summary
pub async fn get_analytics(
    State(handlers): State<SessionHandlers>,
    Path(session_id): Path<String>,
) -> Result<Json<AnalyticsView>, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    Ok(Json(handlers.query_handler.analytics(session_id).await?))
}

/// GET /api/sessions/:id/completion - Collected record or missing fields
pub async fn get_completion(
    State(handlers): State<SessionHandlers>,
    Path(session_id): Path<String>,
) -> Result<Json<CompletionView>, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    Ok(Json(handlers.query_handler.completion(session_id).await?))
}

/// GET /api/sessions/:id/itinerary - Latest generated itinerary
pub async fn get_itinerary(
    State(handlers): State<SessionHandlers>,
    Path(session_id): Path<String>,
) -> Result<Json<ItineraryResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    match handlers.query_handler.itinerary(session_id).await? {
        Some(itinerary) => Ok(Json(ItineraryResponse::new(session_id, itinerary))),
        None => Err(ApiError::NotFound(ErrorResponse::not_found(
            "Itinerary",
            &session_id.to_string(),
        ))),
    }
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

fn parse_session_id(raw: &str) -> Result<SessionId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("Invalid session ID".to_string()))
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

/// Failure of an HTTP request, rendered as `{code, message}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(ErrorResponse),
    Unavailable(String),
    Internal(String),
}

impl From<ConversationError> for ApiError {
    fn from(error: ConversationError) -> Self {
        match error {
            ConversationError::EmptyMessage => ApiError::BadRequest(error.to_string()),
            ConversationError::SessionNotFound(id) => {
                ApiError::NotFound(ErrorResponse::not_found("Session", &id.to_string()))
            }
            ConversationError::Storage(msg) => ApiError::Unavailable(msg),
            ConversationError::Aborted(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(msg)),
            ApiError::NotFound(body) => (StatusCode::NOT_FOUND, body),
            ApiError::Unavailable(msg) => {
                tracing::error!(error = %msg, "session storage unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::unavailable("Session storage is unavailable"),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::internal(msg))
            }
        };
        (status, Json(body)).into_response()
    }
}
