//! Integration tests for the REST API.
//!
//! Requests go through the fully layered router with `oneshot`, backed by
//! the in-memory store and a scripted model.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use trip_planner::adapters::ai::{MockAIProvider, MockError, MockResponse};
use trip_planner::adapters::http::{build_router, HttpOptions, SessionHandlers};
use trip_planner::adapters::storage::InMemorySessionRepository;
use trip_planner::adapters::websocket::{RoomManager, WebSocketState};
use trip_planner::application::{
    ConnectSessionHandler, ConversationSettings, CreateSessionHandler, HandleTurnHandler,
    ModelSettings, SessionQueryHandler,
};
use trip_planner::ports::{CallPurpose, SessionRepository};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn app(provider: &MockAIProvider) -> Router {
    let repo: Arc<dyn SessionRepository> = Arc::new(InMemorySessionRepository::new());
    let turns = HandleTurnHandler::new(
        repo.clone(),
        Arc::new(provider.clone()),
        ModelSettings::default(),
        &ConversationSettings::default(),
    );
    let sessions = SessionHandlers::new(
        Arc::new(CreateSessionHandler::new(repo.clone())),
        Arc::new(SessionQueryHandler::new(repo.clone())),
        turns.clone(),
    );
    let websocket = WebSocketState::new(
        Arc::new(RoomManager::default()),
        Arc::new(ConnectSessionHandler::new(repo, "Welcome!")),
        turns,
    );
    build_router(&HttpOptions::default(), sessions, websocket)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn new_session(app: &Router) -> String {
    let (status, body) = send(app, Method::POST, "/api/sessions", None).await;
    assert_eq!(status, StatusCode::OK);
    body["session_id"].as_str().unwrap().to_string()
}

fn extraction(reply: &str, data: Value) -> MockResponse {
    MockResponse::success(json!({ "response": reply, "extracted_data": data }).to_string())
}

fn all_but_food() -> Value {
    json!({
        "destination": "Rome",
        "departure": "Berlin",
        "travel_period": "3 days",
        "people": "2",
        "budget": "2000 USD",
        "accommodation": "hotel near the centre",
        "activities": ["museums"]
    })
}

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn create_session_works_with_post_and_get() {
    let app = app(&MockAIProvider::new());

    let (post_status, post_body) = send(&app, Method::POST, "/api/sessions", None).await;
    let (get_status, get_body) = send(&app, Method::GET, "/api/sessions", None).await;

    assert_eq!(post_status, StatusCode::OK);
    assert_eq!(get_status, StatusCode::OK);
    assert_ne!(post_body["session_id"], get_body["session_id"]);
}

#[tokio::test]
async fn new_session_has_empty_history_and_all_fields_missing() {
    let app = app(&MockAIProvider::new());
    let id = new_session(&app).await;

    let (_, history) = send(&app, Method::GET, &format!("/api/sessions/{}/history", id), None).await;
    let (_, completion) =
        send(&app, Method::GET, &format!("/api/sessions/{}/completion", id), None).await;

    assert_eq!(history["session_id"], json!(id));
    assert_eq!(history["messages"], json!([]));
    assert_eq!(completion["complete"], json!(false));
    assert_eq!(completion["missing_fields"].as_array().unwrap().len(), 8);
    assert!(completion.get("extracted_data").is_none());
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn chat_returns_reply_and_missing_fields() {
    let provider = MockAIProvider::new();
    provider.push_for(
        CallPurpose::Extraction,
        extraction("Rome! Where are you flying from?", json!({ "destination": "Rome" })),
    );
    let app = app(&provider);
    let id = new_session(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/chat", id),
        Some(json!({ "message": "Rome" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], json!("Rome! Where are you flying from?"));
    assert_eq!(body["complete"], json!(false));
    assert_eq!(body["missing_fields"][0], json!("departure"));
}

#[tokio::test]
async fn completing_chat_returns_itinerary() {
    let provider = MockAIProvider::new();
    provider.push_for(CallPurpose::Extraction, extraction("Noted.", all_but_food()));
    provider.push_for(
        CallPurpose::Extraction,
        extraction("Lovely.", json!({ "food": "pasta" })),
    );
    provider.push_for(
        CallPurpose::Itinerary,
        MockResponse::success("Day 1\nColosseum\nDay 2\nVatican\nDay 3\nTrastevere"),
    );
    let app = app(&provider);
    let id = new_session(&app).await;
    let uri = format!("/api/sessions/{}/chat", id);

    send(&app, Method::POST, &uri, Some(json!({ "message": "Rome..." }))).await;
    let (status, body) = send(&app, Method::POST, &uri, Some(json!({ "message": "pasta" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["itinerary"].as_str().unwrap().starts_with("Day 1"));
    assert_eq!(body["missing_fields"], json!([]));
    assert_eq!(body["complete"], json!(true));

    let (status, stored) =
        send(&app, Method::GET, &format!("/api/sessions/{}/itinerary", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["itinerary"], body["itinerary"]);

    let (_, completion) =
        send(&app, Method::GET, &format!("/api/sessions/{}/completion", id), None).await;
    assert_eq!(completion["complete"], json!(true));
    assert_eq!(completion["extracted_data"]["food"], json!("pasta"));
}

#[tokio::test]
async fn failed_generation_keeps_200_with_itinerary_error() {
    let provider = MockAIProvider::new();
    provider.push_for(CallPurpose::Extraction, extraction("Noted.", all_but_food()));
    provider.push_for(
        CallPurpose::Extraction,
        extraction("Lovely.", json!({ "food": "pasta" })),
    );
    provider.push_for(
        CallPurpose::Itinerary,
        MockResponse::Error(MockError::Unavailable {
            message: "overloaded".into(),
        }),
    );
    let app = app(&provider);
    let id = new_session(&app).await;
    let uri = format!("/api/sessions/{}/chat", id);

    send(&app, Method::POST, &uri, Some(json!({ "message": "Rome..." }))).await;
    let (status, body) = send(&app, Method::POST, &uri, Some(json!({ "message": "pasta" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], json!("Lovely."));
    assert_eq!(body["complete"], json!(true));
    assert!(body["itinerary_error"].is_string());

    let (status, _) = send(&app, Method::GET, &format!("/api/sessions/{}/itinerary", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let app = app(&MockAIProvider::new());
    let id = new_session(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/chat", id),
        Some(json!({ "message": "   " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("BAD_REQUEST"));
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let app = app(&MockAIProvider::new());
    let id = new_session(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/chat", id),
        Some(json!({ "text": "Rome" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Errors and reporting
// =============================================================================

#[tokio::test]
async fn unknown_session_is_404() {
    let app = app(&MockAIProvider::new());
    let unknown = uuid::Uuid::new_v4();

    for path in ["history", "analytics", "completion", "itinerary"] {
        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/sessions/{}/{}", unknown, path),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "GET {}", path);
        assert_eq!(body["code"], json!("NOT_FOUND"));
    }
}

#[tokio::test]
async fn malformed_session_id_is_400() {
    let app = app(&MockAIProvider::new());

    let (status, _) = send(&app, Method::GET, "/api/sessions/nope/history", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analytics_summarises_the_transcript() {
    let provider = MockAIProvider::new();
    provider.push_for(
        CallPurpose::Extraction,
        extraction("Where from?", json!({ "destination": "Oslo" })),
    );
    let app = app(&provider);
    let id = new_session(&app).await;
    send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/chat", id),
        Some(json!({ "message": "Oslo" })),
    )
    .await;

    let (status, body) = send(&app, Method::GET, &format!("/api/sessions/{}/analytics", id), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message_count"], json!(2));
    assert_eq!(body["completion_status"], json!(false));
    assert_eq!(body["collected_data"]["destination"], json!("Oslo"));
    assert_eq!(body["full_transcript"][0]["role"], json!("user"));
    assert_eq!(body["full_transcript"][1]["content"], json!("Where from?"));
}
