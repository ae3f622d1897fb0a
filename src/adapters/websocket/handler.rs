//! WebSocket upgrade handler for live trip-planning conversations.
//!
//! Connection lifecycle:
//! 1. Parse the session id and upgrade
//! 2. Join the session room
//! 3. Load or create the session; send `history` and `extraction_data` to
//!    this connection, then broadcast the welcome when it is new
//! 4. Run each client message as a streaming turn, fanning its events out
//!    to the room
//! 5. Leave the room on disconnect

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};

use crate::application::{ConnectSessionHandler, HandleTurnCommand, HandleTurnHandler};
use crate::domain::foundation::{ConnectionId, SessionId};
use crate::domain::session::TurnRole;
use crate::ports::{SessionEvent, SessionNotifier};

use super::messages::{encode, ClientFrame};
use super::rooms::RoomManager;

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub room_manager: Arc<RoomManager>,
    pub connect: Arc<ConnectSessionHandler>,
    pub turns: HandleTurnHandler,
}

impl WebSocketState {
    pub fn new(
        room_manager: Arc<RoomManager>,
        connect: Arc<ConnectSessionHandler>,
        turns: HandleTurnHandler,
    ) -> Self {
        Self {
            room_manager,
            connect,
            turns,
        }
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws/:session_id`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<WebSocketState>,
) -> Response {
    let session_id: SessionId = match session_id.parse() {
        Ok(id) => id,
        Err(_) => return (StatusCode::BAD_REQUEST, "Invalid session ID").into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, session_id, state))
}

/// Runs for the lifetime of one connection.
async fn handle_socket(socket: WebSocket, session_id: SessionId, state: WebSocketState) {
    let (mut sender, mut receiver) = socket.split();
    let connection_id = ConnectionId::new();

    let room_rx = state.room_manager.join(&session_id, connection_id).await;

    let connected = match state.connect.handle(session_id).await {
        Ok(connected) => connected,
        Err(e) => {
            tracing::error!(session_id = %session_id, error = %e, "failed to open session");
            let _ = send_event(
                &mut sender,
                &SessionEvent::Error {
                    message: e.to_string(),
                },
            )
            .await;
            state.room_manager.leave(&session_id, &connection_id).await;
            return;
        }
    };

    let greeting = [
        SessionEvent::History(connected.history),
        SessionEvent::ExtractionData(connected.analysis),
    ];
    for event in &greeting {
        if send_event(&mut sender, event).await.is_err() {
            // Client disconnected immediately
            state.room_manager.leave(&session_id, &connection_id).await;
            return;
        }
    }

    if let Some(welcome) = connected.welcome {
        state
            .room_manager
            .notify(
                &session_id,
                SessionEvent::Message {
                    role: TurnRole::Assistant,
                    content: welcome.content,
                },
            )
            .await;
    }

    tracing::info!(session_id = %session_id, connection_id = %connection_id, "client connected");

    // Direct replies to this connection only (e.g. malformed frames)
    let (direct_tx, direct_rx) = mpsc::channel::<SessionEvent>(16);

    let mut send_task = tokio::spawn(forward_events(sender, room_rx, direct_rx, connection_id));

    let turns = state.turns.clone();
    let room_manager = state.room_manager.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => match ClientFrame::parse(&text) {
                    Some(frame) if !frame.message.trim().is_empty() => {
                        run_turn(&turns, &room_manager, session_id, frame.message);
                    }
                    _ => {
                        let _ = direct_tx
                            .send(SessionEvent::Error {
                                message: "expected {\"message\": \"...\"} with non-empty text"
                                    .to_string(),
                            })
                            .await;
                    }
                },
                Ok(Message::Binary(_)) => {
                    tracing::warn!(connection_id = %connection_id, "unsupported binary frame");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Ok(Message::Close(_)) => {
                    tracing::debug!(connection_id = %connection_id, "client sent close frame");
                    break;
                }
                Err(e) => {
                    tracing::debug!(connection_id = %connection_id, error = %e, "receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.room_manager.leave(&session_id, &connection_id).await;
    tracing::info!(session_id = %session_id, connection_id = %connection_id, "client disconnected");
}

/// Starts a streaming turn and relays its events to the room.
///
/// The turn runs on its own task, so it completes even if every client
/// disconnects midway.
fn run_turn(
    turns: &HandleTurnHandler,
    room_manager: &Arc<RoomManager>,
    session_id: SessionId,
    message: String,
) {
    let (mut events, task) = turns.handle_streaming(HandleTurnCommand::new(session_id, message));
    let room_manager = room_manager.clone();

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            room_manager.notify(&session_id, event).await;
        }

        let failure = match task.await {
            Ok(Ok(_)) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(e) => Some(format!("turn processing aborted: {}", e)),
        };
        if let Some(message) = failure {
            tracing::error!(session_id = %session_id, error = %message, "turn failed");
            room_manager
                .notify(&session_id, SessionEvent::Error { message })
                .await;
        }
    });
}

/// Writes room broadcasts and direct events to the socket until it closes.
async fn forward_events(
    mut sender: SplitSink<WebSocket, Message>,
    mut room_rx: broadcast::Receiver<SessionEvent>,
    mut direct_rx: mpsc::Receiver<SessionEvent>,
    connection_id: ConnectionId,
) {
    loop {
        let event = tokio::select! {
            received = room_rx.recv() => match received {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(connection_id = %connection_id, skipped, "connection lagging, events dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            Some(event) = direct_rx.recv() => event,
        };

        if let Err(e) = send_event(&mut sender, &event).await {
            tracing::debug!(connection_id = %connection_id, error = %e, "send error, closing connection");
            break;
        }
    }
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &SessionEvent,
) -> Result<(), axum::Error> {
    let json = encode(event).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}

/// Create axum router for the WebSocket endpoint.
pub fn websocket_router() -> Router<WebSocketState> {
    Router::new().route("/ws/:session_id", get(ws_handler))
}
