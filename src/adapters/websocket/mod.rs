//! WebSocket adapters for live conversations.
//!
//! ```text
//! client ──{"message"}──▶ handler ──▶ HandleTurnHandler (spawned turn)
//!                                            │ SessionEvent
//!                                            ▼
//!                                       RoomManager
//!                         Room: session-123    Room: session-456
//!                         ├── conn-a           └── conn-d
//!                         └── conn-b
//! ```
//!
//! - [`messages`] - wire format
//! - [`rooms`] - per-session fan-out, also the `SessionNotifier` adapter
//! - [`handler`] - axum upgrade handler and connection loop

pub mod handler;
pub mod messages;
pub mod rooms;

pub use handler::{websocket_router, ws_handler, WebSocketState};
pub use messages::ClientFrame;
pub use rooms::RoomManager;
