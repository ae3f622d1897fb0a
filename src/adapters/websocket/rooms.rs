//! WebSocket room management for session-based event routing.
//!
//! Rooms are organized by session ID, so every connection watching a
//! session receives the same turn events.
//!
//! ```text
//! Room: session-123    Room: session-456
//! ├── conn-a           ├── conn-d
//! ├── conn-b           └── conn-e
//! └── conn-c
//! ```
//!
//! When an event occurs for session-123, only connections a, b, c get it.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::{broadcast, RwLock};

use crate::domain::foundation::{ConnectionId, SessionId};
use crate::ports::{SessionEvent, SessionNotifier};

struct Room {
    sender: broadcast::Sender<SessionEvent>,
    members: HashSet<ConnectionId>,
}

/// Manages WebSocket connection rooms organized by session.
///
/// Rooms are created on first join and removed when the last member
/// leaves. The manager is shared as `Arc` state; nothing about it is
/// process global.
pub struct RoomManager {
    rooms: RwLock<HashMap<SessionId, Room>>,
    /// Capacity of each room's broadcast channel.
    channel_capacity: usize,
}

impl RoomManager {
    /// Create a new room manager with specified channel capacity.
    ///
    /// Slow receivers that fall more than `channel_capacity` events behind
    /// miss the oldest ones.
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            channel_capacity,
        }
    }

    /// Create with default capacity (256 events).
    pub fn with_default_capacity() -> Self {
        Self::new(256)
    }

    /// Join a connection to a session room, creating the room if needed.
    pub async fn join(
        &self,
        session_id: &SessionId,
        connection_id: ConnectionId,
    ) -> broadcast::Receiver<SessionEvent> {
        let mut rooms = self.rooms.write().await;

        let room = rooms.entry(*session_id).or_insert_with(|| Room {
            sender: broadcast::channel(self.channel_capacity).0,
            members: HashSet::new(),
        });
        room.members.insert(connection_id);

        tracing::debug!(
            session_id = %session_id,
            connection_id = %connection_id,
            members = room.members.len(),
            "joined room"
        );
        room.sender.subscribe()
    }

    /// Remove a connection from a session room; empty rooms are dropped.
    pub async fn leave(&self, session_id: &SessionId, connection_id: &ConnectionId) {
        let mut rooms = self.rooms.write().await;

        if let Some(room) = rooms.get_mut(session_id) {
            room.members.remove(connection_id);
            if room.members.is_empty() {
                rooms.remove(session_id);
            }
        }

        tracing::debug!(
            session_id = %session_id,
            connection_id = %connection_id,
            "left room"
        );
    }

    /// Broadcast an event to all connections in a session room.
    ///
    /// A room without members is a no-op.
    pub async fn broadcast_to_session(&self, session_id: &SessionId, event: SessionEvent) {
        let rooms = self.rooms.read().await;

        if let Some(room) = rooms.get(session_id) {
            // No receivers is fine
            let _ = room.sender.send(event);
        }
    }

    /// Number of connections in a session room.
    pub async fn connection_count(&self, session_id: &SessionId) -> usize {
        self.rooms
            .read()
            .await
            .get(session_id)
            .map(|room| room.members.len())
            .unwrap_or(0)
    }

    /// All sessions with at least one connection.
    pub async fn active_rooms(&self) -> Vec<SessionId> {
        self.rooms.read().await.keys().copied().collect()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[async_trait]
impl SessionNotifier for RoomManager {
    async fn notify(&self, session_id: &SessionId, event: SessionEvent) {
        self.broadcast_to_session(session_id, event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn typing() -> SessionEvent {
        SessionEvent::Typing { active: true }
    }

    #[tokio::test]
    async fn join_creates_room_if_not_exists() {
        let manager = RoomManager::with_default_capacity();

        let _rx = manager.join(&SessionId::new(), ConnectionId::new()).await;

        assert_eq!(manager.active_rooms().await.len(), 1);
    }

    #[tokio::test]
    async fn all_members_receive_broadcast() {
        let manager = Arc::new(RoomManager::with_default_capacity());
        let session_id = SessionId::new();

        let mut rx1 = manager.join(&session_id, ConnectionId::new()).await;
        let mut rx2 = manager.join(&session_id, ConnectionId::new()).await;

        manager.broadcast_to_session(&session_id, typing()).await;

        assert_eq!(rx1.recv().await.unwrap(), typing());
        assert_eq!(rx2.recv().await.unwrap(), typing());
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let manager = RoomManager::with_default_capacity();
        let session_1 = SessionId::new();
        let session_2 = SessionId::new();

        let mut rx1 = manager.join(&session_1, ConnectionId::new()).await;
        let mut rx2 = manager.join(&session_2, ConnectionId::new()).await;

        manager.broadcast_to_session(&session_1, typing()).await;

        assert!(rx1.recv().await.is_ok());
        assert!(matches!(
            rx2.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn last_leave_removes_room() {
        let manager = RoomManager::with_default_capacity();
        let session_id = SessionId::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let _rx_a = manager.join(&session_id, a).await;
        let _rx_b = manager.join(&session_id, b).await;

        manager.leave(&session_id, &a).await;
        assert_eq!(manager.connection_count(&session_id).await, 1);

        manager.leave(&session_id, &b).await;
        assert!(manager.active_rooms().await.is_empty());
    }

    #[tokio::test]
    async fn broadcast_to_nonexistent_room_is_noop() {
        let manager = RoomManager::with_default_capacity();
        manager.broadcast_to_session(&SessionId::new(), typing()).await;
    }

    #[tokio::test]
    async fn notifier_port_routes_to_room() {
        let manager = Arc::new(RoomManager::with_default_capacity());
        let session_id = SessionId::new();
        let mut rx = manager.join(&session_id, ConnectionId::new()).await;
        let notifier: Arc<dyn SessionNotifier> = manager.clone();

        notifier.notify(&session_id, typing()).await;

        assert_eq!(rx.recv().await.unwrap(), typing());
    }
}
