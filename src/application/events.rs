//! Outgoing event channel for a streaming turn.

use tokio::sync::mpsc;

use crate::ports::SessionEvent;

/// Default buffer for a turn's event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Sender side of a turn's event stream.
///
/// A disabled sink swallows events, which is how buffered turns run the same
/// code path without streaming. Once the receiver is gone, events are
/// dropped and the turn carries on.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Option<mpsc::Sender<SessionEvent>>,
}

impl EventSink {
    /// Creates a sink and its receiver.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that discards everything.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Whether events are forwarded anywhere.
    pub fn is_streaming(&self) -> bool {
        self.tx.is_some()
    }

    /// Sends an event. Returns false if it was not delivered.
    pub async fn emit(&self, event: SessionEvent) -> bool {
        match &self.tx {
            Some(tx) => match tx.send(event).await {
                Ok(()) => true,
                Err(_) => {
                    tracing::debug!("event receiver dropped, discarding event");
                    false
                }
            },
            None => false,
        }
    }
}
