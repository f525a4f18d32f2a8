//! Connected client state and its outbound queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::events::Event;

/// Why an enqueue to a client's outbound queue did not happen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendFailure {
    /// The queue is at capacity.
    Full,
    /// The writer side has gone away.
    Closed,
}

/// A live client connection.
///
/// The outbound queue is bounded. Enqueueing never waits: a full or closed
/// queue drops the message and bumps the drop counter.
pub struct ClientConnection {
    /// Caller-supplied unique client id.
    pub id: String,
    /// Send half of the queue drained by the connection's writer loop.
    tx: mpsc::Sender<Arc<Event>>,
    /// Count of messages dropped due to a full or closed queue.
    dropped_messages: AtomicU64,
}

impl ClientConnection {
    /// Create a connection around an existing sender.
    pub fn new(id: impl Into<String>, tx: mpsc::Sender<Arc<Event>>) -> Self {
        Self {
            id: id.into(),
            tx,
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Create a connection with a fresh queue of `capacity` slots.
    ///
    /// Returns the receiver for the writer loop. A zero capacity is raised to 1.
    pub fn with_capacity(
        id: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<Arc<Event>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(id, tx), rx)
    }

    /// Enqueue an event without waiting.
    pub fn try_send(&self, event: Arc<Event>) -> Result<(), SendFailure> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(err) => {
                let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
                match err {
                    TrySendError::Full(_) => Err(SendFailure::Full),
                    TrySendError::Closed(_) => Err(SendFailure::Closed),
                }
            }
        }
    }

    /// Enqueue an event, returning `false` if it was dropped.
    pub fn send(&self, event: Arc<Event>) -> bool {
        self.try_send(event).is_ok()
    }

    /// Total messages dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Whether the writer side has hung up.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl std::fmt::Debug for ClientConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConnection")
            .field("id", &self.id)
            .field("dropped_messages", &self.drop_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(text: &str) -> Arc<Event> {
        Arc::new(Event::new("chat", json!(text)))
    }

    #[test]
    fn create_connection() {
        let (conn, _rx) = ClientConnection::with_capacity("client_1", 8);
        assert_eq!(conn.id, "client_1");
        assert_eq!(conn.drop_count(), 0);
        assert!(!conn.is_closed());
    }

    #[tokio::test]
    async fn send_message_success() {
        let (conn, mut rx) = ClientConnection::with_capacity("c", 8);
        assert!(conn.send(event("hello")));
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.payload, json!("hello"));
    }

    #[test]
    fn send_to_full_queue_reports_full() {
        let (conn, _rx) = ClientConnection::with_capacity("c", 1);
        assert_eq!(conn.try_send(event("one")), Ok(()));
        assert_eq!(conn.try_send(event("two")), Err(SendFailure::Full));
        assert_eq!(conn.drop_count(), 1);
    }

    #[test]
    fn send_to_closed_queue_reports_closed() {
        let (conn, rx) = ClientConnection::with_capacity("c", 4);
        drop(rx);
        assert!(conn.is_closed());
        assert_eq!(conn.try_send(event("lost")), Err(SendFailure::Closed));
        assert!(!conn.send(event("lost again")));
        assert_eq!(conn.drop_count(), 2);
    }

    #[test]
    fn zero_capacity_is_raised() {
        let (conn, _rx) = ClientConnection::with_capacity("c", 0);
        assert!(conn.send(event("fits")));
    }
}
