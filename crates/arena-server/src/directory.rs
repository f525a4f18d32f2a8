//! Live client directory and event fan-out.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use arena_core::{ClientConnection, ConnectionDirectory, Event};
use async_trait::async_trait;
use metrics::{counter, gauge};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::metrics::{
    WS_BROADCAST_DROPS_TOTAL, WS_CONNECTIONS_ACTIVE, WS_SLOW_CLIENT_EVICTIONS_TOTAL,
};

/// Lifetime dropped messages before a slow client is evicted.
pub const DEFAULT_MAX_DROPPED_MESSAGES: u64 = 100;

/// Tracks live clients and fans events out to them.
pub struct Server {
    /// Connected clients indexed by client id.
    connections: RwLock<HashMap<String, Arc<ClientConnection>>>,
    /// Live count, readable without the lock.
    active_count: AtomicUsize,
    /// Eviction threshold for slow clients.
    max_dropped_messages: u64,
}

impl Server {
    /// Create an empty directory with the default eviction threshold.
    pub fn new() -> Self {
        Self::with_max_dropped_messages(DEFAULT_MAX_DROPPED_MESSAGES)
    }

    /// Create an empty directory that evicts clients after `max_dropped_messages` drops.
    pub fn with_max_dropped_messages(max_dropped_messages: u64) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            active_count: AtomicUsize::new(0),
            max_dropped_messages: max_dropped_messages.max(1),
        }
    }

    /// Remove `victims` still registered under their id.
    ///
    /// An id that has since been re-registered by a newer connection is left
    /// alone.
    async fn evict(&self, victims: &[Arc<ClientConnection>]) {
        let mut conns = self.connections.write().await;
        for victim in victims {
            let current = conns.get(&victim.id).is_some_and(|c| Arc::ptr_eq(c, victim));
            if !current {
                debug!(client_id = %victim.id, "skipping eviction, id reconnected");
                continue;
            }
            let _ = conns.remove(&victim.id);
            let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
            counter!(WS_SLOW_CLIENT_EVICTIONS_TOTAL).increment(1);
        }
        self.publish_count();
    }

    fn publish_count(&self) {
        #[allow(clippy::cast_precision_loss)]
        gauge!(WS_CONNECTIONS_ACTIVE).set(self.active_count.load(Ordering::Relaxed) as f64);
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionDirectory for Server {
    async fn register(&self, client: Arc<ClientConnection>) {
        let id = client.id.clone();
        let replaced = {
            let mut conns = self.connections.write().await;
            let replaced = conns.insert(id.clone(), client).is_some();
            if !replaced {
                let _ = self.active_count.fetch_add(1, Ordering::Relaxed);
            }
            self.publish_count();
            replaced
        };
        info!(client_id = %id, replaced, "client registered");
    }

    async fn unregister(&self, client_id: &str) {
        let mut conns = self.connections.write().await;
        if conns.remove(client_id).is_some() {
            let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
            self.publish_count();
            drop(conns);
            info!(client_id, "client unregistered");
        }
    }

    async fn find(&self, client_id: &str) -> Option<Arc<ClientConnection>> {
        self.connections.read().await.get(client_id).cloned()
    }

    async fn broadcast(&self, event: &Event) -> usize {
        let shared = Arc::new(event.clone());
        let mut to_remove = Vec::new();
        let mut delivered = 0usize;
        {
            let conns = self.connections.read().await;
            for conn in conns.values() {
                if conn.send(Arc::clone(&shared)) {
                    delivered += 1;
                    continue;
                }
                counter!(WS_BROADCAST_DROPS_TOTAL).increment(1);
                let drops = conn.drop_count();
                if drops >= self.max_dropped_messages || conn.is_closed() {
                    warn!(client_id = %conn.id, event = %event.name, drops, "evicting slow client");
                    to_remove.push(Arc::clone(conn));
                } else {
                    warn!(client_id = %conn.id, event = %event.name, total_drops = drops, "failed to send event to client (queue full)");
                }
            }
            debug!(event = %event.name, recipients = conns.len(), delivered, "broadcast event");
        }
        if !to_remove.is_empty() {
            self.evict(&to_remove).await;
        }
        delivered
    }

    fn connection_count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn client(id: &str) -> (Arc<ClientConnection>, mpsc::Receiver<Arc<Event>>) {
        let (conn, rx) = ClientConnection::with_capacity(id, 32);
        (Arc::new(conn), rx)
    }

    fn chat(text: &str) -> Event {
        Event::new("chat", json!(text))
    }

    #[tokio::test]
    async fn register_client() {
        let server = Server::new();
        let (c1, _rx) = client("c1");
        server.register(c1).await;
        assert_eq!(server.connection_count(), 1);
        assert!(server.find("c1").await.is_some());
    }

    #[tokio::test]
    async fn unregister_client() {
        let server = Server::new();
        let (c1, _rx) = client("c1");
        server.register(c1).await;
        server.unregister("c1").await;
        assert_eq!(server.connection_count(), 0);
        assert!(server.find("c1").await.is_none());
    }

    #[tokio::test]
    async fn unregister_unknown_is_noop() {
        let server = Server::new();
        server.unregister("ghost").await;
        assert_eq!(server.connection_count(), 0);
    }

    #[tokio::test]
    async fn register_same_id_replaces() {
        let server = Server::new();
        let (first, mut first_rx) = client("same");
        let (second, mut second_rx) = client("same");
        server.register(first).await;
        server.register(second).await;
        assert_eq!(server.connection_count(), 1);

        assert_eq!(server.broadcast(&chat("hi")).await, 1);
        assert!(first_rx.try_recv().is_err());
        assert!(second_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn broadcast_reaches_every_client_once() {
        let server = Server::new();
        let (a, mut rx_a) = client("A");
        let (b, mut rx_b) = client("B");
        server.register(a).await;
        server.register(b).await;

        assert_eq!(server.broadcast(&chat("hi")).await, 2);

        assert_eq!(rx_a.try_recv().unwrap().payload, json!("hi"));
        assert_eq!(rx_b.try_recv().unwrap().payload, json!("hi"));
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_shares_one_allocation() {
        let server = Server::new();
        let (a, mut rx_a) = client("A");
        let (b, mut rx_b) = client("B");
        server.register(a).await;
        server.register(b).await;

        let _ = server.broadcast(&chat("shared")).await;
        let m1 = rx_a.recv().await.unwrap();
        let m2 = rx_b.recv().await.unwrap();
        assert!(Arc::ptr_eq(&m1, &m2));
    }

    #[tokio::test]
    async fn broadcast_to_empty_directory() {
        let server = Server::new();
        assert_eq!(server.broadcast(&chat("nobody")).await, 0);
    }

    #[tokio::test]
    async fn full_client_does_not_block_others() {
        let server = Server::new();
        let (slow, _slow_rx) = ClientConnection::with_capacity("slow", 1);
        let (fast, mut fast_rx) = client("fast");
        server.register(Arc::new(slow)).await;
        server.register(fast).await;

        assert_eq!(server.broadcast(&chat("one")).await, 2);
        assert_eq!(server.broadcast(&chat("two")).await, 1);

        assert_eq!(fast_rx.try_recv().unwrap().payload, json!("one"));
        assert_eq!(fast_rx.try_recv().unwrap().payload, json!("two"));
        assert_eq!(server.connection_count(), 2);
    }

    #[tokio::test]
    async fn slow_client_evicted_after_threshold() {
        let server = Server::with_max_dropped_messages(3);
        let (slow, _slow_rx) = ClientConnection::with_capacity("slow", 1);
        let (fast, mut fast_rx) = client("fast");
        server.register(Arc::new(slow)).await;
        server.register(fast).await;

        // First fills the queue, next three are dropped
        for _ in 0..4 {
            let _ = server.broadcast(&chat("x")).await;
        }

        assert_eq!(server.connection_count(), 1);
        assert!(server.find("slow").await.is_none());
        assert!(fast_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn closed_client_evicted_immediately() {
        let server = Server::new();
        let (gone, rx) = client("gone");
        drop(rx);
        server.register(gone).await;

        assert_eq!(server.broadcast(&chat("x")).await, 0);
        assert_eq!(server.connection_count(), 0);
    }

    #[tokio::test]
    async fn eviction_spares_reconnected_id() {
        let server = Server::new();
        let (stale, stale_rx) = client("X");
        drop(stale_rx);
        server.register(Arc::clone(&stale)).await;

        let (fresh, mut fresh_rx) = client("X");
        server.register(Arc::clone(&fresh)).await;
        server.evict(&[stale]).await;

        let found = server.find("X").await.unwrap();
        assert!(Arc::ptr_eq(&found, &fresh));
        assert_eq!(server.connection_count(), 1);
        assert_eq!(server.broadcast(&chat("still here")).await, 1);
        assert_eq!(fresh_rx.try_recv().unwrap().payload, json!("still here"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn reconnect_during_broadcast_survives() {
        let server = Arc::new(Server::new());
        let mut keep = Vec::new();
        for i in 0..2_000 {
            let (conn, rx) = client(&format!("c{i}"));
            server.register(conn).await;
            keep.push(rx);
        }

        for round in 0..20 {
            let (stale, stale_rx) = client("X");
            drop(stale_rx);
            server.register(stale).await;

            let fan_out = {
                let server = Arc::clone(&server);
                tokio::spawn(async move { server.broadcast(&chat("tick")).await })
            };
            let (fresh, mut fresh_rx) = client("X");
            server.register(Arc::clone(&fresh)).await;
            let _ = fan_out.await.unwrap();

            let found = server.find("X").await;
            assert!(
                found.is_some_and(|c| Arc::ptr_eq(&c, &fresh)),
                "round {round}: reconnected client was evicted"
            );
            while fresh_rx.try_recv().is_ok() {}
            for rx in &mut keep {
                while rx.try_recv().is_ok() {}
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn count_stays_in_range_under_churn() {
        let server = Arc::new(Server::new());
        let done = Arc::new(std::sync::atomic::AtomicBool::new(false));

        let sampler = {
            let server = Arc::clone(&server);
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                let mut max_seen = 0;
                while !done.load(Ordering::Relaxed) {
                    max_seen = max_seen.max(server.connection_count());
                }
                max_seen
            })
        };

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let server = Arc::clone(&server);
            tasks.push(tokio::spawn(async move {
                for _ in 0..2_000 {
                    let (conn, _rx) = client("A");
                    server.register(conn).await;
                    server.unregister("A").await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        done.store(true, Ordering::Relaxed);

        assert!(sampler.join().unwrap() <= 1);
        assert_eq!(server.connection_count(), 0);
        assert!(server.find("A").await.is_none());
    }
}
