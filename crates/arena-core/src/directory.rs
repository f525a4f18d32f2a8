//! Connection directory contract.
//!
//! The dispatch engine never touches sockets. It resolves clients and fans out
//! broadcasts through this trait, which the networking layer implements.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::ClientConnection;
use crate::events::Event;

/// Tracks live client connections.
///
/// Disconnect detection is the implementor's concern. Callers treat a missing
/// client the same whether it never connected or has since left.
#[async_trait]
pub trait ConnectionDirectory: Send + Sync {
    /// Admit a client, replacing any live client with the same id.
    async fn register(&self, client: Arc<ClientConnection>);

    /// Remove a client by id. Unknown ids are ignored.
    async fn unregister(&self, client_id: &str);

    /// Look up a live client by id.
    async fn find(&self, client_id: &str) -> Option<Arc<ClientConnection>>;

    /// Enqueue `event` onto every live client's outbound queue.
    ///
    /// Each client's enqueue is independent; a full queue must not delay the
    /// others. Returns the number of clients the event was enqueued to.
    async fn broadcast(&self, event: &Event) -> usize;

    /// Number of live clients.
    fn connection_count(&self) -> usize;
}
