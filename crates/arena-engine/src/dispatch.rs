//! Delivery paths spawned by `fire_event`.
//!
//! Each path runs as its own task. A handler panic aborts only the internal
//! task it happened in; a full client queue fails only that client's send.

use std::sync::Arc;

use arena_core::{ConnectionDirectory, DispatchError, Event};
use arena_server::metrics::ROUTING_DROPS_TOTAL;
use metrics::counter;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, warn};

use crate::registry::EventHandler;

/// How one delivery path ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathOutcome {
    /// Delivered to this many handlers (internal) or clients (external).
    Delivered(usize),
    /// Dropped by routing. Already logged.
    Dropped(DispatchError),
    /// The task panicked or was cancelled.
    Aborted,
}

impl PathOutcome {
    /// Recipient count when delivered.
    pub fn delivered(&self) -> Option<usize> {
        match self {
            Self::Delivered(n) => Some(*n),
            _ => None,
        }
    }
}

/// Final state of both paths of one `fire_event` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Internal path outcome, `None` when the definition is not internal.
    pub internal: Option<PathOutcome>,
    /// External path outcome, `None` when the definition is not websocket.
    pub external: Option<PathOutcome>,
}

/// Handles to the paths scheduled by one `fire_event` call.
///
/// Dropping it detaches the tasks; they still run to completion.
#[derive(Debug, Default)]
pub struct Dispatch {
    internal: Option<JoinHandle<Result<usize, DispatchError>>>,
    external: Option<JoinHandle<Result<usize, DispatchError>>>,
}

impl Dispatch {
    pub(crate) fn new(
        internal: Option<JoinHandle<Result<usize, DispatchError>>>,
        external: Option<JoinHandle<Result<usize, DispatchError>>>,
    ) -> Self {
        Self { internal, external }
    }

    /// Whether an internal path was scheduled.
    pub fn has_internal(&self) -> bool {
        self.internal.is_some()
    }

    /// Whether an external path was scheduled.
    pub fn has_external(&self) -> bool {
        self.external.is_some()
    }

    /// Wait for every scheduled path to finish.
    pub async fn join(self) -> DispatchReport {
        let internal = match self.internal {
            Some(handle) => Some(outcome(handle.await)),
            None => None,
        };
        let external = match self.external {
            Some(handle) => Some(outcome(handle.await)),
            None => None,
        };
        DispatchReport { internal, external }
    }
}

fn outcome(joined: Result<Result<usize, DispatchError>, JoinError>) -> PathOutcome {
    match joined {
        Ok(Ok(n)) => PathOutcome::Delivered(n),
        Ok(Err(e)) => PathOutcome::Dropped(e),
        Err(_) => PathOutcome::Aborted,
    }
}

fn dropped(err: DispatchError) -> DispatchError {
    counter!(ROUTING_DROPS_TOTAL, "reason" => err.reason()).increment(1);
    err
}

/// Invoke every handler in order with the same event.
pub(crate) fn deliver_internal(
    event: &Event,
    handlers: Option<Vec<EventHandler>>,
) -> Result<usize, DispatchError> {
    let Some(handlers) = handlers else {
        warn!(event = %event.name, "event called with no active subscribers");
        return Err(dropped(DispatchError::NoSubscribers(event.name.clone())));
    };
    for h in &handlers {
        h(event);
    }
    debug!(event = %event.name, handlers = handlers.len(), "internal dispatch complete");
    Ok(handlers.len())
}

/// Send to every client, or to the one named by `event.client_id`.
pub(crate) async fn deliver_external(
    directory: Arc<dyn ConnectionDirectory>,
    event: Event,
    broadcast: bool,
) -> Result<usize, DispatchError> {
    if broadcast {
        return Ok(directory.broadcast(&event).await);
    }

    let Some(client_id) = event.target() else {
        error!(event = %event.name, "direct event sent with no client id");
        return Err(dropped(DispatchError::MissingClientId(event.name.clone())));
    };

    let Some(client) = directory.find(client_id).await else {
        error!(event = %event.name, client_id, "direct event sent with unknown client");
        return Err(dropped(DispatchError::UnknownClient(client_id.to_string())));
    };

    if let Err(failure) = client.try_send(Arc::new(event.clone())) {
        warn!(event = %event.name, client_id, ?failure, drops = client.drop_count(), "failed to send direct event");
        return Err(dropped(DispatchError::ClientBackpressure(client.id.clone())));
    }
    debug!(event = %event.name, client_id, "direct event enqueued");
    Ok(1)
}
