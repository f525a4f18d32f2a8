//! Event instances and their routing definitions.
//!
//! - **[`EventDefinition`]**: the delivery policy registered once per event
//!   name (internal subscribers, network clients, broadcast vs. direct).
//! - **[`Event`]**: a fired occurrence carrying a name, an optional target
//!   client, and an arbitrary JSON payload.
//!
//! `Event` is also the wire shape: the writer loop serializes it as one JSON
//! text frame per delivery.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─────────────────────────────────────────────────────────────────────────────
// EventDefinition
// ─────────────────────────────────────────────────────────────────────────────

/// Delivery policy for every event fired under `name`.
///
/// Definitions are registered at startup and read-only afterwards. An event
/// whose name has no definition is dropped at dispatch time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDefinition {
    /// Exact event name this definition applies to.
    pub name: String,
    /// Deliver to in-process subscribers.
    pub internal: bool,
    /// Deliver to connected clients.
    pub websocket: bool,
    /// When `websocket` is set: send to every client rather than `client_id` only.
    pub broadcast: bool,
}

impl EventDefinition {
    /// A definition with every delivery flag cleared.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            internal: false,
            websocket: false,
            broadcast: false,
        }
    }

    /// Internal-only event.
    pub fn internal(name: impl Into<String>) -> Self {
        Self::new(name).with_internal(true)
    }

    /// Network event sent to the single client named by `Event::client_id`.
    pub fn direct(name: impl Into<String>) -> Self {
        Self::new(name).with_websocket(true)
    }

    /// Network event sent to every connected client.
    pub fn broadcast(name: impl Into<String>) -> Self {
        Self::new(name).with_websocket(true).with_broadcast(true)
    }

    /// Set the `internal` flag.
    #[must_use]
    pub fn with_internal(mut self, internal: bool) -> Self {
        self.internal = internal;
        self
    }

    /// Set the `websocket` flag.
    #[must_use]
    pub fn with_websocket(mut self, websocket: bool) -> Self {
        self.websocket = websocket;
        self
    }

    /// Set the `broadcast` flag.
    #[must_use]
    pub fn with_broadcast(mut self, broadcast: bool) -> Self {
        self.broadcast = broadcast;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Event
// ─────────────────────────────────────────────────────────────────────────────

/// A fired event.
///
/// Carries no identity beyond its name and optional target; many instances of
/// the same name may be in flight at once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event name, matched exactly against registered definitions.
    pub name: String,
    /// Target client for direct network delivery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Arbitrary payload.
    #[serde(default)]
    pub payload: Value,
}

impl Event {
    /// Create an untargeted event.
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            client_id: None,
            payload,
        }
    }

    /// Create an event targeted at a single client.
    pub fn to_client(name: impl Into<String>, client_id: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            client_id: Some(client_id.into()),
            payload,
        }
    }

    /// The target client id, treating an empty string as absent.
    pub fn target(&self) -> Option<&str> {
        self.client_id.as_deref().filter(|id| !id.is_empty())
    }
}
