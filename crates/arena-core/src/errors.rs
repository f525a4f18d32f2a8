//! Error taxonomy for dispatch and component setup.
//!
//! Every dispatch error is terminal for one delivery attempt only. Nothing
//! here is retried and nothing aborts the process.

use thiserror::Error;

/// A delivery attempt that was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Event fired with no matching definition.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// Internal event fired with no registered subscribers.
    #[error("event has no active subscribers: {0}")]
    NoSubscribers(String),

    /// Direct network event fired without a target client id.
    #[error("direct event sent with no client id: {0}")]
    MissingClientId(String),

    /// Direct network event targeted at a client that is not connected.
    #[error("direct event sent to unknown client: {0}")]
    UnknownClient(String),

    /// The target client's outbound queue was full or closed.
    #[error("client outbound queue unavailable: {0}")]
    ClientBackpressure(String),

    /// `fire_event` was called outside a Tokio runtime.
    #[error("no async runtime available to schedule dispatch")]
    NoRuntime,
}

impl DispatchError {
    /// Short label used for metrics and structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::UnknownEvent(_) => "unknown_event",
            Self::NoSubscribers(_) => "no_subscribers",
            Self::MissingClientId(_) => "missing_client_id",
            Self::UnknownClient(_) => "unknown_client",
            Self::ClientBackpressure(_) => "client_backpressure",
            Self::NoRuntime => "no_runtime",
        }
    }
}

/// A component's one-time setup failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ComponentError {
    /// The manager back-reference was never set or the manager is gone.
    #[error("component has no live manager")]
    ManagerDropped,

    /// Component-specific setup failure.
    #[error("component {component} failed to register: {reason}")]
    Setup {
        /// Component name.
        component: String,
        /// Failure description.
        reason: String,
    },
}

impl ComponentError {
    /// Build a [`ComponentError::Setup`].
    pub fn setup(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Setup {
            component: component.into(),
            reason: reason.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
