//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` for the JSON file
//! format and implement [`Default`] with production values. Every section is
//! `#[serde(default)]`, so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// ```json
/// {
///   "server": { "outboundCapacity": 512 },
///   "logging": { "level": "info" }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArenaSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// Connection and outbound queue settings.
    pub server: ServerSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "arena".to_string(),
            server: ServerSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl ArenaSettings {
    /// Correct values that would break runtime invariants.
    ///
    /// Called automatically during loading. Invalid values are corrected with
    /// a warning rather than rejected.
    pub fn validate(&mut self) {
        if self.server.outbound_capacity == 0 {
            tracing::warn!("outbound_capacity must be at least 1, correcting");
            self.server.outbound_capacity = 1;
        }
        if self.server.max_dropped_messages == 0 {
            tracing::warn!("max_dropped_messages must be at least 1, correcting");
            self.server.max_dropped_messages = 1;
        }
    }
}

/// Connection directory and client queue settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Slots in each client's outbound queue.
    pub outbound_capacity: usize,
    /// Lifetime dropped messages after which a slow client is evicted.
    pub max_dropped_messages: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            outbound_capacity: 256,
            max_dropped_messages: 100,
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
        }
    }
}
