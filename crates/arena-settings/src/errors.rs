//! Errors raised while loading `~/.arena/settings.json`.

use thiserror::Error;

/// Why the arena settings could not be loaded.
///
/// Bad environment overrides never surface here; they are logged and skipped.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("cannot read arena settings: {0}")]
    Io(#[from] std::io::Error),
    /// The settings file is not valid JSON, or does not fit [`crate::ArenaSettings`].
    #[error("malformed arena settings: {0}")]
    Json(#[from] serde_json::Error),
    /// The file parsed but its shape is unusable (non-object root).
    #[error("unusable arena settings: {0}")]
    InvalidValue(String),
}

/// Shorthand used throughout the settings loader.
pub type Result<T> = std::result::Result<T, SettingsError>;
