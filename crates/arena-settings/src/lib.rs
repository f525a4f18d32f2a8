//! # arena-settings
//!
//! Layered configuration for the arena event core.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`ArenaSettings::default()`]
//! 2. **User file**: `~/.arena/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `ARENA_*` overrides (highest priority)
//!
//! There is no global cache: the embedding binary loads settings once and
//! hands them to the `GameManager` it constructs.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
