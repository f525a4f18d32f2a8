//! Layered settings loading for the arena server.
//!
//! Defaults are serialized to JSON, the user's file is merged over them key by
//! key, and `ARENA_*` variables are applied last. A partial file such as
//! `{"server": {"outboundCapacity": 64}}` only touches the keys it names.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::ArenaSettings;

/// Log filter override.
pub const ENV_LOG_LEVEL: &str = "ARENA_LOG_LEVEL";
/// Outbound queue capacity override.
pub const ENV_OUTBOUND_CAPACITY: &str = "ARENA_OUTBOUND_CAPACITY";
/// Slow-client eviction threshold override.
pub const ENV_MAX_DROPPED_MESSAGES: &str = "ARENA_MAX_DROPPED_MESSAGES";

/// Resolve the path to the settings file (`~/.arena/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".arena").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ArenaSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON or a non-object root, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<ArenaSettings> {
    let mut settings = read_settings_file(path)?;
    apply_env_overrides(&mut settings);
    settings.validate();
    Ok(settings)
}

/// Deep-merge the file at `path` over compiled defaults, without env overrides.
pub fn read_settings_file(path: &Path) -> Result<ArenaSettings> {
    let defaults = serde_json::to_value(ArenaSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        if !user.is_object() {
            return Err(SettingsError::InvalidValue(
                "settings root must be a JSON object".to_string(),
            ));
        }
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Overlay `source` onto `target`.
///
/// Nested objects merge per key; any other `source` value wins outright,
/// except `null`, which leaves the default in place.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `ARENA_*` environment variable overrides.
pub fn apply_env_overrides(settings: &mut ArenaSettings) {
    apply_overrides(settings, |key| std::env::var(key).ok());
}

/// Apply overrides read through `lookup`.
///
/// Invalid values are ignored with a warning (falling back to file/default).
pub fn apply_overrides(settings: &mut ArenaSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup(ENV_LOG_LEVEL).filter(|v| !v.is_empty()) {
        settings.logging.level = v;
    }
    if let Some(v) = read_bounded(&lookup, ENV_OUTBOUND_CAPACITY, 1_usize, 65_536) {
        settings.server.outbound_capacity = v;
    }
    if let Some(v) = read_bounded(&lookup, ENV_MAX_DROPPED_MESSAGES, 1_u64, 1_000_000) {
        settings.server.max_dropped_messages = v;
    }
}

/// Parse `val` and accept it only inside `min..=max`.
pub fn parse_in_range<T>(val: &str, min: T, max: T) -> Option<T>
where
    T: FromStr + PartialOrd,
{
    let n: T = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

fn read_bounded<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    min: T,
    max: T,
) -> Option<T>
where
    T: FromStr + PartialOrd + Display + Copy,
{
    let val = lookup(name)?;
    let parsed = parse_in_range(&val, min, max);
    if parsed.is_none() {
        warn!(key = name, value = %val, %min, %max, "ignoring out-of-range arena override");
    }
    parsed
}
