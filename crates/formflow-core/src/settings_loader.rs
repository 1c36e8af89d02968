//! Settings loading from configuration files.
//!
//! This module provides functions to load [`EngineSettings`] from TOML files,
//! JSON files, and to apply environment variable overrides.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `FORMFLOW_AUTOSAVE` | `autosave` |
//! | `FORMFLOW_AUTOSAVE_DEBOUNCE_MS` | `autosave_debounce_ms` |
//! | `FORMFLOW_AUTOSAVE_RESET_MS` | `autosave_reset_ms` |
//! | `FORMFLOW_ASYNC_CHECK_DELAY_MS` | `async_check_delay_ms` |
//! | `FORMFLOW_RESERVED_VALUES` | `reserved_values` (comma-separated) |
//! | `FORMFLOW_VALIDATE_REPEATER_ITEMS` | `validate_repeater_items` |
//! | `FORMFLOW_LOG_LEVEL` | `log_level` |
//! | `FORMFLOW_DEBUG` | `debug` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use formflow_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file("config/formflow.toml").unwrap();
//! let settings = settings_loader::from_json_file_with_env("config/formflow.json").unwrap();
//! ```

use std::path::Path;

use crate::error::FormError;
use crate::settings::EngineSettings;

/// Loads settings from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<EngineSettings, FormError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| FormError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;
    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<EngineSettings, FormError> {
    from_toml_str(&read_config(path.as_ref(), "TOML")?)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<EngineSettings, FormError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> Result<EngineSettings, FormError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| FormError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;
    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<EngineSettings, FormError> {
    from_json_str(&read_config(path.as_ref(), "JSON")?)
}

/// Loads settings from a JSON file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> Result<EngineSettings, FormError> {
    let mut settings = from_json_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> EngineSettings {
    let mut settings = EngineSettings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `FORMFLOW_*` environment variable overrides to a settings struct.
///
/// Unparseable numeric values are ignored and the current value is kept.
pub fn apply_env_overrides(settings: &mut EngineSettings) {
    if let Ok(val) = std::env::var("FORMFLOW_AUTOSAVE") {
        settings.autosave = parse_flag(&val);
    }

    if let Some(ms) = env_u64("FORMFLOW_AUTOSAVE_DEBOUNCE_MS") {
        settings.autosave_debounce_ms = ms;
    }

    if let Some(ms) = env_u64("FORMFLOW_AUTOSAVE_RESET_MS") {
        settings.autosave_reset_ms = ms;
    }

    if let Some(ms) = env_u64("FORMFLOW_ASYNC_CHECK_DELAY_MS") {
        settings.async_check_delay_ms = ms;
    }

    if let Ok(val) = std::env::var("FORMFLOW_RESERVED_VALUES") {
        settings.reserved_values = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Ok(val) = std::env::var("FORMFLOW_VALIDATE_REPEATER_ITEMS") {
        settings.validate_repeater_items = parse_flag(&val);
    }

    if let Ok(val) = std::env::var("FORMFLOW_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("FORMFLOW_DEBUG") {
        settings.debug = parse_flag(&val);
    }
}

// ============================================================
// Helpers
// ============================================================

fn parse_flag(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn read_config(path: &Path, format: &str) -> Result<String, FormError> {
    std::fs::read_to_string(path).map_err(|e| {
        FormError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

/// Deserializes `overrides` on top of the serialized default settings.
fn merge_over_defaults(
    overrides: serde_json::Value,
    format: &str,
) -> Result<EngineSettings, FormError> {
    let default_json = serde_json::to_value(EngineSettings::default()).map_err(|e| {
        FormError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, overrides);
    serde_json::from_value(merged).map_err(|e| {
        FormError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
