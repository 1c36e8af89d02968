//! Engine settings.
//!
//! [`EngineSettings`] holds every tunable of a form engine instance: the
//! autosave policy and its two delays, the simulated remote-check latency,
//! repeater handling, and logging. Each engine owns its own copy; there is no
//! global settings singleton.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a single form engine instance.
///
/// Any field missing from a loaded TOML/JSON document keeps its default.
///
/// # Examples
///
/// ```
/// use formflow_core::settings::EngineSettings;
///
/// let settings = EngineSettings::default();
/// assert!(!settings.autosave);
/// assert_eq!(settings.autosave_debounce_ms, 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    // ── Autosave ─────────────────────────────────────────────────────

    /// Whether value changes schedule an autosave.
    pub autosave: bool,
    /// Quiet period after the last change before the save runs.
    pub autosave_debounce_ms: u64,
    /// How long the `saved` status is shown before returning to `idle`.
    pub autosave_reset_ms: u64,

    // ── Validation ───────────────────────────────────────────────────

    /// Simulated round-trip latency of an `async` rule.
    pub async_check_delay_ms: u64,
    /// Values the simulated remote check rejects (compared case-insensitively).
    pub reserved_values: Vec<String>,
    /// Whether repeater sub-fields run through the validation pipeline.
    pub validate_repeater_items: bool,

    // ── Repeaters ────────────────────────────────────────────────────

    /// Number of empty items a repeater starts with.
    pub seed_repeater_items: usize,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log filter directive (e.g. "info", "formflow_forms=debug").
    pub log_level: String,
    /// Human-readable log output instead of JSON.
    pub debug: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            autosave: false,
            autosave_debounce_ms: 1000,
            autosave_reset_ms: 2000,
            async_check_delay_ms: 800,
            reserved_values: vec!["admin".to_string()],
            validate_repeater_items: true,
            seed_repeater_items: 1,
            log_level: "info".to_string(),
            debug: false,
        }
    }
}

impl EngineSettings {
    /// Returns a copy with autosave switched on or off.
    #[must_use]
    pub fn with_autosave(mut self, enabled: bool) -> Self {
        self.autosave = enabled;
        self
    }

    /// The autosave debounce window.
    pub const fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    /// How long `saved` is displayed.
    pub const fn autosave_reset(&self) -> Duration {
        Duration::from_millis(self.autosave_reset_ms)
    }

    /// The simulated remote-check latency.
    pub const fn async_check_delay(&self) -> Duration {
        Duration::from_millis(self.async_check_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = EngineSettings::default();
        assert!(!s.autosave);
        assert_eq!(s.autosave_debounce_ms, 1000);
        assert_eq!(s.autosave_reset_ms, 2000);
        assert_eq!(s.async_check_delay_ms, 800);
        assert_eq!(s.reserved_values, vec!["admin".to_string()]);
        assert!(s.validate_repeater_items);
        assert_eq!(s.seed_repeater_items, 1);
        assert_eq!(s.log_level, "info");
        assert!(!s.debug);
    }

    #[test]
    fn test_durations() {
        let s = EngineSettings::default();
        assert_eq!(s.autosave_debounce(), Duration::from_secs(1));
        assert_eq!(s.autosave_reset(), Duration::from_secs(2));
        assert_eq!(s.async_check_delay(), Duration::from_millis(800));
    }

    #[test]
    fn test_with_autosave() {
        let s = EngineSettings::default().with_autosave(true);
        assert!(s.autosave);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let s: EngineSettings = serde_json::from_str(r#"{"autosave": true}"#).unwrap();
        assert!(s.autosave);
        assert_eq!(s.autosave_debounce_ms, 1000);
    }
}
