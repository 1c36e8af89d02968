//! Mutable per-engine form state.
//!
//! [`FormState`] holds the current values, the current error per key, the
//! "validation in flight" flag per key and the autosave status. Keys are
//! top-level field names or repeater item keys (see [`crate::repeater`]).
//!
//! Every validation is issued a generation token by
//! [`FormState::begin_validation`]. Its result is applied only if the token
//! is still the latest one issued for that key, so a slow validation that
//! resolves after a newer one started can never overwrite fresher state.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::autosave::AutosaveStatus;
use crate::repeater;
use crate::value::FormValues;

/// Snapshot-able state of one bound form.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormState {
    /// Current value per top-level field.
    pub values: FormValues,
    /// Current error per key. Absent means valid.
    pub errors: BTreeMap<String, String>,
    /// In-flight flag per key.
    pub validating: BTreeMap<String, bool>,
    /// Autosave status.
    pub autosave_status: AutosaveStatus,
    #[serde(skip)]
    generations: HashMap<String, u64>,
}

impl FormState {
    /// Creates a state holding `values` with no errors and nothing in flight.
    pub fn new(values: FormValues) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    /// Returns the current error for `key`.
    pub fn error(&self, key: &str) -> Option<&str> {
        self.errors.get(key).map(String::as_str)
    }

    /// Returns `true` while a validation for `key` is in flight.
    pub fn is_validating(&self, key: &str) -> bool {
        self.validating.get(key).copied().unwrap_or(false)
    }

    /// Returns `true` while any validation is in flight.
    pub fn any_validating(&self) -> bool {
        self.validating.values().any(|v| *v)
    }

    /// Starts a validation for `key`.
    ///
    /// Clears the key's previous error, raises its in-flight flag and
    /// returns the new generation token.
    pub(crate) fn begin_validation(&mut self, key: &str) -> u64 {
        let generation = self.generations.entry(key.to_string()).or_insert(0);
        *generation += 1;
        self.errors.remove(key);
        self.validating.insert(key.to_string(), true);
        *generation
    }

    /// Returns `true` if `token` is the latest generation issued for `key`.
    pub(crate) fn is_current(&self, key: &str, token: u64) -> bool {
        self.generations.get(key) == Some(&token)
    }

    /// Applies a validation result if `token` is still current.
    ///
    /// Returns `false` (and changes nothing) for a stale result.
    pub(crate) fn finish_validation(
        &mut self,
        key: &str,
        token: u64,
        result: Option<String>,
    ) -> bool {
        if !self.is_current(key, token) {
            return false;
        }
        self.validating.insert(key.to_string(), false);
        match result {
            Some(message) => {
                self.errors.insert(key.to_string(), message);
            }
            None => {
                self.errors.remove(key);
            }
        }
        true
    }

    /// Lowers the in-flight flag of `key` if `token` is still current,
    /// leaving its error untouched.
    pub(crate) fn settle_validation(&mut self, key: &str, token: u64) {
        if self.is_current(key, token) {
            self.validating.insert(key.to_string(), false);
        }
    }

    /// Updates per-key bookkeeping after item `removed` of repeater `field`
    /// was deleted.
    ///
    /// In-flight validations of any item of the repeater are discarded,
    /// and the errors of later items move down one index.
    pub(crate) fn forget_item(&mut self, field: &str, removed: usize) {
        for key in repeater::keys_of(&self.validating, field) {
            if let Some(generation) = self.generations.get_mut(key.as_str()) {
                *generation += 1;
            }
        }
        self.validating
            .retain(|k, _| repeater::parse_item_key(field, k).is_none());
        repeater::rekey_after_removal(&mut self.errors, field, removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_clean() {
        let state = FormState::new(FormValues::new());
        assert!(state.errors.is_empty());
        assert!(!state.any_validating());
        assert_eq!(state.autosave_status, AutosaveStatus::Idle);
    }

    #[test]
    fn test_begin_clears_error_and_raises_flag() {
        let mut state = FormState::default();
        state.errors.insert("email".into(), "old".into());
        let token = state.begin_validation("email");
        assert_eq!(state.error("email"), None);
        assert!(state.is_validating("email"));
        assert!(state.finish_validation("email", token, Some("new".into())));
        assert_eq!(state.error("email"), Some("new"));
        assert!(!state.is_validating("email"));
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let mut state = FormState::default();
        let first = state.begin_validation("username");
        let second = state.begin_validation("username");

        // The newer validation resolves first.
        assert!(state.finish_validation("username", second, None));
        assert!(!state.is_validating("username"));

        // The older one arrives late and must not clobber anything.
        assert!(!state.finish_validation("username", first, Some("Username already taken".into())));
        assert_eq!(state.error("username"), None);
        assert!(!state.is_validating("username"));
    }

    #[test]
    fn test_flag_stays_up_until_latest_resolves() {
        let mut state = FormState::default();
        let first = state.begin_validation("username");
        let second = state.begin_validation("username");
        assert!(!state.finish_validation("username", first, None));
        assert!(state.is_validating("username"));
        assert!(state.finish_validation("username", second, None));
        assert!(!state.is_validating("username"));
    }

    #[test]
    fn test_tokens_are_per_key() {
        let mut state = FormState::default();
        let a = state.begin_validation("a");
        let _b = state.begin_validation("b");
        assert!(state.finish_validation("a", a, None));
    }

    #[test]
    fn test_settle_keeps_error() {
        let mut state = FormState::default();
        let token = state.begin_validation("name");
        state.errors.insert("name".into(), "Name is required".into());
        state.settle_validation("name", token);
        assert!(!state.is_validating("name"));
        assert_eq!(state.error("name"), Some("Name is required"));
    }

    #[test]
    fn test_forget_item_discards_and_rekeys() {
        let mut state = FormState::default();
        let pending = state.begin_validation("phones-2-number");
        state.errors.insert("phones-0-number".into(), "zero".into());
        state.errors.insert("phones-2-type".into(), "two".into());
        state.errors.insert("name".into(), "top".into());

        state.forget_item("phones", 1);

        assert!(!state.is_validating("phones-2-number"));
        assert!(!state.finish_validation("phones-2-number", pending, Some("late".into())));
        assert_eq!(state.error("phones-0-number"), Some("zero"));
        assert_eq!(state.error("phones-1-type"), Some("two"));
        assert_eq!(state.error("phones-2-type"), None);
        assert_eq!(state.error("name"), Some("top"));
    }

    #[test]
    fn test_snapshot_serializes_without_generations() {
        let mut state = FormState::default();
        state.begin_validation("x");
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("generations").is_none());
        assert_eq!(json["autosave_status"], "idle");
    }
}
