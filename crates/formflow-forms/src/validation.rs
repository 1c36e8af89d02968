//! Validation pipeline for form fields.
//!
//! A field's rules run in declaration order and the pipeline stops at the
//! first failure: the failing rule's message becomes the field's error.
//! Only `required` looks at empty values; `pattern`, `minLength`, and
//! `async` are skipped unless the value is non-empty.
//!
//! Configuration mistakes (an uncompilable pattern, an unreachable remote
//! check) surface as a generic message on the affected field only. The
//! pipeline never returns `Err` and never panics.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::fields::FormField;
use crate::remote::RemoteCheck;
use crate::value::FieldValue;

/// Message used when a `pattern` rule's regular expression does not compile.
pub const INVALID_PATTERN_MESSAGE: &str = "Invalid validation pattern";

/// Message used when an `async` rule's remote check could not be performed.
pub const CHECK_UNAVAILABLE_MESSAGE: &str = "Could not verify this value";

/// One check attached to a field, with the message shown when it fails.
///
/// Serialized with a `type` tag matching the schema JSON:
/// `required`, `pattern`, `minLength`, `async`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ValidationRule {
    /// Fails on an absent value, empty text, or zero repeater items.
    Required {
        /// Failure message.
        message: String,
    },
    /// Fails if a non-empty value does not contain a match for the pattern.
    Pattern {
        /// Regular expression source. Unanchored unless the source anchors.
        #[serde(rename = "value")]
        pattern: String,
        /// Failure message.
        message: String,
    },
    /// Fails if a non-empty value is shorter than the threshold.
    MinLength {
        /// Minimum length in characters (or items, for repeaters).
        #[serde(rename = "value")]
        min: usize,
        /// Failure message.
        message: String,
    },
    /// Fails if the remote check rejects a non-empty value.
    Async {
        /// Opaque endpoint reference handed to the [`RemoteCheck`].
        #[serde(rename = "value")]
        endpoint: String,
        /// Failure message.
        message: String,
    },
}

impl ValidationRule {
    /// A `required` rule.
    pub fn required(message: impl Into<String>) -> Self {
        Self::Required {
            message: message.into(),
        }
    }

    /// A `pattern` rule.
    pub fn pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// A `minLength` rule.
    pub fn min_length(min: usize, message: impl Into<String>) -> Self {
        Self::MinLength {
            min,
            message: message.into(),
        }
    }

    /// An `async` rule.
    pub fn remote(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Async {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// The rule's failure message.
    pub fn message(&self) -> &str {
        match self {
            Self::Required { message }
            | Self::Pattern { message, .. }
            | Self::MinLength { message, .. }
            | Self::Async { message, .. } => message,
        }
    }

    /// The schema tag of this rule.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Required { .. } => "required",
            Self::Pattern { .. } => "pattern",
            Self::MinLength { .. } => "minLength",
            Self::Async { .. } => "async",
        }
    }
}

/// Validates `value` against the field's rules.
///
/// Returns the message of the first failing rule, or `None` if every rule
/// passes (or the field has no rules). `None` for `value` means the field
/// has no value at all, e.g. a repeater sub-field never edited.
pub async fn validate(
    field: &FormField,
    value: Option<&FieldValue>,
    remote: &dyn RemoteCheck,
) -> Option<String> {
    for rule in &field.rules {
        if let Some(message) = check_rule(&field.name, rule, value, remote).await {
            tracing::trace!(field = %field.name, rule = rule.tag(), "rule failed");
            return Some(message);
        }
    }
    None
}

async fn check_rule(
    field_name: &str,
    rule: &ValidationRule,
    value: Option<&FieldValue>,
    remote: &dyn RemoteCheck,
) -> Option<String> {
    let present = value.filter(|v| v.is_present());

    match rule {
        ValidationRule::Required { message } => value
            .map_or(true, FieldValue::is_empty)
            .then(|| message.clone()),

        ValidationRule::Pattern { pattern, message } => {
            let text = present?.as_text()?;
            match Regex::new(pattern) {
                Ok(re) => (!re.is_match(text)).then(|| message.clone()),
                Err(e) => {
                    tracing::warn!(field = field_name, %pattern, error = %e, "invalid validation pattern");
                    Some(INVALID_PATTERN_MESSAGE.to_string())
                }
            }
        }

        ValidationRule::MinLength { min, message } => {
            let len = present?.len()?;
            (len < *min).then(|| message.clone())
        }

        ValidationRule::Async { endpoint, message } => {
            let text = present?.as_text()?;
            match remote.check(endpoint, text).await {
                Ok(true) => None,
                Ok(false) => Some(message.clone()),
                Err(e) => {
                    tracing::warn!(field = field_name, %endpoint, error = %e, "remote check failed");
                    Some(CHECK_UNAVAILABLE_MESSAGE.to_string())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldKind;
    use crate::remote::SimulatedRemoteCheck;
    use crate::value::FormValues;
    use async_trait::async_trait;
    use formflow_core::{FormError, FormResult};
    use std::time::Duration;

    const EMAIL_PATTERN: &str = r"^[^@]+@[^@]+\.[^@]+$";

    fn email_field() -> FormField {
        FormField::new("email", FieldKind::Email)
            .rule(ValidationRule::required("Email is required"))
            .rule(ValidationRule::pattern(EMAIL_PATTERN, "Enter a valid email"))
    }

    fn username_field() -> FormField {
        FormField::new("username", FieldKind::Text)
            .rule(ValidationRule::required("Username is required"))
            .rule(ValidationRule::min_length(3, "Username must be at least 3 characters"))
            .rule(ValidationRule::remote("/api/check-username", "Username already taken"))
    }

    fn remote() -> SimulatedRemoteCheck {
        SimulatedRemoteCheck::new(Duration::from_millis(800), vec!["admin".into()])
    }

    #[derive(Debug)]
    struct Unreachable;

    #[async_trait]
    impl RemoteCheck for Unreachable {
        async fn check(&self, _endpoint: &str, _value: &str) -> FormResult<bool> {
            Err(FormError::ConfigurationError("no route".into()))
        }
    }

    #[tokio::test]
    async fn test_no_rules_passes() {
        let field = FormField::new("free", FieldKind::Text);
        assert_eq!(validate(&field, None, &remote()).await, None);
    }

    #[tokio::test]
    async fn test_required_fails_on_missing_and_empty() {
        let field = email_field();
        let r = remote();
        assert_eq!(validate(&field, None, &r).await.as_deref(), Some("Email is required"));
        assert_eq!(
            validate(&field, Some(&"".into()), &r).await.as_deref(),
            Some("Email is required")
        );
    }

    #[tokio::test]
    async fn test_required_fails_on_zero_items() {
        let field = FormField::new("phones", FieldKind::Repeater)
            .rule(ValidationRule::required("Add a phone"));
        let r = remote();
        assert!(validate(&field, Some(&FieldValue::Items(vec![])), &r).await.is_some());
        let one = FieldValue::Items(vec![FormValues::new()]);
        assert!(validate(&field, Some(&one), &r).await.is_none());
    }

    #[tokio::test]
    async fn test_required_passes_on_unchecked_checkbox() {
        let field = FormField::new("terms", FieldKind::Checkbox)
            .rule(ValidationRule::required("Accept the terms"));
        assert_eq!(validate(&field, Some(&false.into()), &remote()).await, None);
    }

    #[tokio::test]
    async fn test_pattern() {
        let field = email_field();
        let r = remote();
        assert_eq!(
            validate(&field, Some(&"not-an-email".into()), &r).await.as_deref(),
            Some("Enter a valid email")
        );
        assert_eq!(validate(&field, Some(&"a@b.co".into()), &r).await, None);
    }

    #[tokio::test]
    async fn test_pattern_is_unanchored_search() {
        let field = FormField::new("code", FieldKind::Text)
            .rule(ValidationRule::pattern("[0-9]", "Needs a digit"));
        assert_eq!(validate(&field, Some(&"abc1def".into()), &remote()).await, None);
    }

    #[tokio::test]
    async fn test_pattern_and_min_length_skip_empty() {
        let field = FormField::new("bio", FieldKind::Textarea)
            .rule(ValidationRule::min_length(10, "Too short"))
            .rule(ValidationRule::pattern("^x", "Starts with x"));
        let r = remote();
        assert_eq!(validate(&field, Some(&"".into()), &r).await, None);
        assert_eq!(validate(&field, None, &r).await, None);
    }

    #[tokio::test]
    async fn test_min_length_boundary() {
        let field = FormField::new("password", FieldKind::Password)
            .rule(ValidationRule::min_length(8, "Password must be at least 8 characters"));
        let r = remote();
        assert!(validate(&field, Some(&"1234567".into()), &r).await.is_some());
        assert_eq!(validate(&field, Some(&"12345678".into()), &r).await, None);
    }

    #[tokio::test]
    async fn test_min_length_counts_astral_chars_twice() {
        let field = FormField::new("bio", FieldKind::Textarea)
            .rule(ValidationRule::min_length(4, "Too short"));
        let r = remote();
        assert_eq!(validate(&field, Some(&"🦀🦀".into()), &r).await, None);
        assert!(validate(&field, Some(&"🦀x".into()), &r).await.is_some());
    }

    #[tokio::test]
    async fn test_first_failure_wins() {
        let field = username_field();
        // Too short: minLength fails and the remote check never runs.
        assert_eq!(
            validate(&field, Some(&"ad".into()), &Unreachable).await.as_deref(),
            Some("Username must be at least 3 characters")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_rule_rejects_reserved_any_case() {
        let field = username_field();
        let r = remote();
        for v in ["admin", "ADMIN", "Admin"] {
            assert_eq!(
                validate(&field, Some(&v.into()), &r).await.as_deref(),
                Some("Username already taken")
            );
        }
        assert_eq!(validate(&field, Some(&"ada_l".into()), &r).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_rule_suspends_for_delay() {
        let field = username_field();
        let start = tokio::time::Instant::now();
        validate(&field, Some(&"grace".into()), &remote()).await;
        assert!(start.elapsed() >= Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_invalid_pattern_is_a_field_failure() {
        let field = FormField::new("broken", FieldKind::Text)
            .rule(ValidationRule::pattern("([a-z", "never shown"));
        assert_eq!(
            validate(&field, Some(&"abc".into()), &remote()).await.as_deref(),
            Some(INVALID_PATTERN_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_unreachable_remote_is_a_field_failure() {
        let field = FormField::new("username", FieldKind::Text)
            .rule(ValidationRule::remote("/api/check-username", "taken"));
        assert_eq!(
            validate(&field, Some(&"grace".into()), &Unreachable).await.as_deref(),
            Some(CHECK_UNAVAILABLE_MESSAGE)
        );
    }

    #[test]
    fn test_rule_json_shape() {
        let rules: Vec<ValidationRule> = serde_json::from_value(serde_json::json!([
            {"type": "required", "message": "a"},
            {"type": "pattern", "value": "^x$", "message": "b"},
            {"type": "minLength", "value": 10, "message": "c"},
            {"type": "async", "value": "/api/check", "message": "d"}
        ]))
        .unwrap();
        assert_eq!(rules[0], ValidationRule::required("a"));
        assert_eq!(rules[1], ValidationRule::pattern("^x$", "b"));
        assert_eq!(rules[2], ValidationRule::min_length(10, "c"));
        assert_eq!(rules[3], ValidationRule::remote("/api/check", "d"));
        assert_eq!(rules[2].tag(), "minLength");
        assert_eq!(rules[3].message(), "d");
    }
}
