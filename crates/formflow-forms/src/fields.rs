//! Form field definitions.
//!
//! Each [`FormField`] describes a single input unit of a schema: its name,
//! label, [`FieldKind`], optional placeholder and select options, ordered
//! validation rules, nested sub-fields (repeaters only), and an optional
//! visibility [`Condition`]. Field definitions deserialize from the JSON
//! shape the embedding application supplies:
//!
//! ```json
//! {
//!   "name": "email",
//!   "label": "Email",
//!   "type": "email",
//!   "validation": [{"type": "required", "message": "Email is required"}]
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::validation::ValidationRule;

/// The closed set of field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Single-line text.
    Text,
    /// Email address.
    Email,
    /// Masked password input.
    Password,
    /// Telephone number.
    Tel,
    /// URL.
    Url,
    /// Multi-line text.
    Textarea,
    /// Single choice among declared options.
    Select,
    /// Boolean toggle.
    Checkbox,
    /// Variable-length list of sub-field groups.
    Repeater,
}

impl FieldKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Text,
        Self::Email,
        Self::Password,
        Self::Tel,
        Self::Url,
        Self::Textarea,
        Self::Select,
        Self::Checkbox,
        Self::Repeater,
    ];

    /// The schema tag for this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Password => "password",
            Self::Tel => "tel",
            Self::Url => "url",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::Repeater => "repeater",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `{label, value}` choice of a select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Display text.
    pub label: String,
    /// Submitted value.
    pub value: String,
}

impl SelectOption {
    /// Creates a new option.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Complete definition of a form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    /// The field name, unique among its siblings.
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// The field kind.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Placeholder text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Choices for select fields, in display order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    /// Validation rules, evaluated in order.
    #[serde(default, rename = "validation", skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<ValidationRule>,
    /// The shape of one repeater item. Ignored for other kinds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FormField>,
    /// Visibility condition. Absent means always visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl FormField {
    /// Creates a new field with no rules, options, or condition.
    ///
    /// The label defaults to the name with underscores replaced by spaces.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        let label = name.replace('_', " ");
        Self {
            name,
            label,
            kind,
            placeholder: None,
            options: Vec::new(),
            rules: Vec::new(),
            fields: Vec::new(),
            condition: None,
        }
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the placeholder.
    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Appends a select option.
    #[must_use]
    pub fn option(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push(SelectOption::new(label, value));
        self
    }

    /// Appends a validation rule.
    #[must_use]
    pub fn rule(mut self, rule: ValidationRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Appends a repeater sub-field.
    #[must_use]
    pub fn sub_field(mut self, field: Self) -> Self {
        self.fields.push(field);
        self
    }

    /// Sets the visibility condition.
    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Returns `true` if the field carries a `required` rule.
    pub fn is_required(&self) -> bool {
        self.rules
            .iter()
            .any(|r| matches!(r, ValidationRule::Required { .. }))
    }

    /// Returns `true` if validating this field may suspend on a remote check.
    pub fn has_async_rule(&self) -> bool {
        self.rules
            .iter()
            .any(|r| matches!(r, ValidationRule::Async { .. }))
    }

    /// Looks up a repeater sub-field by name.
    pub fn sub_field_named(&self, name: &str) -> Option<&Self> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns `true` if `value` is one of the declared option values.
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}
