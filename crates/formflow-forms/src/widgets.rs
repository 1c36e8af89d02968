//! Field-kind handlers.
//!
//! Each [`FieldKind`] has exactly one [`FieldHandler`], looked up through
//! [`handler_for`]. The lookup is an exhaustive `match`, so adding a kind
//! without a handler is a compile error. A handler knows:
//!
//! - the widget a view layer should draw for the kind,
//! - the default value a fresh form starts with,
//! - which value shapes the kind accepts at the engine boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

use formflow_core::{FormError, FormResult};

use crate::fields::{FieldKind, FormField};
use crate::repeater::item_key;
use crate::value::{FieldValue, FormValues};

/// The widget a view layer renders for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WidgetType {
    /// `<input type="text">`.
    TextInput,
    /// `<input type="email">`.
    EmailInput,
    /// `<input type="password">`.
    PasswordInput,
    /// `<input type="tel">`.
    TelInput,
    /// `<input type="url">`.
    UrlInput,
    /// `<textarea>`.
    Textarea,
    /// `<select>`.
    Select,
    /// `<input type="checkbox">`.
    CheckboxInput,
    /// A list of item groups with add/remove controls.
    Repeater,
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "TextInput",
            Self::EmailInput => "EmailInput",
            Self::PasswordInput => "PasswordInput",
            Self::TelInput => "TelInput",
            Self::UrlInput => "UrlInput",
            Self::Textarea => "Textarea",
            Self::Select => "Select",
            Self::CheckboxInput => "CheckboxInput",
            Self::Repeater => "Repeater",
        };
        write!(f, "{name}")
    }
}

/// Per-kind behavior of a field.
pub trait FieldHandler: Send + Sync + fmt::Debug {
    /// The kind this handler serves.
    fn kind(&self) -> FieldKind;

    /// The widget used to render the kind.
    fn widget_type(&self) -> WidgetType;

    /// The HTML `type` attribute for `<input>`-based widgets.
    fn input_type(&self) -> Option<&'static str>;

    /// The value a freshly initialized form holds.
    fn default_value(&self, seed_items: usize) -> FieldValue;

    /// Whether the widget lists the field's declared options.
    fn has_options(&self) -> bool {
        false
    }

    /// Checks that `value` has a shape this kind accepts.
    ///
    /// `key` is the name reported in errors (a field name, or a
    /// `repeater-index-sub` key for repeater sub-fields).
    fn accept(&self, field: &FormField, key: &str, value: &FieldValue) -> FormResult<()>;
}

/// Handler for the single-line and multi-line text kinds.
#[derive(Debug)]
pub struct TextHandler {
    kind: FieldKind,
    widget: WidgetType,
    input_type: Option<&'static str>,
}

impl FieldHandler for TextHandler {
    fn kind(&self) -> FieldKind {
        self.kind
    }

    fn widget_type(&self) -> WidgetType {
        self.widget
    }

    fn input_type(&self) -> Option<&'static str> {
        self.input_type
    }

    fn default_value(&self, _seed_items: usize) -> FieldValue {
        FieldValue::empty_text()
    }

    fn accept(&self, _field: &FormField, key: &str, value: &FieldValue) -> FormResult<()> {
        match value {
            FieldValue::Text(_) => Ok(()),
            _ => Err(mismatch(key, "text")),
        }
    }
}

/// Handler for select fields.
#[derive(Debug)]
pub struct SelectHandler;

impl FieldHandler for SelectHandler {
    fn kind(&self) -> FieldKind {
        FieldKind::Select
    }

    fn widget_type(&self) -> WidgetType {
        WidgetType::Select
    }

    fn input_type(&self) -> Option<&'static str> {
        None
    }

    fn default_value(&self, _seed_items: usize) -> FieldValue {
        FieldValue::empty_text()
    }

    fn has_options(&self) -> bool {
        true
    }

    /// Accepts the empty string (nothing selected) or a declared option
    /// value. A select without declared options accepts any text.
    fn accept(&self, field: &FormField, key: &str, value: &FieldValue) -> FormResult<()> {
        let FieldValue::Text(text) = value else {
            return Err(mismatch(key, "text"));
        };
        if text.is_empty() || field.options.is_empty() || field.has_option(text) {
            Ok(())
        } else {
            Err(FormError::InvalidChoice {
                field: key.to_string(),
                value: text.clone(),
            })
        }
    }
}

/// Handler for checkboxes.
#[derive(Debug)]
pub struct CheckboxHandler;

impl FieldHandler for CheckboxHandler {
    fn kind(&self) -> FieldKind {
        FieldKind::Checkbox
    }

    fn widget_type(&self) -> WidgetType {
        WidgetType::CheckboxInput
    }

    fn input_type(&self) -> Option<&'static str> {
        Some("checkbox")
    }

    fn default_value(&self, _seed_items: usize) -> FieldValue {
        FieldValue::Bool(false)
    }

    fn accept(&self, _field: &FormField, key: &str, value: &FieldValue) -> FormResult<()> {
        match value {
            FieldValue::Bool(_) => Ok(()),
            _ => Err(mismatch(key, "boolean")),
        }
    }
}

/// Handler for repeaters.
#[derive(Debug)]
pub struct RepeaterHandler;

impl FieldHandler for RepeaterHandler {
    fn kind(&self) -> FieldKind {
        FieldKind::Repeater
    }

    fn widget_type(&self) -> WidgetType {
        WidgetType::Repeater
    }

    fn input_type(&self) -> Option<&'static str> {
        None
    }

    fn default_value(&self, seed_items: usize) -> FieldValue {
        FieldValue::Items(vec![FormValues::new(); seed_items])
    }

    /// Accepts a list of items whose keys are declared sub-fields and whose
    /// values are accepted by the sub-field's own handler.
    fn accept(&self, field: &FormField, key: &str, value: &FieldValue) -> FormResult<()> {
        let FieldValue::Items(items) = value else {
            return Err(mismatch(key, "items"));
        };
        for (index, item) in items.iter().enumerate() {
            for (sub_name, sub_value) in item {
                let sub_key = item_key(key, index, sub_name);
                let sub = field
                    .sub_field_named(sub_name)
                    .ok_or_else(|| FormError::UnknownField(sub_key.clone()))?;
                handler_for(sub.kind).accept(sub, &sub_key, sub_value)?;
            }
        }
        Ok(())
    }
}

fn mismatch(key: &str, expected: &'static str) -> FormError {
    FormError::TypeMismatch {
        field: key.to_string(),
        expected,
    }
}

static TEXT: TextHandler = TextHandler {
    kind: FieldKind::Text,
    widget: WidgetType::TextInput,
    input_type: Some("text"),
};
static EMAIL: TextHandler = TextHandler {
    kind: FieldKind::Email,
    widget: WidgetType::EmailInput,
    input_type: Some("email"),
};
static PASSWORD: TextHandler = TextHandler {
    kind: FieldKind::Password,
    widget: WidgetType::PasswordInput,
    input_type: Some("password"),
};
static TEL: TextHandler = TextHandler {
    kind: FieldKind::Tel,
    widget: WidgetType::TelInput,
    input_type: Some("tel"),
};
static URL: TextHandler = TextHandler {
    kind: FieldKind::Url,
    widget: WidgetType::UrlInput,
    input_type: Some("url"),
};
static TEXTAREA: TextHandler = TextHandler {
    kind: FieldKind::Textarea,
    widget: WidgetType::Textarea,
    input_type: None,
};
static SELECT: SelectHandler = SelectHandler;
static CHECKBOX: CheckboxHandler = CheckboxHandler;
static REPEATER: RepeaterHandler = RepeaterHandler;

/// Returns the handler registered for a field kind.
pub fn handler_for(kind: FieldKind) -> &'static dyn FieldHandler {
    match kind {
        FieldKind::Text => &TEXT,
        FieldKind::Email => &EMAIL,
        FieldKind::Password => &PASSWORD,
        FieldKind::Tel => &TEL,
        FieldKind::Url => &URL,
        FieldKind::Textarea => &TEXTAREA,
        FieldKind::Select => &SELECT,
        FieldKind::Checkbox => &CHECKBOX,
        FieldKind::Repeater => &REPEATER,
    }
}
