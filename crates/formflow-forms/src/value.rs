//! Form value types.
//!
//! [`FieldValue`] is the discriminated value held for every field: text for
//! the input-like kinds, a boolean for checkboxes, and an ordered list of
//! item maps for repeaters. It serializes untagged, so a value set looks like
//! the plain JSON an embedding UI would produce:
//!
//! ```json
//! {"name": "Ada", "subscribe": false, "phones": [{"number": "555", "type": "home"}]}
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A mapping from field name to value.
///
/// Used both for the top-level form values and for a single repeater item.
pub type FormValues = BTreeMap<String, FieldValue>;

/// The current value of one field.
///
/// # Examples
///
/// ```
/// use formflow_forms::value::FieldValue;
///
/// assert!(FieldValue::from("").is_empty());
/// assert!(FieldValue::from(false).is_present());
/// assert_eq!(FieldValue::from("abc").len(), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A boolean (checkbox).
    Bool(bool),
    /// A string (text-like inputs, textarea, select).
    Text(String),
    /// Repeater items, each a map from sub-field name to value.
    Items(Vec<FormValues>),
}

impl FieldValue {
    /// An empty text value.
    pub fn empty_text() -> Self {
        Self::Text(String::new())
    }

    /// Returns `true` if this value counts as missing for a `required` rule:
    /// the empty string or zero repeater items. Booleans are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Items(items) => items.is_empty(),
            Self::Bool(_) => false,
        }
    }

    /// Returns `true` if this value is "non-empty" in the sense that gates the
    /// `pattern`, `minLength`, and `async` rules: non-empty text, `true`, or at
    /// least one item.
    pub fn is_present(&self) -> bool {
        match self {
            Self::Text(s) => !s.is_empty(),
            Self::Items(items) => !items.is_empty(),
            Self::Bool(b) => *b,
        }
    }

    /// Returns the text a pattern is tested against, if the value has one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Bool(true) => Some("true"),
            Self::Bool(false) => Some("false"),
            Self::Items(_) => None,
        }
    }

    /// Returns the boolean, if this is a checkbox value.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the repeater items, if this is a repeater value.
    pub fn as_items(&self) -> Option<&[FormValues]> {
        match self {
            Self::Items(items) => Some(items),
            _ => None,
        }
    }

    /// Mutable access to repeater items.
    pub fn as_items_mut(&mut self) -> Option<&mut Vec<FormValues>> {
        match self {
            Self::Items(items) => Some(items),
            _ => None,
        }
    }

    /// The length used by `minLength`: UTF-16 code units for text (so a
    /// character outside the Basic Multilingual Plane counts as two, as in
    /// a browser), item count for repeaters. Booleans have no length.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Text(s) => Some(s.encode_utf16().count()),
            Self::Items(items) => Some(items.len()),
            Self::Bool(_) => None,
        }
    }

    /// Strict equality against a JSON literal, without coercion.
    ///
    /// Text only equals a JSON string and booleans only a JSON boolean.
    /// Item lists never equal a literal.
    pub fn strict_eq(&self, literal: &serde_json::Value) -> bool {
        match (self, literal) {
            (Self::Text(s), serde_json::Value::String(l)) => s == l,
            (Self::Bool(b), serde_json::Value::Bool(l)) => b == l,
            _ => false,
        }
    }

    /// A short name for the shape of this value, used in diagnostics.
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Bool(_) => "boolean",
            Self::Items(_) => "items",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Items(items) => write!(f, "<{} items>", items.len()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<FormValues>> for FieldValue {
    fn from(items: Vec<FormValues>) -> Self {
        Self::Items(items)
    }
}
