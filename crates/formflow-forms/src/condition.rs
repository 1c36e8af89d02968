//! Field visibility conditions.
//!
//! A [`Condition`] ties one field's visibility to another field's current
//! value: the field is shown iff the referenced value is strictly equal to
//! the condition's literal. Conditions are re-evaluated on every render and
//! before submit-time validation; nothing is cached.

use serde::{Deserialize, Serialize};

use crate::value::FormValues;

/// A visibility predicate `values[field] === eq`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// The sibling field whose value is inspected.
    pub field: String,
    /// The literal to compare against. An absent literal only matches an
    /// absent value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eq: Option<serde_json::Value>,
}

impl Condition {
    /// Creates a condition that holds when `field` equals `eq`.
    ///
    /// # Examples
    ///
    /// ```
    /// use formflow_forms::condition::Condition;
    /// use formflow_forms::value::{FieldValue, FormValues};
    ///
    /// let cond = Condition::equals("accountType", "business");
    /// let mut values = FormValues::new();
    /// values.insert("accountType".into(), FieldValue::from("business"));
    /// assert!(cond.holds(&values));
    /// ```
    pub fn equals(field: impl Into<String>, eq: impl Into<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            eq: Some(eq.into()),
        }
    }

    /// Evaluates the condition against the given values. No coercion.
    pub fn holds(&self, values: &FormValues) -> bool {
        match (values.get(&self.field), &self.eq) {
            (None, None) => true,
            (Some(value), Some(literal)) => value.strict_eq(literal),
            _ => false,
        }
    }
}

/// Returns whether a field with the given (optional) condition is visible.
///
/// No condition means always visible.
pub fn is_visible(condition: Option<&Condition>, values: &FormValues) -> bool {
    condition.map_or(true, |c| c.holds(values))
}
