//! Form schemas.
//!
//! A [`FormSchema`] is the declarative description of one form: an id, a
//! version, a title and description, and the ordered list of top-level
//! [`FormField`]s. Schemas are immutable once loaded; the engine binds to
//! one at a time.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use formflow_core::{FormError, FormResult};

use crate::condition;
use crate::fields::{FieldKind, FormField};
use crate::value::FormValues;

/// The complete description of a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    /// Identifier, e.g. `"contact-form"`.
    pub id: String,
    /// Schema version.
    pub version: u32,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Display description.
    #[serde(default)]
    pub description: String,
    /// Top-level fields in display order.
    pub fields: Vec<FormField>,
}

impl FormSchema {
    /// Creates an empty schema.
    pub fn new(id: impl Into<String>, version: u32) -> Self {
        Self {
            id: id.into(),
            version,
            title: String::new(),
            description: String::new(),
            fields: Vec::new(),
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Appends a top-level field.
    #[must_use]
    pub fn with_field(mut self, field: FormField) -> Self {
        self.fields.push(field);
        self
    }

    /// Parses and checks a schema from JSON text.
    pub fn from_json_str(json: &str) -> FormResult<Self> {
        let schema: Self = serde_json::from_str(json)?;
        schema.check()?;
        Ok(schema)
    }

    /// Parses and checks a schema from a JSON value.
    pub fn from_json_value(value: serde_json::Value) -> FormResult<Self> {
        let schema: Self = serde_json::from_value(value)?;
        schema.check()?;
        Ok(schema)
    }

    /// Reads, parses, and checks a schema from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> FormResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading form schema");
        Self::from_json_str(&content)
    }

    /// Checks structural consistency.
    ///
    /// Rejects empty or duplicate sibling names and repeaters without
    /// sub-fields. A condition that references no sibling is legal (the
    /// field is then only visible when the condition literal is absent)
    /// and is only reported as a warning.
    pub fn check(&self) -> FormResult<()> {
        if self.id.is_empty() {
            return Err(FormError::SchemaError("schema id must not be empty".into()));
        }
        check_siblings(&self.id, &self.fields)
    }

    /// Looks up a top-level field by name.
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a top-level field, failing with `UnknownField`.
    pub fn require_field(&self, name: &str) -> FormResult<&FormField> {
        self.field(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    /// Looks up a repeater and returns the shape of one of its items.
    pub fn repeater_fields(&self, name: &str) -> FormResult<&[FormField]> {
        let field = self.require_field(name)?;
        if field.kind == FieldKind::Repeater {
            Ok(&field.fields)
        } else {
            Err(FormError::NotARepeater(name.to_string()))
        }
    }

    /// Top-level fields visible under `values`, in schema order.
    pub fn visible_fields<'a>(
        &'a self,
        values: &'a FormValues,
    ) -> impl Iterator<Item = &'a FormField> + 'a {
        self.fields
            .iter()
            .filter(move |f| condition::is_visible(f.condition.as_ref(), values))
    }
}

fn check_siblings(scope: &str, fields: &[FormField]) -> FormResult<()> {
    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        if field.name.is_empty() {
            return Err(FormError::SchemaError(format!(
                "{scope}: field names must not be empty"
            )));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(FormError::SchemaError(format!(
                "{scope}: duplicate field name '{}'",
                field.name
            )));
        }
        if field.kind == FieldKind::Repeater {
            if field.fields.is_empty() {
                return Err(FormError::SchemaError(format!(
                    "{scope}: repeater '{}' declares no sub-fields",
                    field.name
                )));
            }
            check_siblings(&format!("{scope}.{}", field.name), &field.fields)?;
        }
    }

    for field in fields {
        if let Some(cond) = &field.condition {
            if !seen.contains(cond.field.as_str()) {
                tracing::warn!(
                    scope,
                    field = %field.name,
                    referenced = %cond.field,
                    "condition references an unknown field"
                );
            }
        }
    }
    Ok(())
}
