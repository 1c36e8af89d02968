//! A registry of named schemas.
//!
//! The engine binds one schema at a time and knows nothing about where it
//! came from. [`SchemaCatalog`] is the application-side lookup table a
//! showcase or router uses to pick a schema by id. [`SchemaCatalog::builtin`]
//! carries the five reference forms: contact, conditional, repeater, async,
//! and autosave.

use std::collections::BTreeMap;

use formflow_core::FormResult;

use crate::condition::Condition;
use crate::fields::{FieldKind, FormField};
use crate::schema::FormSchema;
use crate::validation::ValidationRule;

/// Pattern used by the reference email fields.
pub const EMAIL_PATTERN: &str = r"^[^@]+@[^@]+\.[^@]+$";

/// Pattern used by the reference website field.
pub const URL_PATTERN: &str = r"^https?://.+$";

/// Schemas indexed by id.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    schemas: BTreeMap<String, FormSchema>,
}

impl SchemaCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks and registers a schema, replacing any schema with the same id.
    pub fn register(&mut self, schema: FormSchema) -> FormResult<()> {
        schema.check()?;
        if self.schemas.contains_key(&schema.id) {
            tracing::debug!(id = %schema.id, "replacing registered schema");
        }
        self.schemas.insert(schema.id.clone(), schema);
        Ok(())
    }

    /// Looks up a schema by id.
    pub fn get(&self, id: &str) -> Option<&FormSchema> {
        self.schemas.get(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// A catalog holding the reference schemas.
    pub fn builtin() -> Self {
        let schemas = [
            contact_form(),
            conditional_form(),
            repeater_form(),
            async_form(),
            autosave_form(),
        ];
        Self {
            schemas: schemas.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }
}

/// A contact form with basic validation.
pub fn contact_form() -> FormSchema {
    FormSchema::new("contact-form", 1)
        .title("Contact Form")
        .description("A simple contact form with basic validation.")
        .with_field(
            FormField::new("name", FieldKind::Text)
                .label("Full Name")
                .placeholder("John Doe")
                .rule(ValidationRule::required("Name is required")),
        )
        .with_field(
            FormField::new("email", FieldKind::Email)
                .label("Email")
                .placeholder("john@example.com")
                .rule(ValidationRule::required("Email is required"))
                .rule(ValidationRule::pattern(EMAIL_PATTERN, "Enter a valid email")),
        )
        .with_field(
            FormField::new("subject", FieldKind::Select)
                .label("Subject")
                .placeholder("Choose a subject")
                .option("General Inquiry", "general")
                .option("Bug Report", "bug")
                .option("Feature Request", "feature")
                .rule(ValidationRule::required("Please select a subject")),
        )
        .with_field(
            FormField::new("message", FieldKind::Textarea)
                .label("Message")
                .placeholder("Your message...")
                .rule(ValidationRule::required("Message is required"))
                .rule(ValidationRule::min_length(
                    10,
                    "Message must be at least 10 characters",
                )),
        )
        .with_field(FormField::new("subscribe", FieldKind::Checkbox).label("Subscribe to newsletter"))
}

/// Fields that appear depending on the account type.
pub fn conditional_form() -> FormSchema {
    FormSchema::new("conditional-form", 1)
        .title("Conditional Logic")
        .description("Fields appear or disappear based on other field values.")
        .with_field(
            FormField::new("accountType", FieldKind::Select)
                .label("Account Type")
                .option("Personal", "personal")
                .option("Business", "business")
                .rule(ValidationRule::required("Account type is required")),
        )
        .with_field(
            FormField::new("businessName", FieldKind::Text)
                .label("Business Name")
                .placeholder("Your company name")
                .rule(ValidationRule::required("Business name is required"))
                .condition(Condition::equals("accountType", "business")),
        )
        .with_field(
            FormField::new("businessId", FieldKind::Text)
                .label("Business ID")
                .placeholder("ABN / Tax ID")
                .rule(ValidationRule::required("Business ID is required"))
                .condition(Condition::equals("accountType", "business")),
        )
        .with_field(
            FormField::new("personalId", FieldKind::Text)
                .label("Personal ID")
                .placeholder("Driver's license / Passport")
                .rule(ValidationRule::required("Personal ID is required"))
                .condition(Condition::equals("accountType", "personal")),
        )
}

/// A name plus a list of phone numbers.
pub fn repeater_form() -> FormSchema {
    FormSchema::new("repeater-form", 1)
        .title("Repeaters")
        .description("Add multiple items like phone numbers or addresses.")
        .with_field(
            FormField::new("name", FieldKind::Text)
                .label("Full Name")
                .rule(ValidationRule::required("Name is required")),
        )
        .with_field(
            FormField::new("phones", FieldKind::Repeater)
                .label("Phone Numbers")
                .sub_field(
                    FormField::new("number", FieldKind::Tel)
                        .label("Phone Number")
                        .rule(ValidationRule::required("Phone number is required")),
                )
                .sub_field(
                    FormField::new("type", FieldKind::Select)
                        .label("Type")
                        .option("Mobile", "mobile")
                        .option("Home", "home")
                        .option("Work", "work"),
                ),
        )
}

/// A username checked against a remote endpoint.
pub fn async_form() -> FormSchema {
    FormSchema::new("async-form", 1)
        .title("Async Validation")
        .description("Username availability checked in real-time.")
        .with_field(
            FormField::new("username", FieldKind::Text)
                .label("Username")
                .placeholder("Choose a username")
                .rule(ValidationRule::required("Username is required"))
                .rule(ValidationRule::min_length(
                    3,
                    "Username must be at least 3 characters",
                ))
                .rule(ValidationRule::remote("/api/check-username", "Username already taken")),
        )
        .with_field(
            FormField::new("password", FieldKind::Password)
                .label("Password")
                .rule(ValidationRule::required("Password is required"))
                .rule(ValidationRule::min_length(
                    8,
                    "Password must be at least 8 characters",
                )),
        )
}

/// A profile form meant to be used with autosave enabled.
pub fn autosave_form() -> FormSchema {
    FormSchema::new("autosave-form", 1)
        .title("Autosave")
        .description("Changes are saved automatically as you type.")
        .with_field(
            FormField::new("bio", FieldKind::Textarea)
                .label("Biography")
                .placeholder("Tell us about yourself...")
                .rule(ValidationRule::min_length(10, "Bio must be at least 10 characters")),
        )
        .with_field(
            FormField::new("website", FieldKind::Url)
                .label("Website")
                .placeholder("https://example.com")
                .rule(ValidationRule::pattern(URL_PATTERN, "Enter a valid URL")),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids() {
        let catalog = SchemaCatalog::builtin();
        assert_eq!(catalog.len(), 5);
        assert_eq!(
            catalog.ids(),
            vec![
                "async-form",
                "autosave-form",
                "conditional-form",
                "contact-form",
                "repeater-form"
            ]
        );
    }

    #[test]
    fn test_builtin_schemas_pass_checks() {
        let catalog = SchemaCatalog::builtin();
        for id in catalog.ids() {
            catalog.get(id).unwrap().check().unwrap();
        }
    }

    #[test]
    fn test_builtin_matches_json_shape() {
        let json = serde_json::to_value(contact_form()).unwrap();
        assert_eq!(json["fields"][1]["validation"][1]["type"], "pattern");
        assert_eq!(json["fields"][1]["validation"][1]["value"], EMAIL_PATTERN);
        assert_eq!(json["fields"][3]["validation"][1]["value"], 10);
        let back = FormSchema::from_json_value(json).unwrap();
        assert_eq!(back, contact_form());
    }

    #[test]
    fn test_register_and_replace() {
        let mut catalog = SchemaCatalog::new();
        assert!(catalog.is_empty());
        catalog.register(async_form()).unwrap();
        catalog.register(async_form().title("Again")).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("async-form").unwrap().title, "Again");
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_register_rejects_broken_schema() {
        let mut catalog = SchemaCatalog::new();
        let broken = FormSchema::new("broken", 1).with_field(FormField::new("r", FieldKind::Repeater));
        assert!(catalog.register(broken).is_err());
        assert!(catalog.is_empty());
    }
}
