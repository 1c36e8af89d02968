//! Core error types for the formflow engine.
//!
//! [`FormError`] covers caller mistakes (addressing a field that does not
//! exist, feeding a value of the wrong shape), malformed schemas, and
//! configuration problems. Field validation failures are *not* errors: they
//! are reported as per-field messages on the form state and never abort an
//! engine operation.

use thiserror::Error;

/// The primary error type for formflow.
#[derive(Error, Debug)]
pub enum FormError {
    // ── Addressing ───────────────────────────────────────────────────

    /// No top-level field with this name exists in the bound schema.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// The field exists but is not a repeater.
    #[error("Field is not a repeater: {0}")]
    NotARepeater(String),

    /// A repeater item index is past the end of the item list.
    #[error("Item {index} out of range for repeater '{field}' ({len} items)")]
    ItemOutOfRange {
        /// The repeater field name.
        field: String,
        /// The requested index.
        index: usize,
        /// The current number of items.
        len: usize,
    },

    // ── Value boundary ───────────────────────────────────────────────

    /// The supplied value does not have the shape the field kind expects.
    #[error("Type mismatch for field '{field}': expected {expected}")]
    TypeMismatch {
        /// The field (or `repeater-index-sub` key) being written.
        field: String,
        /// A short description of the accepted shape.
        expected: &'static str,
    },

    /// A select field received a value that is not one of its options.
    #[error("Invalid choice for field '{field}': {value}")]
    InvalidChoice {
        /// The field being written.
        field: String,
        /// The rejected value.
        value: String,
    },

    // ── Schema / configuration ───────────────────────────────────────

    /// The schema is structurally invalid.
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FormError {
    /// Returns a short machine-readable code for this error.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownField(_) => "unknown_field",
            Self::NotARepeater(_) => "not_a_repeater",
            Self::ItemOutOfRange { .. } => "item_out_of_range",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::InvalidChoice { .. } => "invalid_choice",
            Self::SchemaError(_) => "schema",
            Self::ConfigurationError(_) => "configuration",
            Self::SerializationError(_) => "serialization",
            Self::IoError(_) => "io",
        }
    }

    /// Returns `true` if the error was caused by the caller addressing the
    /// form incorrectly, as opposed to a broken schema or environment.
    pub const fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownField(_)
                | Self::NotARepeater(_)
                | Self::ItemOutOfRange { .. }
                | Self::TypeMismatch { .. }
                | Self::InvalidChoice { .. }
        )
    }
}

impl From<serde_json::Error> for FormError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// A convenience type alias for `Result<T, FormError>`.
pub type FormResult<T> = Result<T, FormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(FormError::UnknownField("x".into()).code(), "unknown_field");
        assert_eq!(FormError::NotARepeater("x".into()).code(), "not_a_repeater");
        assert_eq!(
            FormError::ItemOutOfRange {
                field: "phones".into(),
                index: 3,
                len: 1,
            }
            .code(),
            "item_out_of_range"
        );
        assert_eq!(
            FormError::TypeMismatch {
                field: "subscribe".into(),
                expected: "boolean",
            }
            .code(),
            "type_mismatch"
        );
        assert_eq!(FormError::SchemaError("x".into()).code(), "schema");
        assert_eq!(FormError::ConfigurationError("x".into()).code(), "configuration");
    }

    #[test]
    fn test_error_display() {
        let err = FormError::ItemOutOfRange {
            field: "phones".into(),
            index: 2,
            len: 1,
        };
        assert_eq!(
            err.to_string(),
            "Item 2 out of range for repeater 'phones' (1 items)"
        );
        assert_eq!(
            FormError::UnknownField("nope".into()).to_string(),
            "Unknown field: nope"
        );
    }

    #[test]
    fn test_caller_errors() {
        assert!(FormError::UnknownField("x".into()).is_caller_error());
        assert!(FormError::InvalidChoice {
            field: "subject".into(),
            value: "spam".into(),
        }
        .is_caller_error());
        assert!(!FormError::SchemaError("x".into()).is_caller_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: FormError = io_err.into();
        assert_eq!(err.code(), "io");
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: FormError = json_err.into();
        assert_eq!(err.code(), "serialization");
    }
}
