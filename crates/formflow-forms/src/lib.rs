//! # formflow-forms
//!
//! The schema-driven form engine. A [`schema::FormSchema`] describes the
//! fields of a form; a [`form::FormEngine`] binds one schema, holds its
//! values, errors, and in-flight flags, runs the validation pipeline on
//! every change, and submits when every visible field passes.
//!
//! - [`value`]: the discriminated field value type.
//! - [`fields`], [`condition`], [`validation`], [`schema`]: the schema model.
//! - [`widgets`]: one handler per field kind.
//! - [`remote`]: the seam behind `async` rules.
//! - [`state`], [`repeater`], [`autosave`], [`form`]: the stateful engine.
//! - [`bound_field`]: the render model handed to a view layer.
//! - [`catalog`]: a registry of named schemas.

pub mod autosave;
pub mod bound_field;
pub mod catalog;
pub mod condition;
pub mod fields;
pub mod form;
pub mod remote;
pub mod repeater;
pub mod schema;
pub mod state;
pub mod validation;
pub mod value;
pub mod widgets;

pub use form::{FormEngine, Submission, SubmitOutcome};
pub use schema::FormSchema;
pub use value::{FieldValue, FormValues};
