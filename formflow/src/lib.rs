//! # formflow
//!
//! Schema-driven forms for Rust.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `formflow` to get the whole engine, or depend on
//! individual crates for finer-grained control.
//!
//! ```
//! use formflow::core::EngineSettings;
//! use formflow::forms::catalog::SchemaCatalog;
//! use formflow::forms::FormEngine;
//!
//! let schema = SchemaCatalog::builtin().get("repeater-form").unwrap().clone();
//! let engine = FormEngine::new(schema, EngineSettings::default());
//! engine.add_repeater_item("phones").unwrap();
//! assert_eq!(engine.render()[1].items.len(), 2);
//! ```

/// Error types, engine settings, settings loading, and logging.
pub use formflow_core as core;

/// The form engine: schemas, validation, repeaters, autosave, rendering.
#[cfg(feature = "forms")]
pub use formflow_forms as forms;

/// Signal dispatcher for submit and autosave notifications.
#[cfg(feature = "signals")]
pub use formflow_signals as signals;

/// Third-party crates the public API is built on.
pub use {async_trait, chrono, serde, serde_json, tokio, tracing, tracing_subscriber};
