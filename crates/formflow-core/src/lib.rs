//! # formflow-core
//!
//! Core types for the formflow form engine. This crate has no engine
//! dependencies and provides the foundation for the other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and result alias
//! - [`settings`] - Per-engine configuration
//! - [`settings_loader`] - TOML/JSON/env loading of settings
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{FormError, FormResult};
pub use settings::EngineSettings;
