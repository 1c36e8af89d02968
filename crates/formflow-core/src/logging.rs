//! Logging integration for formflow.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`EngineSettings`](crate::settings::EngineSettings) and for creating
//! per-form spans.

use crate::settings::EngineSettings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level` (e.g. "debug",
/// "formflow_forms=trace"). In debug mode a pretty, human-readable format is
/// used; otherwise a structured JSON format is used. Installing a second
/// subscriber is a silent no-op.
pub fn setup_logging(settings: &EngineSettings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for a bound form.
///
/// # Examples
///
/// ```
/// use formflow_core::logging::form_span;
///
/// let span = form_span("contact-form", 1);
/// let _guard = span.enter();
/// tracing::info!("form bound");
/// ```
pub fn form_span(schema_id: &str, version: u32) -> tracing::Span {
    tracing::info_span!("form", id = schema_id, version)
}
