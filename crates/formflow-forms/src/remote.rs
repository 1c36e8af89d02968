//! The remote-check seam behind `async` validation rules.
//!
//! An `async` rule names an opaque endpoint. The engine hands the endpoint
//! and the value to a [`RemoteCheck`] and suspends until it answers. The
//! bundled [`SimulatedRemoteCheck`] performs no I/O: it sleeps for a fixed
//! latency and rejects a configured set of reserved values. A production
//! deployment plugs in a real network client behind the same trait.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use formflow_core::{EngineSettings, FormResult};

/// A (possibly remote) acceptance check for a single value.
///
/// Implementations must be `Send + Sync`: submit-time validation runs the
/// checks of several fields concurrently on the tokio runtime.
#[async_trait]
pub trait RemoteCheck: Send + Sync + fmt::Debug {
    /// Returns `Ok(true)` if `endpoint` accepts `value`, `Ok(false)` if it
    /// rejects it, and `Err` if the check could not be performed.
    async fn check(&self, endpoint: &str, value: &str) -> FormResult<bool>;
}

/// A local stand-in for a remote uniqueness check.
#[derive(Debug, Clone)]
pub struct SimulatedRemoteCheck {
    delay: Duration,
    reserved: Vec<String>,
}

impl SimulatedRemoteCheck {
    /// Creates a check with the given latency and reserved values.
    pub fn new(delay: Duration, reserved: Vec<String>) -> Self {
        Self {
            delay,
            reserved: reserved.into_iter().map(|r| r.to_lowercase()).collect(),
        }
    }

    /// Builds the check from engine settings.
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(settings.async_check_delay(), settings.reserved_values.clone())
    }

    /// The simulated round-trip latency.
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for SimulatedRemoteCheck {
    fn default() -> Self {
        Self::from_settings(&EngineSettings::default())
    }
}

#[async_trait]
impl RemoteCheck for SimulatedRemoteCheck {
    async fn check(&self, endpoint: &str, value: &str) -> FormResult<bool> {
        tracing::trace!(endpoint, delay = ?self.delay, "simulated remote check");
        tokio::time::sleep(self.delay).await;
        let lowered = value.to_lowercase();
        Ok(!self.reserved.iter().any(|r| *r == lowered))
    }
}
