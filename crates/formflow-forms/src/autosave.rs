//! Debounced autosave.
//!
//! Status moves `idle -> saving -> saved -> idle`. On every tracked change
//! the status becomes `saving` at once and a single background task is
//! (re)started: it sleeps for the debounce delay, performs the save and
//! reports `saved`, then sleeps for the reset delay and reports `idle`.
//! A newer change aborts the whole pending task, so a burst of changes
//! produces exactly one save and a stale reset can never overwrite a newer
//! `saving`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use formflow_core::EngineSettings;

use crate::value::FormValues;

/// Where the autosave cycle currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutosaveStatus {
    /// Nothing pending.
    #[default]
    Idle,
    /// A change is waiting for the debounce delay to elapse.
    Saving,
    /// The latest change was saved.
    Saved,
}

impl fmt::Display for AutosaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Saving => "saving",
            Self::Saved => "saved",
        };
        f.write_str(s)
    }
}

/// The payload of one autosave write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutosaveRecord {
    /// The full value mapping at save time.
    pub values: FormValues,
    /// When the save happened.
    pub saved_at: DateTime<Utc>,
}

/// What the scheduler drives: the owner of the status and of the values.
pub(crate) trait AutosaveTarget: Send + Sync + 'static {
    /// Records a status transition.
    fn set_status(&self, status: AutosaveStatus);

    /// Performs the save of the current values.
    fn save(&self);
}

/// Owns the single pending autosave task of one engine.
pub struct AutosaveScheduler {
    debounce: Duration,
    reset: Duration,
    epoch: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl AutosaveScheduler {
    /// Creates a scheduler with explicit delays.
    pub fn new(debounce: Duration, reset: Duration) -> Self {
        Self {
            debounce,
            reset,
            epoch: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    /// Creates a scheduler with the delays from `settings`.
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(settings.autosave_debounce(), settings.autosave_reset())
    }

    /// Returns `true` while a save or reset is pending.
    pub fn is_pending(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Restarts the autosave cycle for `target`.
    ///
    /// Requires a tokio runtime; without one nothing is scheduled.
    pub(crate) fn schedule(&self, target: Arc<dyn AutosaveTarget>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no tokio runtime available, autosave skipped");
            return;
        };

        let mine = {
            let mut pending = self.lock();
            if let Some(task) = pending.take() {
                task.abort();
            }
            let mine = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

            let epoch = Arc::clone(&self.epoch);
            let (debounce, reset) = (self.debounce, self.reset);
            let current = move || epoch.load(Ordering::SeqCst) == mine;
            let task_target = Arc::clone(&target);

            *pending = Some(runtime.spawn(async move {
                tokio::time::sleep(debounce).await;
                if !current() {
                    return;
                }
                task_target.save();
                task_target.set_status(AutosaveStatus::Saved);

                tokio::time::sleep(reset).await;
                if current() {
                    task_target.set_status(AutosaveStatus::Idle);
                }
            }));
            mine
        };

        // Status receivers may call back into the engine, so the pending
        // lock must be released first.
        if self.epoch.load(Ordering::SeqCst) == mine {
            target.set_status(AutosaveStatus::Saving);
        }
    }

    /// Aborts the pending task, if any. The status is left where it is.
    pub fn cancel(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.lock().take() {
            task.abort();
            tracing::debug!("pending autosave cancelled");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for AutosaveScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutosaveScheduler")
            .field("debounce", &self.debounce)
            .field("reset", &self.reset)
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl Drop for AutosaveScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
