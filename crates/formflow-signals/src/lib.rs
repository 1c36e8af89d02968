//! # formflow-signals
//!
//! A small synchronous signal dispatcher. The form engine uses signals to
//! hand submitted values to the embedding application, to publish autosave
//! writes, and to report autosave status transitions, without the engine
//! knowing who is listening.
//!
//! ## Usage
//!
//! ```
//! use formflow_signals::Signal;
//! use std::sync::Arc;
//!
//! let submitted: Signal<String> = Signal::new();
//!
//! submitted.connect("printer", Arc::new(|payload: &String| {
//!     println!("submitted: {payload}");
//! }));
//!
//! assert_eq!(submitted.send(&"{}".to_string()), 1);
//! ```

use std::sync::{Arc, PoisonError, RwLock};

/// The type signature for a signal receiver callback.
///
/// Receivers must be `Send + Sync` so that signals can be dispatched from
/// background tasks (autosave timers fire on the tokio runtime).
pub type SignalReceiver<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A signal that can be connected to and dispatched.
///
/// Each signal carries a payload type `T`. Receivers are called in the order
/// they were connected.
pub struct Signal<T: 'static> {
    receivers: RwLock<Vec<(String, SignalReceiver<T>)>>,
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("receivers", &self.receiver_ids())
            .finish()
    }
}

impl<T: 'static> Signal<T> {
    /// Creates a new signal with no connected receivers.
    pub fn new() -> Self {
        Self {
            receivers: RwLock::new(Vec::new()),
        }
    }

    /// Connects a receiver to this signal.
    ///
    /// The `receiver_id` is used to identify the receiver for later disconnection.
    /// If a receiver with the same ID is already connected, it is replaced in place.
    pub fn connect(&self, receiver_id: impl Into<String>, callback: SignalReceiver<T>) {
        let id = receiver_id.into();
        let mut receivers = self
            .receivers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = receivers.iter_mut().find(|(rid, _)| *rid == id) {
            entry.1 = callback;
        } else {
            receivers.push((id, callback));
        }
    }

    /// Disconnects the receiver with the given ID.
    ///
    /// Returns `true` if a receiver was found and removed.
    pub fn disconnect(&self, receiver_id: &str) -> bool {
        let mut receivers = self
            .receivers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let len_before = receivers.len();
        receivers.retain(|(id, _)| id != receiver_id);
        receivers.len() < len_before
    }

    /// Removes every receiver.
    pub fn disconnect_all(&self) {
        self.receivers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Sends the signal to all connected receivers and returns how many ran.
    ///
    /// The receiver list is snapshotted before dispatch, so a receiver may
    /// connect or disconnect receivers (including itself) without deadlocking.
    pub fn send(&self, payload: &T) -> usize {
        let snapshot: Vec<SignalReceiver<T>> = self
            .receivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        tracing::trace!(receivers = snapshot.len(), "dispatching signal");
        for callback in &snapshot {
            callback(payload);
        }
        snapshot.len()
    }

    /// Returns the number of connected receivers.
    pub fn receiver_count(&self) -> usize {
        self.receivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns the IDs of connected receivers in dispatch order.
    pub fn receiver_ids(&self) -> Vec<String> {
        self.receivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}
