//! The form engine.
//!
//! [`FormEngine`] binds one [`FormSchema`] and owns the [`FormState`] for
//! it. It is driven by discrete events (a value change, a repeater edit, a
//! submit request) and never blocks the caller: every operation either
//! returns immediately or suspends on the validation pipeline.
//!
//! All operations take `&self`, so a view layer may start a new change
//! while an earlier validation is still in flight. Each validation carries
//! a generation token (see [`FormState`]); only the most recently started
//! validation of a key is allowed to write its result.
//!
//! # Examples
//!
//! ```
//! use formflow_core::EngineSettings;
//! use formflow_forms::catalog::SchemaCatalog;
//! use formflow_forms::form::FormEngine;
//!
//! # tokio_test::block_on(async {
//! let catalog = SchemaCatalog::builtin();
//! let schema = catalog.get("contact-form").unwrap().clone();
//! let engine = FormEngine::new(schema, EngineSettings::default());
//!
//! let error = engine.set_value("email", "not-an-email").await.unwrap();
//! assert_eq!(error.as_deref(), Some("Enter a valid email"));
//! assert!(!engine.submit().await.is_submitted());
//! # });
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use formflow_core::logging::form_span;
use formflow_core::{EngineSettings, FormError, FormResult};
use formflow_signals::Signal;

use crate::autosave::{AutosaveRecord, AutosaveScheduler, AutosaveStatus, AutosaveTarget};
use crate::bound_field::{self, BoundField};
use crate::condition;
use crate::fields::{FieldKind, FormField};
use crate::remote::{RemoteCheck, SimulatedRemoteCheck};
use crate::repeater;
use crate::schema::FormSchema;
use crate::state::FormState;
use crate::validation::{self, CHECK_UNAVAILABLE_MESSAGE};
use crate::value::{FieldValue, FormValues};
use crate::widgets::handler_for;

/// The payload handed to submit receivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Id of the submitted schema.
    pub schema_id: String,
    /// Version of the submitted schema.
    pub version: u32,
    /// Every current value, hidden fields included.
    pub values: FormValues,
}

/// The result of [`FormEngine::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Every visible field passed; the submission was emitted.
    Submitted(Submission),
    /// At least one visible field failed; nothing was emitted.
    Rejected(BTreeMap<String, String>),
}

impl SubmitOutcome {
    /// Returns `true` if the form was submitted.
    pub const fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }

    /// The collected errors of a rejected submit.
    pub const fn errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Rejected(errors) => Some(errors),
            Self::Submitted(_) => None,
        }
    }
}

/// State and sinks shared with the autosave task.
struct Shared {
    state: Mutex<FormState>,
    autosaved: Signal<AutosaveRecord>,
    status_changed: Signal<AutosaveStatus>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AutosaveTarget for Shared {
    fn set_status(&self, status: AutosaveStatus) {
        let changed = {
            let mut state = self.lock();
            let changed = state.autosave_status != status;
            state.autosave_status = status;
            changed
        };
        if changed {
            self.status_changed.send(&status);
        }
    }

    fn save(&self) {
        let record = AutosaveRecord {
            values: self.lock().values.clone(),
            saved_at: Utc::now(),
        };
        tracing::info!(fields = record.values.len(), "autosaved");
        self.autosaved.send(&record);
    }
}

/// One pending check of a submit pass.
struct Check {
    key: String,
    token: u64,
    field: FormField,
    value: Option<FieldValue>,
}

/// The in-flight validations of one operation.
///
/// Dropping it lowers every flag whose token is still current, so a
/// validation whose future is dropped before resolving does not leave its
/// key marked in flight.
struct InFlight<'a> {
    shared: &'a Shared,
    tokens: Vec<(String, u64)>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        for (key, token) in &self.tokens {
            state.settle_validation(key, *token);
        }
    }
}

/// A stateful form bound to one schema.
pub struct FormEngine {
    schema: FormSchema,
    settings: EngineSettings,
    remote: Arc<dyn RemoteCheck>,
    shared: Arc<Shared>,
    submitted: Signal<Submission>,
    autosave: AutosaveScheduler,
    span: tracing::Span,
}

impl FormEngine {
    /// Creates an engine bound to `schema` with freshly initialized state.
    ///
    /// `async` rules are answered by a [`SimulatedRemoteCheck`] built from
    /// `settings` until [`with_remote_check`](Self::with_remote_check)
    /// installs another one.
    pub fn new(schema: FormSchema, settings: EngineSettings) -> Self {
        let remote = Arc::new(SimulatedRemoteCheck::from_settings(&settings));
        let state = FormState::new(initial_values(&schema, settings.seed_repeater_items));
        let span = form_span(&schema.id, schema.version);
        tracing::info!(parent: &span, fields = schema.fields.len(), "form initialized");
        Self {
            autosave: AutosaveScheduler::from_settings(&settings),
            schema,
            settings,
            remote,
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                autosaved: Signal::new(),
                status_changed: Signal::new(),
            }),
            submitted: Signal::new(),
            span,
        }
    }

    /// Replaces the check used by `async` rules.
    #[must_use]
    pub fn with_remote_check(mut self, remote: Arc<dyn RemoteCheck>) -> Self {
        self.remote = remote;
        self
    }

    /// Binds a (possibly new) schema and resets all state.
    ///
    /// Values return to their per-kind defaults, errors and in-flight flags
    /// are cleared, and the autosave status returns to idle. A pending
    /// autosave is cancelled and no save is triggered. Connected receivers
    /// stay connected.
    pub fn initialize(&mut self, schema: FormSchema) {
        self.autosave.cancel();
        let values = initial_values(&schema, self.settings.seed_repeater_items);
        *self.shared.lock() = FormState::new(values);
        self.span = form_span(&schema.id, schema.version);
        tracing::info!(parent: &self.span, fields = schema.fields.len(), "form initialized");
        self.schema = schema;
    }

    /// The bound schema.
    pub const fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// The engine settings.
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Sets a top-level field's value and validates it.
    ///
    /// The value is stored at once, the field's in-flight flag is raised and
    /// its old error cleared. When the validation resolves its result is
    /// written back, unless a newer validation of the same field started in
    /// the meantime. Returns this validation's result either way.
    ///
    /// Fails with `UnknownField`, `TypeMismatch`, or `InvalidChoice` without
    /// touching state.
    pub async fn set_value(
        &self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> FormResult<Option<String>> {
        let value = value.into();
        let field = self.schema.require_field(name)?;
        handler_for(field.kind).accept(field, name, &value)?;

        let token = {
            let mut state = self.shared.lock();
            state.values.insert(name.to_string(), value.clone());
            state.begin_validation(name)
        };
        tracing::debug!(parent: &self.span, field = name, shape = value.shape(), "value changed");
        self.schedule_autosave();

        Ok(self.run_validation(field, name, Some(&value), token).await)
    }

    /// Sets one sub-field of one repeater item.
    ///
    /// With `validate_repeater_items` enabled the sub-field is validated
    /// under the key `"<field>-<index>-<sub>"`, following the same
    /// generation policy as [`set_value`](Self::set_value). Sub-fields hidden
    /// by a condition on their own item are not validated.
    pub async fn set_repeater_item_value(
        &self,
        name: &str,
        index: usize,
        sub_name: &str,
        value: impl Into<FieldValue>,
    ) -> FormResult<Option<String>> {
        let value = value.into();
        let field = self.repeater(name)?;
        let key = repeater::item_key(name, index, sub_name);
        let sub = field
            .sub_field_named(sub_name)
            .ok_or_else(|| FormError::UnknownField(key.clone()))?;
        handler_for(sub.kind).accept(sub, &key, &value)?;

        let token = {
            let mut state = self.shared.lock();
            let item = item_mut(&mut state.values, name, index)?;
            item.insert(sub_name.to_string(), value.clone());
            let visible = condition::is_visible(sub.condition.as_ref(), item);
            (self.settings.validate_repeater_items && visible)
                .then(|| state.begin_validation(&key))
        };
        tracing::debug!(parent: &self.span, field = %key, shape = value.shape(), "item value changed");
        self.schedule_autosave();

        match token {
            Some(token) => Ok(self.run_validation(sub, &key, Some(&value), token).await),
            None => Ok(None),
        }
    }

    /// Appends an empty item to a repeater and returns its index.
    pub fn add_repeater_item(&self, name: &str) -> FormResult<usize> {
        self.repeater(name)?;
        let index = {
            let mut state = self.shared.lock();
            let items = items_mut(&mut state.values, name)?;
            items.push(repeater::empty_item());
            items.len() - 1
        };
        tracing::debug!(parent: &self.span, field = name, index, "repeater item added");
        self.schedule_autosave();
        Ok(index)
    }

    /// Removes item `index` of a repeater and returns it.
    ///
    /// Later items keep their order and move down one index, together with
    /// their errors. Removing the only item leaves an empty list. In-flight
    /// sub-field validations of the repeater are discarded.
    pub fn remove_repeater_item(&self, name: &str, index: usize) -> FormResult<FormValues> {
        self.repeater(name)?;
        let removed = {
            let mut state = self.shared.lock();
            let items = items_mut(&mut state.values, name)?;
            if index >= items.len() {
                return Err(FormError::ItemOutOfRange {
                    field: name.to_string(),
                    index,
                    len: items.len(),
                });
            }
            let removed = items.remove(index);
            state.forget_item(name, index);
            removed
        };
        tracing::debug!(parent: &self.span, field = name, index, "repeater item removed");
        self.schedule_autosave();
        Ok(removed)
    }

    /// Validates every visible field and submits if all pass.
    ///
    /// The pass works on a snapshot of the values taken when it starts.
    /// Errors of keys outside the pass (hidden fields, removed items) are
    /// cleared at that point. Checks run concurrently and are all awaited
    /// before deciding. Each result is written back under the same
    /// generation policy as [`set_value`](Self::set_value), so a change made
    /// while the pass is running keeps its own, newer result.
    ///
    /// On success every snapshot value (hidden fields included) is sent to
    /// the submit receivers and the submission is returned. On failure the
    /// collected errors are returned and nothing is sent.
    pub async fn submit(&self) -> SubmitOutcome {
        let (values, checks) = {
            let mut state = self.shared.lock();
            let values = state.values.clone();
            let mut checks = self.submit_checks(&values);
            state.errors.clear();
            for check in &mut checks {
                check.token = state.begin_validation(&check.key);
            }
            (values, checks)
        };
        let _in_flight = InFlight {
            shared: &self.shared,
            tokens: checks.iter().map(|c| (c.key.clone(), c.token)).collect(),
        };

        let results = self.run_checks(checks).await;

        let mut errors = BTreeMap::new();
        let mut stale = 0_usize;
        {
            let mut state = self.shared.lock();
            for (key, token, result) in results {
                if !state.finish_validation(&key, token, result.clone()) {
                    stale += 1;
                }
                if let Some(message) = result {
                    errors.insert(key, message);
                }
            }
        }
        if stale > 0 {
            tracing::debug!(parent: &self.span, stale, "stale submit results discarded");
        }

        if !errors.is_empty() {
            tracing::debug!(parent: &self.span, errors = errors.len(), "submit rejected");
            return SubmitOutcome::Rejected(errors);
        }

        let submission = Submission {
            schema_id: self.schema.id.clone(),
            version: self.schema.version,
            values,
        };
        let receivers = self.submitted.send(&submission);
        tracing::info!(parent: &self.span, receivers, "form submitted");
        SubmitOutcome::Submitted(submission)
    }

    /// Binds every visible field for rendering, in schema order.
    pub fn render(&self) -> Vec<BoundField> {
        bound_field::bind_fields(&self.schema.fields, &self.shared.lock())
    }

    /// The top-level fields currently visible, in schema order.
    pub fn visible_fields(&self) -> Vec<&FormField> {
        let state = self.shared.lock();
        self.schema
            .fields
            .iter()
            .filter(|f| condition::is_visible(f.condition.as_ref(), &state.values))
            .collect()
    }

    /// A snapshot of the whole state.
    pub fn state(&self) -> FormState {
        self.shared.lock().clone()
    }

    /// A snapshot of the current values.
    pub fn values(&self) -> FormValues {
        self.shared.lock().values.clone()
    }

    /// The current value of a top-level field.
    pub fn value(&self, name: &str) -> Option<FieldValue> {
        self.shared.lock().values.get(name).cloned()
    }

    /// A snapshot of the current errors.
    pub fn errors(&self) -> BTreeMap<String, String> {
        self.shared.lock().errors.clone()
    }

    /// The current error for a key.
    pub fn error(&self, key: &str) -> Option<String> {
        self.shared.lock().error(key).map(str::to_string)
    }

    /// Returns `true` while a validation for `key` is in flight.
    pub fn is_validating(&self, key: &str) -> bool {
        self.shared.lock().is_validating(key)
    }

    /// The current autosave status.
    pub fn autosave_status(&self) -> AutosaveStatus {
        self.shared.lock().autosave_status
    }

    /// Connects a receiver for successful submissions.
    pub fn on_submit<F>(&self, receiver_id: impl Into<String>, receiver: F)
    where
        F: Fn(&Submission) + Send + Sync + 'static,
    {
        self.submitted.connect(receiver_id, Arc::new(receiver));
    }

    /// Connects a receiver for autosave writes.
    pub fn on_autosave<F>(&self, receiver_id: impl Into<String>, receiver: F)
    where
        F: Fn(&AutosaveRecord) + Send + Sync + 'static,
    {
        self.shared.autosaved.connect(receiver_id, Arc::new(receiver));
    }

    /// Connects a receiver for autosave status transitions.
    pub fn on_autosave_status<F>(&self, receiver_id: impl Into<String>, receiver: F)
    where
        F: Fn(&AutosaveStatus) + Send + Sync + 'static,
    {
        self.shared.status_changed.connect(receiver_id, Arc::new(receiver));
    }

    /// Cancels any pending autosave. Dropping the engine does the same.
    pub fn shutdown(&self) {
        self.autosave.cancel();
        tracing::debug!(parent: &self.span, "form shut down");
    }

    fn repeater(&self, name: &str) -> FormResult<&FormField> {
        let field = self.schema.require_field(name)?;
        if field.kind == FieldKind::Repeater {
            Ok(field)
        } else {
            Err(FormError::NotARepeater(name.to_string()))
        }
    }

    fn schedule_autosave(&self) {
        if self.settings.autosave {
            let target: Arc<dyn AutosaveTarget> = self.shared.clone();
            self.autosave.schedule(target);
        }
    }

    async fn run_validation(
        &self,
        field: &FormField,
        key: &str,
        value: Option<&FieldValue>,
        token: u64,
    ) -> Option<String> {
        let _in_flight = InFlight {
            shared: &self.shared,
            tokens: vec![(key.to_string(), token)],
        };
        let result = validation::validate(field, value, self.remote.as_ref()).await;
        let applied = self.shared.lock().finish_validation(key, token, result.clone());
        if !applied {
            tracing::debug!(parent: &self.span, field = key, token, "stale validation result discarded");
        }
        result
    }

    /// Collects the checks of a submit pass: every visible top-level field
    /// with rules, and (when enabled) every visible sub-field with rules of
    /// every item of every visible repeater.
    fn submit_checks(&self, values: &FormValues) -> Vec<Check> {
        let mut checks = Vec::new();
        for field in self.schema.visible_fields(values) {
            let value = values.get(&field.name);
            if !field.rules.is_empty() {
                checks.push(Check {
                    key: field.name.clone(),
                    token: 0,
                    field: field.clone(),
                    value: value.cloned(),
                });
            }
            if field.kind != FieldKind::Repeater || !self.settings.validate_repeater_items {
                continue;
            }
            let items = value.and_then(FieldValue::as_items).unwrap_or_default();
            for (index, item) in items.iter().enumerate() {
                for sub in field
                    .fields
                    .iter()
                    .filter(|s| !s.rules.is_empty())
                    .filter(|s| condition::is_visible(s.condition.as_ref(), item))
                {
                    checks.push(Check {
                        key: repeater::item_key(&field.name, index, &sub.name),
                        token: 0,
                        field: sub.clone(),
                        value: item.get(&sub.name).cloned(),
                    });
                }
            }
        }
        checks
    }

    /// Runs checks concurrently on the current runtime, or one after the
    /// other when there is none.
    async fn run_checks(&self, checks: Vec<Check>) -> Vec<(String, u64, Option<String>)> {
        let mut results = Vec::with_capacity(checks.len());

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            for check in checks {
                let result =
                    validation::validate(&check.field, check.value.as_ref(), self.remote.as_ref()).await;
                results.push((check.key, check.token, result));
            }
            return results;
        };

        let handles: Vec<_> = checks
            .into_iter()
            .map(|check| {
                let remote = Arc::clone(&self.remote);
                let (key, token) = (check.key.clone(), check.token);
                let handle = runtime.spawn(async move {
                    validation::validate(&check.field, check.value.as_ref(), remote.as_ref()).await
                });
                (key, token, handle)
            })
            .collect();

        for (key, token, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(parent: &self.span, field = %key, error = %e, "validation task failed");
                    Some(CHECK_UNAVAILABLE_MESSAGE.to_string())
                }
            };
            results.push((key, token, result));
        }
        results
    }
}

impl fmt::Debug for FormEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormEngine")
            .field("schema", &self.schema.id)
            .field("version", &self.schema.version)
            .field("remote", &self.remote)
            .field("autosave", &self.autosave)
            .finish_non_exhaustive()
    }
}

/// Default values for a freshly bound schema.
fn initial_values(schema: &FormSchema, seed_items: usize) -> FormValues {
    schema
        .fields
        .iter()
        .map(|f| (f.name.clone(), handler_for(f.kind).default_value(seed_items)))
        .collect()
}

fn items_mut<'a>(values: &'a mut FormValues, name: &str) -> FormResult<&'a mut Vec<FormValues>> {
    values
        .get_mut(name)
        .and_then(FieldValue::as_items_mut)
        .ok_or_else(|| FormError::NotARepeater(name.to_string()))
}

fn item_mut<'a>(values: &'a mut FormValues, name: &str, index: usize) -> FormResult<&'a mut FormValues> {
    let items = items_mut(values, name)?;
    let len = items.len();
    items.get_mut(index).ok_or_else(|| FormError::ItemOutOfRange {
        field: name.to_string(),
        index,
        len,
    })
}
