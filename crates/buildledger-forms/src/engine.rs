//! Form engine
//!
//! A [`FormHandle`] owns one form's data bag, its error map and the queue of
//! touched batches awaiting validation. Handles are cheap to clone and are
//! passed explicitly to every input that reads or writes the form.
//!
//! Updates never validate inline. Each [`FormHandle::update_fields`] call
//! enqueues the names it touched as one batch; the caller drains batches
//! oldest first with [`FormHandle::process_next_batch`] (one per commit) or
//! [`FormHandle::flush`].
//!
//! The state lock is never held while rules run. Every write bumps the
//! field's revision; a pass records revisions before evaluating and drops
//! any result whose field was written in the meantime.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::{FormConfig, ValidationTrigger};
use crate::error::Result;
use crate::metrics::{FormMetrics, PassScope};
use crate::schema::FormSchema;
use crate::submit::{SubmitHandler, SubmitOutcome};
use crate::validation::{self, ValidationOutcome};
use crate::value::{ErrorMap, FieldChange, FieldValue, FormData};

/// Full passes `submit` runs before giving up on a form that keeps changing
const SUBMIT_PASSES: usize = 3;

/// Callback receiving the full data snapshot after every update
pub type ChangeCallback = Arc<dyn Fn(&FormData) + Send + Sync>;

#[derive(Debug, Default)]
struct FormState {
    data: FormData,
    errors: ErrorMap,
    batches: VecDeque<Vec<String>>,
    revisions: HashMap<String, u64>,
    /// Fields with an async check in flight, keyed to the revision checked
    pending: HashMap<String, u64>,
}

impl FormState {
    fn revision(&self, name: &str) -> u64 {
        self.revisions.get(name).copied().unwrap_or(0)
    }

    fn bump(&mut self, name: &str) {
        *self.revisions.entry(name.to_string()).or_insert(0) += 1;
    }

    fn replace_data(&mut self, data: FormData) {
        let names: Vec<String> = self.data.keys().chain(data.keys()).cloned().collect();
        for name in names {
            self.bump(&name);
        }
        self.data = data;
    }
}

/// Data and revisions captured at the start of a validation pass
struct PassSnapshot {
    data: FormData,
    targets: Vec<(String, u64)>,
}

/// Outcome of a full pass together with the data it checked
struct FullPass {
    outcome: ValidationOutcome,
    data: FormData,
    stale: usize,
}

/// Per-field result of a pass
struct FieldResult {
    name: String,
    revision: u64,
    message: Option<String>,
}

struct FormInner {
    schema: FormSchema,
    config: FormConfig,
    state: Mutex<FormState>,
    on_change: Option<ChangeCallback>,
    submit_handler: Option<Arc<dyn SubmitHandler>>,
    metrics: Option<Arc<FormMetrics>>,
}

/// Shared handle to one form
#[derive(Clone)]
pub struct FormHandle {
    inner: Arc<FormInner>,
}

/// Builder for [`FormHandle`]
pub struct FormBuilder {
    schema: FormSchema,
    config: FormConfig,
    initial: FormData,
    on_change: Option<ChangeCallback>,
    submit_handler: Option<Arc<dyn SubmitHandler>>,
    metrics: Option<Arc<FormMetrics>>,
}

impl FormBuilder {
    pub fn config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed data; missing fields read as `Null` until the user fills them
    pub fn initial_data(mut self, data: FormData) -> Self {
        self.initial = data;
        self
    }

    pub fn on_change(mut self, callback: impl Fn(&FormData) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Arc::new(callback));
        self
    }

    pub fn on_submit(mut self, handler: impl SubmitHandler + 'static) -> Self {
        self.submit_handler = Some(Arc::new(handler));
        self
    }

    pub fn submit_handler(mut self, handler: Arc<dyn SubmitHandler>) -> Self {
        self.submit_handler = Some(handler);
        self
    }

    pub fn metrics(mut self, metrics: Arc<FormMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> FormHandle {
        let state = FormState {
            data: self.initial,
            ..FormState::default()
        };

        FormHandle {
            inner: Arc::new(FormInner {
                schema: self.schema,
                config: self.config,
                state: Mutex::new(state),
                on_change: self.on_change,
                submit_handler: self.submit_handler,
                metrics: self.metrics,
            }),
        }
    }
}

impl FormHandle {
    pub fn new(schema: FormSchema, config: FormConfig) -> Self {
        Self::builder(schema).config(config).build()
    }

    pub fn builder(schema: FormSchema) -> FormBuilder {
        FormBuilder {
            schema,
            config: FormConfig::default(),
            initial: FormData::new(),
            on_change: None,
            submit_handler: None,
            metrics: None,
        }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.inner.schema
    }

    pub fn config(&self) -> &FormConfig {
        &self.inner.config
    }

    /// Replace the data bag. Errors and queued batches are kept; in-flight
    /// results for replaced fields become stale.
    pub async fn initialize(&self, data: FormData) {
        self.inner.state.lock().await.replace_data(data);
    }

    /// Replace the data bag and drop errors, queued batches and pending checks
    pub async fn reset(&self, data: FormData) {
        let mut state = self.inner.state.lock().await;
        state.replace_data(data);
        state.errors.clear();
        state.batches.clear();
        state.pending.clear();
    }

    /// Merge changes into the data bag and enqueue their names as one batch
    ///
    /// The last write per name wins. The on-change callback receives the
    /// full data snapshot after the merge.
    pub async fn update_fields<I>(&self, changes: I)
    where
        I: IntoIterator<Item = FieldChange>,
    {
        let snapshot = {
            let mut state = self.inner.state.lock().await;
            let mut touched: Vec<String> = Vec::new();

            for change in changes {
                state.bump(&change.name);
                if !touched.contains(&change.name) {
                    touched.push(change.name.clone());
                }
                state.data.set(change.name, change.value);
            }

            if touched.is_empty() {
                return;
            }

            debug!(fields = ?touched, queued = state.batches.len() + 1, "fields updated");
            state.batches.push_back(touched);
            self.inner.on_change.as_ref().map(|_| state.data.clone())
        };

        if let (Some(callback), Some(data)) = (&self.inner.on_change, snapshot) {
            callback(&data);
        }
    }

    pub async fn update_field(&self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.update_fields([FieldChange::new(name, value)]).await;
    }

    /// Validate the oldest queued batch under the on-change trigger
    ///
    /// Returns `None` when the queue is empty or the trigger selected nothing.
    pub async fn process_next_batch(&self) -> Result<Option<ValidationOutcome>> {
        let batch = self.inner.state.lock().await.batches.pop_front();
        match batch {
            Some(touched) => self.run_trigger(&self.inner.config.validate_on_change, &touched).await,
            None => Ok(None),
        }
    }

    /// Drain every queued batch in order
    pub async fn flush(&self) -> Result<Vec<ValidationOutcome>> {
        let mut outcomes = Vec::new();
        loop {
            let batch = self.inner.state.lock().await.batches.pop_front();
            let Some(touched) = batch else {
                break;
            };
            if let Some(outcome) = self.run_trigger(&self.inner.config.validate_on_change, &touched).await? {
                outcomes.push(outcome);
            }
        }
        Ok(outcomes)
    }

    /// Apply the on-blur trigger to a single field
    pub async fn handle_field_blur(&self, name: &str) -> Result<Option<ValidationOutcome>> {
        self.run_trigger(&self.inner.config.validate_on_blur, &[name.to_string()])
            .await
    }

    async fn run_trigger(
        &self,
        trigger: &ValidationTrigger,
        touched: &[String],
    ) -> Result<Option<ValidationOutcome>> {
        match trigger.select(touched) {
            None => self.validate_all(None).await.map(Some),
            Some(selected) if selected.is_empty() => Ok(None),
            Some(selected) => self.validate_fields(&selected).await.map(Some),
        }
    }

    /// Validate the full bag and hand it to the submit handler when valid
    ///
    /// The handler receives exactly the snapshot that passed validation. A
    /// pass in which any field changed mid-check is repeated; if the form
    /// keeps changing the submit is blocked. Data is left as is afterwards.
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        let mut attempt = 1;
        let pass = loop {
            let pass = self.full_pass(&self.inner.schema).await?;
            if pass.stale == 0 || attempt == SUBMIT_PASSES {
                break pass;
            }
            debug!(attempt, stale = pass.stale, "data changed during submit validation, re-running");
            attempt += 1;
        };

        if !pass.outcome.is_valid {
            debug!(
                errors = pass.outcome.errors.len(),
                stale = pass.stale,
                "submit blocked by validation"
            );
            self.record_submission("blocked");
            return Ok(SubmitOutcome::Blocked {
                errors: pass.outcome.errors,
            });
        }

        let record = match &self.inner.submit_handler {
            Some(handler) => match handler.submit(pass.data).await {
                Ok(record) => record,
                Err(e) => {
                    self.record_submission("failed");
                    return Err(e);
                }
            },
            None => None,
        };

        info!(stored = record.is_some(), "form submitted");
        self.record_submission("submitted");
        Ok(SubmitOutcome::Submitted { record })
    }

    /// Validate every field of the active schema (or `schema_override`)
    ///
    /// The override, when given, is the declaring schema for this pass: its
    /// fields are the ones checked and the only keys left in the error map.
    /// The error map is replaced with exactly the errors found. A field whose
    /// value changed during the pass keeps its previous entry and makes the
    /// outcome invalid, since its current value was not checked.
    pub async fn validate_all(&self, schema_override: Option<&FormSchema>) -> Result<ValidationOutcome> {
        let schema = schema_override.unwrap_or(&self.inner.schema);
        Ok(self.full_pass(schema).await?.outcome)
    }

    async fn full_pass(&self, schema: &FormSchema) -> Result<FullPass> {
        let names: Vec<String> = schema.field_names().cloned().collect();

        let snapshot = self.begin_pass(schema, names).await;
        let results = self.evaluate(schema, &snapshot).await?;

        let mut state = self.inner.state.lock().await;
        let mut next = ErrorMap::new();
        let mut stale = 0;
        for result in results {
            if self.settle(&mut state, &result) {
                if let Some(message) = result.message {
                    self.record_field_error(&result.name);
                    next.insert(result.name, message);
                }
            } else {
                stale += 1;
                if let Some(previous) = state.errors.get(&result.name) {
                    next.insert(result.name.clone(), previous.clone());
                }
            }
        }
        state.errors = next;

        let outcome = ValidationOutcome {
            is_valid: stale == 0 && state.errors.is_empty(),
            errors: state.errors.clone(),
        };
        debug!(valid = outcome.is_valid, errors = outcome.errors.len(), stale, "full validation pass");
        self.record_pass(PassScope::All, outcome.is_valid);

        Ok(FullPass {
            outcome,
            data: snapshot.data,
            stale,
        })
    }

    /// Validate the named fields plus their configured related fields
    ///
    /// Names the schema does not declare are skipped. Errors of other fields
    /// are left untouched; `is_valid` covers only the checked fields and is
    /// false when any of them changed before its result came back.
    pub async fn validate_fields<S: AsRef<str>>(&self, names: &[S]) -> Result<ValidationOutcome> {
        let schema = &self.inner.schema;
        let targets = self.expand_targets(names);

        let snapshot = self.begin_pass(schema, targets).await;
        let results = self.evaluate(schema, &snapshot).await?;

        let mut state = self.inner.state.lock().await;
        let mut is_valid = true;
        for result in results {
            if !self.settle(&mut state, &result) {
                is_valid = false;
                continue;
            }
            match result.message {
                Some(message) => {
                    is_valid = false;
                    self.record_field_error(&result.name);
                    state.errors.insert(result.name, message);
                }
                None => {
                    state.errors.remove(&result.name);
                }
            }
        }

        let outcome = ValidationOutcome {
            is_valid,
            errors: state.errors.clone(),
        };
        debug!(
            fields = snapshot.targets.len(),
            valid = is_valid,
            "partial validation pass"
        );
        self.record_pass(PassScope::Fields, is_valid);
        Ok(outcome)
    }

    fn expand_targets<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let schema = &self.inner.schema;
        let mut targets: Vec<String> = Vec::new();

        for name in names {
            let name = name.as_ref();
            let related = self.inner.config.related_fields(name).iter().map(String::as_str);
            for candidate in std::iter::once(name).chain(related) {
                if schema.declares(candidate) && !targets.iter().any(|t| t == candidate) {
                    targets.push(candidate.to_string());
                }
            }
        }
        targets
    }

    async fn begin_pass(&self, schema: &FormSchema, names: Vec<String>) -> PassSnapshot {
        let mut state = self.inner.state.lock().await;
        let targets: Vec<(String, u64)> = names
            .into_iter()
            .map(|name| {
                let revision = state.revision(&name);
                (name, revision)
            })
            .collect();

        for (name, revision) in &targets {
            if schema.is_async_field(name) {
                state.pending.insert(name.clone(), *revision);
            }
        }

        PassSnapshot {
            data: state.data.clone(),
            targets,
        }
    }

    async fn evaluate(&self, schema: &FormSchema, snapshot: &PassSnapshot) -> Result<Vec<FieldResult>> {
        let mut results = Vec::with_capacity(snapshot.targets.len());

        for (name, revision) in &snapshot.targets {
            match validation::validate_field(&snapshot.data, schema, name).await {
                Ok(message) => results.push(FieldResult {
                    name: name.clone(),
                    revision: *revision,
                    message,
                }),
                Err(e) => {
                    let mut state = self.inner.state.lock().await;
                    for (name, revision) in &snapshot.targets {
                        if state.pending.get(name) == Some(revision) {
                            state.pending.remove(name);
                        }
                    }
                    return Err(e);
                }
            }
        }

        Ok(results)
    }

    /// Clear the pending marker and report whether the result is still current
    fn settle(&self, state: &mut FormState, result: &FieldResult) -> bool {
        if state.pending.get(&result.name) == Some(&result.revision) {
            state.pending.remove(&result.name);
        }

        if state.revision(&result.name) == result.revision {
            return true;
        }

        debug!(field = %result.name, "discarding stale validation result");
        if let Some(metrics) = &self.inner.metrics {
            metrics.record_stale();
        }
        false
    }

    fn record_pass(&self, scope: PassScope, valid: bool) {
        if let Some(metrics) = &self.inner.metrics {
            metrics.record_pass(scope, valid);
        }
    }

    fn record_field_error(&self, field: &str) {
        if let Some(metrics) = &self.inner.metrics {
            metrics.record_field_error(field);
        }
    }

    fn record_submission(&self, outcome: &str) {
        if let Some(metrics) = &self.inner.metrics {
            metrics.record_submission(outcome);
        }
    }

    pub async fn data(&self) -> FormData {
        self.inner.state.lock().await.data.clone()
    }

    pub async fn value(&self, name: &str) -> FieldValue {
        self.inner.state.lock().await.data.get(name).clone()
    }

    pub async fn errors(&self) -> ErrorMap {
        self.inner.state.lock().await.errors.clone()
    }

    pub async fn error(&self, name: &str) -> Option<String> {
        self.inner.state.lock().await.errors.get(name).cloned()
    }

    /// Whether an async check for the field is in flight
    pub async fn is_pending(&self, name: &str) -> bool {
        self.inner.state.lock().await.pending.contains_key(name)
    }

    /// Number of touched batches not yet validated
    pub async fn pending_batches(&self) -> usize {
        self.inner.state.lock().await.batches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldRule;
    use std::sync::Mutex as StdMutex;

    fn login_schema() -> FormSchema {
        FormSchema::new()
            .field(
                "id",
                vec![FieldRule::group_required(["id", "email"])],
            )
            .field(
                "email",
                vec![FieldRule::group_required(["id", "email"]), FieldRule::email()],
            )
            .field("password", vec![FieldRule::required()])
    }

    fn login_config() -> FormConfig {
        FormConfig::builder()
            .field_group("email", ["id"])
            .field_group("id", ["email"])
            .build()
    }

    #[tokio::test]
    async fn test_update_merges_last_write_wins() {
        let form = FormHandle::new(login_schema(), FormConfig::default());
        form.update_fields([
            FieldChange::new("email", "first@obra.com"),
            FieldChange::new("password", "x"),
            FieldChange::new("email", "second@obra.com"),
        ])
        .await;

        assert_eq!(form.value("email").await, FieldValue::from("second@obra.com"));
        assert_eq!(form.pending_batches().await, 1);
    }

    #[tokio::test]
    async fn test_empty_update_enqueues_nothing() {
        let form = FormHandle::new(login_schema(), FormConfig::default());
        form.update_fields(Vec::new()).await;
        assert_eq!(form.pending_batches().await, 0);
    }

    #[tokio::test]
    async fn test_on_change_receives_full_snapshot() {
        let seen: Arc<StdMutex<Vec<FormData>>> = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        let form = FormHandle::builder(login_schema())
            .initial_data(FormData::new().with("password", "secret"))
            .on_change(move |data| sink.lock().unwrap().push(data.clone()))
            .build();

        form.update_field("email", "ana@obra.com").await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].get("password"), &FieldValue::from("secret"));
        assert_eq!(seen[0].get("email"), &FieldValue::from("ana@obra.com"));
    }

    #[tokio::test]
    async fn test_batches_validated_in_order_against_own_fields() {
        let form = FormHandle::new(login_schema(), FormConfig::default());
        form.update_field("password", "").await;
        form.update_field("email", "not-an-email").await;

        let first = form.process_next_batch().await.unwrap().unwrap();
        assert!(!first.is_valid);
        assert!(first.errors.contains_key("password"));
        assert!(!first.errors.contains_key("email"));

        let second = form.process_next_batch().await.unwrap().unwrap();
        assert!(!second.is_valid);
        assert_eq!(second.errors.get("email").map(String::as_str), Some("validation.email"));
        assert!(second.errors.contains_key("password"));

        assert!(form.process_next_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_related_fields_revalidated() {
        let form = FormHandle::new(login_schema(), login_config());
        form.update_fields([FieldChange::new("id", ""), FieldChange::new("email", "")])
            .await;
        form.flush().await.unwrap();
        assert!(form.error("id").await.is_some());
        assert!(form.error("email").await.is_some());

        // filling email clears the group error on id as well
        form.update_field("email", "ana@obra.com").await;
        let outcome = form.process_next_batch().await.unwrap().unwrap();
        assert!(outcome.is_valid);
        assert!(form.error("id").await.is_none());
        assert!(form.error("email").await.is_none());
    }

    #[tokio::test]
    async fn test_validate_fields_leaves_other_errors() {
        let form = FormHandle::new(login_schema(), login_config());
        form.validate_all(None).await.unwrap();
        assert!(form.error("password").await.is_some());

        form.update_field("email", "ana@obra.com").await;
        let outcome = form.validate_fields(&["email"]).await.unwrap();

        assert!(outcome.is_valid);
        assert!(form.error("id").await.is_none());
        assert_eq!(form.error("password").await.as_deref(), Some("validation.required"));
    }

    #[tokio::test]
    async fn test_validate_fields_skips_undeclared() {
        let form = FormHandle::new(login_schema(), FormConfig::default());
        let outcome = form.validate_fields(&["nickname"]).await.unwrap();
        assert!(outcome.is_valid);
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn test_validate_all_clears_fixed_fields() {
        let form = FormHandle::new(login_schema(), FormConfig::default());
        let outcome = form.validate_all(None).await.unwrap();
        assert_eq!(outcome.errors.len(), 3);

        form.update_fields([
            FieldChange::new("id", "EMP-7"),
            FieldChange::new("password", "secret"),
        ])
        .await;
        let outcome = form.validate_all(None).await.unwrap();
        assert!(outcome.is_valid);
        assert!(form.errors().await.is_empty());
    }

    #[tokio::test]
    async fn test_validate_all_with_override() {
        let form = FormHandle::new(login_schema(), FormConfig::default());
        form.validate_all(None).await.unwrap();

        let reduced = FormSchema::new().field("password", vec![FieldRule::required()]);
        let outcome = form.validate_all(Some(&reduced)).await.unwrap();

        assert_eq!(outcome.errors.keys().collect::<Vec<_>>(), vec!["password"]);
        assert_eq!(form.errors().await, outcome.errors);
    }

    #[tokio::test]
    async fn test_override_declares_fields_for_its_pass() {
        let form = FormHandle::new(login_schema(), FormConfig::default());

        let extended = FormSchema::new().field("phone", vec![FieldRule::required()]);
        let outcome = form.validate_all(Some(&extended)).await.unwrap();
        assert_eq!(outcome.errors.keys().collect::<Vec<_>>(), vec!["phone"]);

        let outcome = form.validate_all(None).await.unwrap();
        assert!(!outcome.errors.contains_key("phone"));
        assert!(outcome.errors.contains_key("password"));
    }

    #[tokio::test]
    async fn test_trigger_never_skips_validation() {
        let config = FormConfig::builder()
            .validate_on_change(ValidationTrigger::Never)
            .build();
        let form = FormHandle::new(login_schema(), config);
        form.update_field("email", "bad").await;

        assert!(form.process_next_batch().await.unwrap().is_none());
        assert_eq!(form.pending_batches().await, 0);
        assert!(form.errors().await.is_empty());
    }

    #[tokio::test]
    async fn test_trigger_field_list() {
        let config = FormConfig::builder()
            .validate_on_change(ValidationTrigger::Fields(vec!["email".to_string()]))
            .build();
        let form = FormHandle::new(login_schema(), config);

        form.update_field("password", "").await;
        assert!(form.process_next_batch().await.unwrap().is_none());

        form.update_field("email", "bad").await;
        let outcome = form.process_next_batch().await.unwrap().unwrap();
        assert!(!outcome.is_valid);
        assert!(!outcome.errors.contains_key("password"));
    }

    #[tokio::test]
    async fn test_trigger_all_validates_whole_schema() {
        let config = FormConfig::builder()
            .validate_on_change(ValidationTrigger::All)
            .build();
        let form = FormHandle::new(login_schema(), config);

        form.update_field("email", "ana@obra.com").await;
        let outcome = form.process_next_batch().await.unwrap().unwrap();
        assert_eq!(outcome.errors.keys().collect::<Vec<_>>(), vec!["password"]);
    }

    #[tokio::test]
    async fn test_blur_policy() {
        let config = FormConfig::builder()
            .validate_on_change(ValidationTrigger::Never)
            .validate_on_blur(ValidationTrigger::Touched)
            .build();
        let form = FormHandle::new(login_schema(), config);

        form.update_field("email", "bad").await;
        let outcome = form.handle_field_blur("email").await.unwrap().unwrap();
        assert_eq!(outcome.errors.get("email").map(String::as_str), Some("validation.email"));
        assert!(!outcome.errors.contains_key("password"));

        let config = FormConfig::builder()
            .validate_on_blur(ValidationTrigger::Never)
            .build();
        let form = FormHandle::new(login_schema(), config);
        assert!(form.handle_field_blur("email").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_submit_blocked_then_submitted() {
        let form = FormHandle::new(login_schema(), FormConfig::default());

        let outcome = form.submit().await.unwrap();
        match outcome {
            SubmitOutcome::Blocked { errors } => assert!(errors.contains_key("password")),
            other => panic!("expected blocked submit, got {:?}", other),
        }

        form.update_fields([
            FieldChange::new("email", "ana@obra.com"),
            FieldChange::new("password", "secret"),
        ])
        .await;
        let outcome = form.submit().await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Submitted { record: None });

        // data survives submission
        assert_eq!(form.value("password").await, FieldValue::from("secret"));
    }

    #[tokio::test]
    async fn test_reset_clears_state() {
        let form = FormHandle::new(login_schema(), FormConfig::default());
        form.update_field("email", "bad").await;
        form.validate_all(None).await.unwrap();

        form.reset(FormData::new().with("id", "EMP-1")).await;
        assert!(form.errors().await.is_empty());
        assert_eq!(form.pending_batches().await, 0);
        assert_eq!(form.value("email").await, FieldValue::Null);
        assert_eq!(form.value("id").await, FieldValue::from("EMP-1"));
    }

    #[tokio::test]
    async fn test_metrics_recorded() {
        let registry = prometheus::Registry::new();
        let metrics = Arc::new(FormMetrics::new(&registry).unwrap());
        let form = FormHandle::builder(login_schema())
            .metrics(metrics.clone())
            .build();

        form.submit().await.unwrap();
        form.validate_fields(&["password"]).await.unwrap();

        assert_eq!(metrics.passes(PassScope::All, false), 1);
        assert_eq!(metrics.passes(PassScope::Fields, false), 1);
        assert_eq!(metrics.submissions("blocked"), 1);
    }
}
