//! The person form aggregate.
//!
//! [`PersonForm`] is the single owner of all form state. Every mutation
//! goes through `&mut self`: the value store is updated, the synchronous
//! errors are recomputed, and the email validator sees the current email.
//! The only concurrency is inside [`EmailValidator`], whose request tasks
//! report back through [`PersonForm::next_resolution`].

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tracing::{info, warn, Instrument, Span};
use uuid::Uuid;

use intake_core::logging::form_span;
use intake_core::{IntakeError, IntakeResult, Settings};

use crate::bound_field::BoundField;
use crate::email::{EmailCheck, EmailValidator, EmailVerifier, ResolutionOutcome};
use crate::errors::FieldError;
use crate::fields::{Field, FieldRules, FieldValue, FormValues, Gender};
use crate::gate::{GateBlocker, SubmitGate};
use crate::submission::{PersonRecord, SubmissionSink};
use crate::validation::{evaluate, ErrorMap};
use crate::values::{FieldMeta, FieldValueStore};

/// Where the form is in its submit lifecycle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SubmitState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// The person intake form.
pub struct PersonForm<V> {
    id: Uuid,
    rules: FieldRules,
    today: Option<NaiveDate>,
    store: FieldValueStore,
    sync_errors: ErrorMap,
    email: EmailValidator<V>,
    submit_state: SubmitState,
    submit_count: u32,
    span: Span,
}

impl<V: EmailVerifier> PersonForm<V> {
    /// Creates an empty form with the default rules.
    pub fn new(verifier: V) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            rules: FieldRules::default(),
            today: None,
            store: FieldValueStore::new(),
            sync_errors: ErrorMap::new(),
            email: EmailValidator::new(verifier),
            submit_state: SubmitState::Idle,
            submit_count: 0,
            span: form_span(&id),
        }
    }

    /// Creates an empty form using the rule bounds and request timeout from
    /// `settings`.
    pub fn from_settings(verifier: V, settings: &Settings) -> Self {
        Self::new(verifier)
            .with_rules(FieldRules::from(&settings.form))
            .with_email_timeout(Duration::from_millis(settings.email_validation.timeout_ms))
    }

    #[must_use]
    pub fn with_rules(mut self, rules: FieldRules) -> Self {
        self.rules = rules;
        self
    }

    /// Fixes the date birth dates are checked against. Defaults to the
    /// local date at the time of each check.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Bounds each remote email check.
    #[must_use]
    pub fn with_email_timeout(mut self, timeout: Duration) -> Self {
        self.email = self.email.with_timeout(timeout);
        self
    }

    /// See [`EmailValidator::with_transport_cancellation`].
    #[must_use]
    pub fn with_transport_cancellation(mut self, enabled: bool) -> Self {
        self.email = self.email.with_transport_cancellation(enabled);
        self
    }

    /// Identifies this form instance in logs.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    // ── Input ────────────────────────────────────────────────────────

    pub fn set_first_name(&mut self, value: impl Into<String>) {
        self.set(FieldValue::FirstName(value.into()));
    }

    pub fn set_surname(&mut self, value: impl Into<String>) {
        self.set(FieldValue::Surname(value.into()));
    }

    pub fn set_birth_date(&mut self, value: Option<NaiveDate>) {
        self.set(FieldValue::BirthDate(value));
    }

    pub fn set_gender(&mut self, value: BTreeSet<Gender>) {
        self.set(FieldValue::Gender(value));
    }

    /// Sets the email and returns what the validator did with it.
    ///
    /// # Panics
    ///
    /// Panics outside a tokio runtime when a remote check must be issued.
    pub fn set_email(&mut self, value: impl Into<String>) -> EmailCheck {
        self.store.set(FieldValue::Email(value.into()));
        self.revalidate()
    }

    /// Flips one gender checkbox. Returns `true` if it is now checked.
    pub fn toggle_gender(&mut self, gender: Gender) -> bool {
        let checked = self.store.toggle_gender(gender);
        self.revalidate();
        checked
    }

    /// Sets any field's value.
    pub fn set(&mut self, value: FieldValue) {
        self.store.set(value);
        self.revalidate();
    }

    /// Marks a field touched, as when the user focuses it.
    ///
    /// Touching the email validates its current value, so an untouched
    /// empty email becomes `Required` without contacting the service.
    pub fn touch(&mut self, field: Field) {
        self.store.mark_touched(field);
        self.revalidate();
    }

    fn revalidate(&mut self) -> EmailCheck {
        let _entered = self.span.enter();
        self.sync_errors = evaluate(self.store.values(), &self.rules, self.today());
        self.email.on_change(&self.store.values().email)
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    // ── Async resolution ─────────────────────────────────────────────

    /// Waits for the in-flight email check and applies it. `None` when no
    /// check is pending.
    pub async fn next_resolution(&mut self) -> Option<ResolutionOutcome> {
        self.email
            .next_resolution()
            .instrument(self.span.clone())
            .await
    }

    /// Applies an already delivered resolution without waiting.
    pub fn try_next_resolution(&mut self) -> Option<ResolutionOutcome> {
        let _entered = self.span.enter();
        self.email.try_next_resolution()
    }

    /// Waits for the next resolution from any request, superseded ones
    /// included. See [`EmailValidator::next_delivered`].
    pub async fn next_delivered(&mut self) -> Option<ResolutionOutcome> {
        self.email
            .next_delivered()
            .instrument(self.span.clone())
            .await
    }

    /// Applies resolutions until no email check is in flight. Returns the
    /// last applied outcome.
    pub async fn settle(&mut self) -> Option<ResolutionOutcome> {
        let mut last = None;
        while let Some(outcome) = self.next_resolution().await {
            last = Some(outcome);
        }
        last
    }

    /// The email validator, for inspection.
    pub const fn email_validator(&self) -> &EmailValidator<V> {
        &self.email
    }

    pub const fn is_validating_email(&self) -> bool {
        self.email.is_loading()
    }

    // ── State ────────────────────────────────────────────────────────

    pub const fn values(&self) -> &FormValues {
        self.store.values()
    }

    pub fn meta(&self, field: Field) -> FieldMeta {
        self.store.meta(field)
    }

    /// All current errors, the email entry included.
    pub fn errors(&self) -> ErrorMap {
        let mut errors = self.sync_errors.clone();
        errors.set(Field::Email, self.email.error().cloned());
        errors
    }

    pub fn error(&self, field: Field) -> Option<FieldError> {
        match field {
            Field::Email => self.email.error().cloned(),
            _ => self.sync_errors.get(field).cloned(),
        }
    }

    pub fn gate(&self) -> SubmitGate {
        SubmitGate::from_state(
            &self.errors(),
            self.email.is_loading(),
            self.store.any_dirty(),
            self.submit_state == SubmitState::Submitting,
        )
    }

    pub fn is_submit_enabled(&self) -> bool {
        self.gate().is_enabled()
    }

    /// Why submit is currently disabled. Empty when it is enabled.
    pub fn blockers(&self) -> Vec<GateBlocker> {
        self.gate().blockers(&self.errors())
    }

    pub fn bound_field(&self, field: Field) -> BoundField {
        BoundField::new(
            field,
            self.store.values(),
            self.store.meta(field),
            self.error(field),
            self.email.is_loading(),
        )
    }

    /// Every field in display order.
    pub fn bound_fields(&self) -> Vec<BoundField> {
        Field::ALL.into_iter().map(|field| self.bound_field(field)).collect()
    }

    pub const fn submit_state(&self) -> SubmitState {
        self.submit_state
    }

    pub const fn submit_count(&self) -> u32 {
        self.submit_count
    }

    // ── Submission ───────────────────────────────────────────────────

    /// Starts a submission: checks the gate, marks the form submitting,
    /// and returns the snapshot to deliver.
    ///
    /// # Errors
    ///
    /// [`IntakeError::AlreadySubmitting`] while a submission is running,
    /// [`IntakeError::SubmitDisabled`] while the gate is closed.
    pub fn begin_submit(&mut self) -> IntakeResult<PersonRecord> {
        if self.submit_state == SubmitState::Submitting {
            return Err(IntakeError::AlreadySubmitting);
        }
        if !self.is_submit_enabled() {
            return Err(IntakeError::SubmitDisabled);
        }
        self.submit_state = SubmitState::Submitting;
        self.submit_count = self.submit_count.saturating_add(1);

        let record = PersonRecord::from(self.store.values());
        let _entered = self.span.enter();
        info!(attempt = self.submit_count, "Submitting person form");
        Ok(record)
    }

    /// Completes a submission started with [`begin_submit`](Self::begin_submit).
    ///
    /// On success every value, flag, and error returns to its initial
    /// state. On failure the values stay for another attempt and the
    /// error is returned.
    pub fn finish_submit(&mut self, result: IntakeResult<()>) -> IntakeResult<()> {
        let _entered = self.span.enter();
        match result {
            Ok(()) => {
                self.store.reset();
                self.sync_errors.clear();
                self.email.reset();
                self.submit_state = SubmitState::Succeeded;
                info!("Person form submitted");
                Ok(())
            }
            Err(err) => {
                self.submit_state = SubmitState::Failed;
                warn!(error = %err, "Person form submission failed");
                Err(err)
            }
        }
    }

    /// Submits the current values to `sink`.
    ///
    /// # Errors
    ///
    /// Gate errors from [`begin_submit`](Self::begin_submit), or the sink's
    /// own error.
    pub async fn submit<S>(&mut self, sink: &S) -> IntakeResult<()>
    where
        S: SubmissionSink + ?Sized,
    {
        let record = self.begin_submit()?;
        let result = sink.submit(&record).instrument(self.span.clone()).await;
        self.finish_submit(result)
    }

    /// Discards everything entered so far.
    pub fn reset(&mut self) {
        self.store.reset();
        self.sync_errors.clear();
        self.email.reset();
        self.submit_state = SubmitState::Idle;
    }
}

impl<V> fmt::Debug for PersonForm<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersonForm")
            .field("id", &self.id)
            .field("store", &self.store)
            .field("sync_errors", &self.sync_errors)
            .field("email", &self.email)
            .field("submit_state", &self.submit_state)
            .finish_non_exhaustive()
    }
}
