//! Asynchronous email validation.
//!
//! [`EmailValidator`] owns the email field's async state: the loading flag,
//! a single-entry cache of the last verdict, and the request currently in
//! flight. Every request is tagged with a fresh [`RequestToken`]. Request
//! tasks never touch the state; they send a [`Resolution`] back over a
//! channel and the owner applies it with [`EmailValidator::apply`], which
//! discards anything whose token is no longer the active one.
//!
//! Aborting a superseded task is only an optimization. A resolution that
//! slips through after a newer request was issued is still dropped by the
//! token comparison.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn, Instrument};

use crate::errors::FieldError;

/// Default bound on a single remote check.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Body returned by the remote validation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// Whether the service considers the address deliverable.
    #[serde(alias = "validationStatus")]
    pub validation_status: bool,
    /// Status code reported inside the body.
    pub status: u16,
}

impl VerifyResponse {
    /// A response reporting the address valid.
    pub const fn valid() -> Self {
        Self {
            validation_status: true,
            status: 200,
        }
    }

    /// A response reporting the address invalid.
    pub const fn rejected() -> Self {
        Self {
            validation_status: false,
            status: 200,
        }
    }

    /// Valid only when the flag is set and the status is exactly 200.
    pub const fn is_valid(&self) -> bool {
        self.validation_status && self.status == 200
    }
}

/// Why a remote check produced no usable response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// Connection, DNS, or HTTP-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// No response within the configured bound.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The body could not be read as a [`VerifyResponse`].
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The request was abandoned before it completed.
    #[error("request cancelled")]
    Cancelled,
}

impl From<JoinError> for VerifyError {
    fn from(err: JoinError) -> Self {
        if err.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Transport(format!("request task failed: {err}"))
        }
    }
}

/// The remote email-validation service.
#[async_trait]
pub trait EmailVerifier: Send + Sync + 'static {
    /// Checks a single, already trimmed, non-empty address.
    async fn verify(&self, email: &str) -> Result<VerifyResponse, VerifyError>;
}

#[async_trait]
impl<T: EmailVerifier + ?Sized> EmailVerifier for Arc<T> {
    async fn verify(&self, email: &str) -> Result<VerifyResponse, VerifyError> {
        (**self).verify(email).await
    }
}

/// Identifies one remote check. Tokens only grow within a validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    /// The raw counter value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a request task reports back to the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Token the request was issued with.
    pub token: RequestToken,
    /// The address that was checked.
    pub value: String,
    /// The service's answer.
    pub result: Result<VerifyResponse, VerifyError>,
}

/// Why an address counts as invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// The service answered but did not report the address valid.
    Rejected {
        validation_status: bool,
        status: u16,
    },
    /// The check itself failed. Treated as invalid.
    Failed(VerifyError),
}

/// Outcome of a completed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The service accepted the address.
    Valid,
    /// The address was rejected or could not be checked.
    Invalid(InvalidReason),
}

impl Verdict {
    /// Interprets a service result, failing closed.
    pub fn from_result(result: Result<VerifyResponse, VerifyError>) -> Self {
        match result {
            Ok(response) if response.is_valid() => Self::Valid,
            Ok(response) => Self::Invalid(InvalidReason::Rejected {
                validation_status: response.validation_status,
                status: response.status,
            }),
            Err(err) => Self::Invalid(InvalidReason::Failed(err)),
        }
    }

    /// Whether the email field is left without an error.
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The error shown on the email field for this verdict.
    pub const fn field_error(&self) -> Option<FieldError> {
        match self {
            Self::Valid => None,
            Self::Invalid(InvalidReason::Rejected { .. }) => Some(FieldError::EmailRejected),
            Self::Invalid(InvalidReason::Failed(_)) => Some(FieldError::EmailUnverified),
        }
    }
}

/// What [`EmailValidator::on_change`] did with a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailCheck {
    /// The value is empty; no request was made.
    Required,
    /// The value matches the last checked one; its verdict was reused.
    Cached(Verdict),
    /// A new request was issued.
    Pending(RequestToken),
    /// A request for this exact value is already in flight.
    AlreadyPending(RequestToken),
}

/// Result of applying a [`Resolution`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// The token was active; the verdict is now the field's state.
    Applied(Verdict),
    /// The token was superseded; nothing changed.
    Stale,
}

#[derive(Debug)]
struct ActiveRequest {
    token: RequestToken,
    value: String,
    handle: JoinHandle<()>,
}

#[derive(Debug, Clone)]
struct CachedVerdict {
    value: String,
    verdict: Verdict,
}

#[derive(Debug, Default)]
struct AsyncValidationState {
    loading: bool,
    cache: Option<CachedVerdict>,
    active: Option<ActiveRequest>,
    error: Option<FieldError>,
}

enum Event {
    Delivered(Resolution),
    Finished(Option<JoinError>),
}

/// Issues, supersedes, and reconciles remote checks for the email field.
///
/// Requests are spawned on the ambient tokio runtime.
pub struct EmailValidator<V> {
    verifier: Arc<V>,
    timeout: Duration,
    cancel_in_transport: bool,
    next_token: u64,
    state: AsyncValidationState,
    tx: UnboundedSender<Resolution>,
    rx: UnboundedReceiver<Resolution>,
}

impl<V: EmailVerifier> EmailValidator<V> {
    /// Creates a validator with the default request timeout.
    pub fn new(verifier: V) -> Self {
        Self::from_arc(Arc::new(verifier))
    }

    /// Creates a validator sharing an existing verifier.
    pub fn from_arc(verifier: Arc<V>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            verifier,
            timeout: DEFAULT_TIMEOUT,
            cancel_in_transport: true,
            next_token: 0,
            state: AsyncValidationState::default(),
            tx,
            rx,
        }
    }

    /// Sets the bound on each remote check. Expiry counts as a failed check.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether superseded request tasks are aborted (default `true`).
    ///
    /// When disabled, superseded tasks run to completion and their
    /// resolutions are discarded as stale.
    #[must_use]
    pub fn with_transport_cancellation(mut self, enabled: bool) -> Self {
        self.cancel_in_transport = enabled;
        self
    }

    /// Reacts to a new email value.
    ///
    /// # Panics
    ///
    /// Issuing a request spawns a task, which panics outside a tokio runtime.
    pub fn on_change(&mut self, raw: &str) -> EmailCheck {
        let value = raw.trim();

        if value.is_empty() {
            self.cancel_active();
            self.state.loading = false;
            self.state.cache = None;
            self.state.error = Some(FieldError::Required);
            return EmailCheck::Required;
        }

        if let Some(active) = &self.state.active {
            if active.value == value {
                return EmailCheck::AlreadyPending(active.token);
            }
        }

        if let Some(cached) = self.state.cache.as_ref().filter(|c| c.value == value) {
            let verdict = cached.verdict.clone();
            debug!(email = %value, valid = verdict.is_valid(), "Reusing cached email verdict");
            self.cancel_active();
            self.state.loading = false;
            self.state.error = verdict.field_error();
            return EmailCheck::Cached(verdict);
        }

        self.cancel_active();
        let token = self.mint_token();
        self.state.loading = true;
        debug!(%token, email = %value, "Issuing email check");

        let verifier = Arc::clone(&self.verifier);
        let tx = self.tx.clone();
        let timeout = self.timeout;
        let checked = value.to_string();
        let handle = tokio::spawn(
            async move {
                let result = tokio::time::timeout(timeout, verifier.verify(&checked))
                    .await
                    .unwrap_or_else(|_| Err(VerifyError::Timeout(timeout)));
                // The receiver is gone once the validator is dropped.
                let _ = tx.send(Resolution {
                    token,
                    value: checked,
                    result,
                });
            }
            .in_current_span(),
        );

        self.state.active = Some(ActiveRequest {
            token,
            value: value.to_string(),
            handle,
        });
        EmailCheck::Pending(token)
    }

    /// Applies a resolution if its token is still the active one.
    pub fn apply(&mut self, resolution: Resolution) -> ResolutionOutcome {
        let Resolution {
            token,
            value,
            result,
        } = resolution;

        if self.active_token() != Some(token) {
            debug!(%token, email = %value, "Discarding stale email check");
            return ResolutionOutcome::Stale;
        }

        self.state.active = None;
        self.state.loading = false;

        if let Err(err) = &result {
            warn!(%token, email = %value, error = %err, "Email check failed");
        }
        let verdict = Verdict::from_result(result);
        info!(%token, email = %value, valid = verdict.is_valid(), "Applied email check");

        self.state.error = verdict.field_error();
        self.state.cache = Some(CachedVerdict {
            value,
            verdict: verdict.clone(),
        });
        ResolutionOutcome::Applied(verdict)
    }

    /// Waits for the in-flight request to resolve and applies it.
    ///
    /// Stale resolutions received meanwhile are discarded. Returns `None`
    /// when nothing is in flight.
    pub async fn next_resolution(&mut self) -> Option<ResolutionOutcome> {
        loop {
            let active = self.state.active.as_mut()?;
            let token = active.token;
            let value = active.value.clone();

            let event = tokio::select! {
                biased;
                Some(resolution) = self.rx.recv() => Event::Delivered(resolution),
                joined = &mut active.handle => Event::Finished(joined.err()),
            };

            match event {
                Event::Delivered(resolution) => {
                    if let outcome @ ResolutionOutcome::Applied(_) = self.apply(resolution) {
                        return Some(outcome);
                    }
                }
                Event::Finished(failure) => {
                    while let Ok(resolution) = self.rx.try_recv() {
                        if let outcome @ ResolutionOutcome::Applied(_) = self.apply(resolution) {
                            return Some(outcome);
                        }
                    }
                    // The task ended without reporting (panicked or aborted).
                    let err = failure.map_or_else(
                        || VerifyError::Transport("request ended without a result".into()),
                        VerifyError::from,
                    );
                    return Some(self.apply(Resolution {
                        token,
                        value,
                        result: Err(err),
                    }));
                }
            }
        }
    }

    /// Applies one already delivered resolution without waiting.
    pub fn try_next_resolution(&mut self) -> Option<ResolutionOutcome> {
        let resolution = self.rx.try_recv().ok()?;
        Some(self.apply(resolution))
    }

    /// Waits for the next resolution from any request, superseded ones
    /// included, and applies it.
    ///
    /// Pending forever if no request will report; pair with a timeout.
    pub async fn next_delivered(&mut self) -> Option<ResolutionOutcome> {
        let resolution = self.rx.recv().await?;
        Some(self.apply(resolution))
    }

    /// The email field's current error.
    pub const fn error(&self) -> Option<&FieldError> {
        self.state.error.as_ref()
    }

    /// Whether a check is in flight.
    pub const fn is_loading(&self) -> bool {
        self.state.loading
    }

    /// Token of the check in flight, if any.
    pub fn active_token(&self) -> Option<RequestToken> {
        self.state.active.as_ref().map(|active| active.token)
    }

    /// The value and verdict of the last completed check.
    pub fn last_verdict(&self) -> Option<(&str, &Verdict)> {
        self.state
            .cache
            .as_ref()
            .map(|cached| (cached.value.as_str(), &cached.verdict))
    }

    /// Returns to the initial state, superseding any in-flight check.
    pub fn reset(&mut self) {
        self.cancel_active();
        self.state = AsyncValidationState::default();
    }

    fn mint_token(&mut self) -> RequestToken {
        self.next_token += 1;
        RequestToken(self.next_token)
    }

    fn cancel_active(&mut self) {
        if let Some(active) = self.state.active.take() {
            debug!(token = %active.token, email = %active.value, "Superseding email check");
            if self.cancel_in_transport {
                active.handle.abort();
            }
        }
    }
}

impl<V> fmt::Debug for EmailValidator<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailValidator")
            .field("timeout", &self.timeout)
            .field("cancel_in_transport", &self.cancel_in_transport)
            .field("next_token", &self.next_token)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<V> Drop for EmailValidator<V> {
    fn drop(&mut self) {
        if let Some(active) = self.state.active.take() {
            active.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Replies after a per-address delay on the (paused) tokio clock.
    #[derive(Default)]
    struct DelayedVerifier {
        replies: HashMap<&'static str, (u64, Result<VerifyResponse, VerifyError>)>,
        calls: AtomicUsize,
    }

    impl DelayedVerifier {
        fn reply(
            mut self,
            email: &'static str,
            delay_ms: u64,
            result: Result<VerifyResponse, VerifyError>,
        ) -> Self {
            self.replies.insert(email, (delay_ms, result));
            self
        }
    }

    #[async_trait]
    impl EmailVerifier for DelayedVerifier {
        async fn verify(&self, email: &str) -> Result<VerifyResponse, VerifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (delay, result) = self
                .replies
                .get(email)
                .cloned()
                .unwrap_or((0, Ok(VerifyResponse::valid())));
            tokio::time::sleep(Duration::from_millis(delay)).await;
            result
        }
    }

    fn validator(verifier: DelayedVerifier) -> (EmailValidator<DelayedVerifier>, Arc<DelayedVerifier>) {
        let verifier = Arc::new(verifier);
        (EmailValidator::from_arc(Arc::clone(&verifier)), verifier)
    }

    #[test]
    fn test_validity_predicate() {
        assert!(VerifyResponse::valid().is_valid());
        assert!(!VerifyResponse::rejected().is_valid());
        let wrong_status = VerifyResponse {
            validation_status: true,
            status: 201,
        };
        assert!(!wrong_status.is_valid());
    }

    #[test]
    fn test_verdict_fails_closed() {
        assert_eq!(Verdict::from_result(Ok(VerifyResponse::valid())), Verdict::Valid);
        assert_eq!(
            Verdict::from_result(Ok(VerifyResponse::rejected())).field_error(),
            Some(FieldError::EmailRejected)
        );
        assert_eq!(
            Verdict::from_result(Err(VerifyError::Transport("refused".into()))).field_error(),
            Some(FieldError::EmailUnverified)
        );
    }

    #[test]
    fn test_response_field_names() {
        let response: VerifyResponse =
            serde_json::from_str(r#"{"validation_status": true, "status": 200}"#).unwrap();
        assert!(response.is_valid());
        let response: VerifyResponse =
            serde_json::from_str(r#"{"validationStatus": true, "status": 500}"#).unwrap();
        assert!(!response.is_valid());
    }

    #[tokio::test]
    async fn test_empty_value_is_required_without_request() {
        let (mut validator, verifier) = validator(DelayedVerifier::default());
        assert_eq!(validator.on_change("   "), EmailCheck::Required);
        assert_eq!(validator.error(), Some(&FieldError::Required));
        assert!(!validator.is_loading());
        assert_eq!(validator.active_token(), None);
        tokio::task::yield_now().await;
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_valid_response_clears_error() {
        let (mut validator, _) = validator(DelayedVerifier::default());
        let EmailCheck::Pending(token) = validator.on_change(" john@gmail.com ") else {
            panic!("Expected a request to be issued");
        };
        assert!(validator.is_loading());
        assert_eq!(validator.active_token(), Some(token));

        let outcome = validator.next_resolution().await;
        assert_eq!(outcome, Some(ResolutionOutcome::Applied(Verdict::Valid)));
        assert!(!validator.is_loading());
        assert_eq!(validator.error(), None);
        assert_eq!(validator.active_token(), None);
        assert_eq!(
            validator.last_verdict(),
            Some(("john@gmail.com", &Verdict::Valid))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_early_response_never_overwrites_later() {
        let verifier = DelayedVerifier::default()
            .reply("john@gmail", 500, Ok(VerifyResponse::rejected()))
            .reply("john@gmail.com", 10, Ok(VerifyResponse::valid()));
        let mut validator = EmailValidator::new(verifier).with_transport_cancellation(false);

        let EmailCheck::Pending(first) = validator.on_change("john@gmail") else {
            panic!("Expected a request to be issued");
        };
        let EmailCheck::Pending(second) = validator.on_change("john@gmail.com") else {
            panic!("Expected a request to be issued");
        };
        assert!(second > first);

        let outcome = validator.next_resolution().await;
        assert_eq!(outcome, Some(ResolutionOutcome::Applied(Verdict::Valid)));

        let late = validator.next_delivered().await;
        assert_eq!(late, Some(ResolutionOutcome::Stale));
        assert_eq!(validator.error(), None);
        assert!(!validator.is_loading());
        assert_eq!(
            validator.last_verdict(),
            Some(("john@gmail.com", &Verdict::Valid))
        );
    }

    #[tokio::test]
    async fn test_apply_with_superseded_token_changes_nothing() {
        let (mut validator, _) = validator(DelayedVerifier::default());
        let EmailCheck::Pending(first) = validator.on_change("a@x.com") else {
            panic!("Expected a request to be issued");
        };
        let EmailCheck::Pending(second) = validator.on_change("b@x.com") else {
            panic!("Expected a request to be issued");
        };

        let outcome = validator.apply(Resolution {
            token: first,
            value: "a@x.com".into(),
            result: Ok(VerifyResponse::rejected()),
        });
        assert_eq!(outcome, ResolutionOutcome::Stale);
        assert!(validator.is_loading());
        assert_eq!(validator.active_token(), Some(second));
        assert_eq!(validator.error(), None);
        assert_eq!(validator.last_verdict(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_skips_request() {
        let verifier = DelayedVerifier::default().reply("bad@x.com", 0, Ok(VerifyResponse::rejected()));
        let (mut validator, verifier) = validator(verifier);
        validator.on_change("bad@x.com");
        validator.next_resolution().await;
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);

        let check = validator.on_change("bad@x.com ");
        assert!(matches!(check, EmailCheck::Cached(Verdict::Invalid(_))));
        assert_eq!(validator.error(), Some(&FieldError::EmailRejected));
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_supersedes_in_flight_request() {
        let verifier = DelayedVerifier::default().reply("slow@x.com", 1000, Ok(VerifyResponse::valid()));
        let (mut validator, _) = validator(verifier);
        validator.on_change("fast@x.com");
        validator.next_resolution().await;

        validator.on_change("slow@x.com");
        assert!(validator.is_loading());
        assert!(matches!(
            validator.on_change("fast@x.com"),
            EmailCheck::Cached(Verdict::Valid)
        ));
        assert!(!validator.is_loading());
        assert_eq!(validator.active_token(), None);
        assert_eq!(validator.next_resolution().await, None);
    }

    #[tokio::test]
    async fn test_same_value_in_flight_is_not_reissued() {
        let (mut validator, _) = validator(DelayedVerifier::default());
        let EmailCheck::Pending(token) = validator.on_change("a@x.com") else {
            panic!("Expected a request to be issued");
        };
        assert_eq!(validator.on_change("a@x.com"), EmailCheck::AlreadyPending(token));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_cancels_and_drops_cache() {
        let (mut validator, _) = validator(DelayedVerifier::default());
        validator.on_change("a@x.com");
        validator.next_resolution().await;

        validator.on_change("b@x.com");
        assert_eq!(validator.on_change(""), EmailCheck::Required);
        assert_eq!(validator.active_token(), None);
        assert!(!validator.is_loading());
        assert_eq!(validator.last_verdict(), None);

        assert!(matches!(validator.on_change("a@x.com"), EmailCheck::Pending(_)));
        assert_eq!(
            validator.next_resolution().await,
            Some(ResolutionOutcome::Applied(Verdict::Valid))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_failed_check() {
        let verifier = DelayedVerifier::default().reply("hang@x.com", 60_000, Ok(VerifyResponse::valid()));
        let (validator, _) = validator(verifier);
        let mut validator = validator.with_timeout(Duration::from_secs(5));
        validator.on_change("hang@x.com");

        let outcome = validator.next_resolution().await;
        assert_eq!(
            outcome,
            Some(ResolutionOutcome::Applied(Verdict::Invalid(InvalidReason::Failed(
                VerifyError::Timeout(Duration::from_secs(5))
            ))))
        );
        assert_eq!(validator.error(), Some(&FieldError::EmailUnverified));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_is_invalid() {
        let verifier = DelayedVerifier::default()
            .reply("down@x.com", 0, Err(VerifyError::Transport("connection refused".into())));
        let (mut validator, _) = validator(verifier);
        validator.on_change("down@x.com");
        validator.next_resolution().await;
        assert_eq!(validator.error(), Some(&FieldError::EmailUnverified));
        assert_eq!(validator.error().unwrap().to_string(), "Email not valid");
    }

    #[tokio::test]
    async fn test_reset_makes_pending_resolution_stale() {
        let (mut validator, _) = validator(DelayedVerifier::default());
        let EmailCheck::Pending(token) = validator.on_change("a@x.com") else {
            panic!("Expected a request to be issued");
        };
        validator.reset();
        assert!(!validator.is_loading());
        assert_eq!(validator.error(), None);
        let outcome = validator.apply(Resolution {
            token,
            value: "a@x.com".into(),
            result: Ok(VerifyResponse::valid()),
        });
        assert_eq!(outcome, ResolutionOutcome::Stale);
        assert_eq!(validator.last_verdict(), None);
    }

    #[test]
    fn test_join_error_maps_to_verify_error() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let err = runtime.block_on(async {
            let handle = tokio::spawn(std::future::pending::<()>());
            handle.abort();
            handle.await.unwrap_err()
        });
        assert_eq!(VerifyError::from(err), VerifyError::Cancelled);
    }
}
