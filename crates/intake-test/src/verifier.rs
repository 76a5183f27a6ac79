//! Scripted email verifier.
//!
//! [`ScriptedVerifier`] answers each address with a configured [`Reply`]
//! and records every call. An address can be held with
//! [`hold`](ScriptedVerifier::hold): calls for it block until
//! [`release`](ScriptedVerifier::release), which lets a test decide the
//! exact order in which responses arrive.
//!
//! ## Example
//!
//! ```rust,no_run
//! use intake_test::verifier::{Reply, ScriptedVerifier};
//!
//! let verifier = ScriptedVerifier::new()
//!     .reply("john@gmail.com", Reply::Valid)
//!     .default_reply(Reply::Rejected);
//! verifier.hold("john");
//! // ... issue checks ...
//! verifier.release("john");
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{oneshot, Notify};

use intake_forms::{EmailVerifier, VerifyError, VerifyResponse};

/// How the verifier answers one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `{validation_status: true, status: 200}`.
    Valid,
    /// `{validation_status: false, status: 200}`.
    Rejected,
    /// An arbitrary response body.
    Response(VerifyResponse),
    /// The call fails.
    Fail(VerifyError),
    /// The call never completes.
    Hang,
}

#[derive(Debug)]
struct State {
    replies: HashMap<String, Reply>,
    default: Reply,
    held: HashSet<String>,
    waiters: HashMap<String, Vec<oneshot::Sender<()>>>,
    calls: Vec<String>,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<State>,
    called: Notify,
}

/// An in-memory [`EmailVerifier`] with scripted replies.
///
/// Cloning shares the script and the call log, so a test can keep a handle
/// after moving the verifier into a form.
#[derive(Debug, Clone)]
pub struct ScriptedVerifier {
    inner: Arc<Inner>,
}

impl Default for ScriptedVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedVerifier {
    /// Creates a verifier that answers every address with [`Reply::Valid`].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    replies: HashMap::new(),
                    default: Reply::Valid,
                    held: HashSet::new(),
                    waiters: HashMap::new(),
                    calls: Vec::new(),
                }),
                called: Notify::new(),
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .expect("ScriptedVerifier lock poisoned")
    }

    /// Scripts the reply for one address.
    #[must_use]
    pub fn reply(self, email: &str, reply: Reply) -> Self {
        self.set_reply(email, reply);
        self
    }

    /// Scripts the reply for addresses without their own entry.
    #[must_use]
    pub fn default_reply(self, reply: Reply) -> Self {
        self.state().default = reply;
        self
    }

    /// Changes the reply for one address after construction.
    pub fn set_reply(&self, email: &str, reply: Reply) {
        self.state().replies.insert(email.to_string(), reply);
    }

    /// Makes calls for `email` wait until [`release`](Self::release).
    pub fn hold(&self, email: &str) {
        self.state().held.insert(email.to_string());
    }

    /// Lets waiting and future calls for `email` complete.
    pub fn release(&self, email: &str) {
        let waiters = {
            let mut state = self.state();
            state.held.remove(email);
            state.waiters.remove(email).unwrap_or_default()
        };
        for waiter in waiters {
            let _ = waiter.send(());
        }
    }

    /// Every address checked so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// The number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    /// Waits until at least `count` calls have been made.
    pub async fn wait_for_calls(&self, count: usize) {
        loop {
            let called = self.inner.called.notified();
            if self.call_count() >= count {
                return;
            }
            called.await;
        }
    }

    /// Asserts that exactly `expected` calls were made.
    ///
    /// # Panics
    ///
    /// Panics if the count does not match.
    pub fn assert_call_count(&self, expected: usize) {
        let calls = self.calls();
        assert_eq!(
            calls.len(),
            expected,
            "Expected {expected} email check(s), but got {}: {calls:?}",
            calls.len()
        );
    }

    /// Asserts that the service was never contacted.
    ///
    /// # Panics
    ///
    /// Panics if any call was recorded.
    pub fn assert_no_calls(&self) {
        self.assert_call_count(0);
    }
}

#[async_trait]
impl EmailVerifier for ScriptedVerifier {
    async fn verify(&self, email: &str) -> Result<VerifyResponse, VerifyError> {
        let (reply, gate) = {
            let mut state = self.state();
            state.calls.push(email.to_string());
            let reply = state
                .replies
                .get(email)
                .cloned()
                .unwrap_or_else(|| state.default.clone());
            let gate = if state.held.contains(email) {
                let (tx, rx) = oneshot::channel();
                state.waiters.entry(email.to_string()).or_default().push(tx);
                Some(rx)
            } else {
                None
            };
            (reply, gate)
        };
        self.inner.called.notify_waiters();
        tracing::debug!(email, ?reply, held = gate.is_some(), "Scripted email check");

        if let Some(gate) = gate {
            // A dropped sender means the verifier itself went away.
            let _ = gate.await;
        }

        match reply {
            Reply::Valid => Ok(VerifyResponse::valid()),
            Reply::Rejected => Ok(VerifyResponse::rejected()),
            Reply::Response(response) => Ok(response),
            Reply::Fail(err) => Err(err),
            Reply::Hang => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies() {
        let verifier = ScriptedVerifier::new()
            .reply("bad@x.com", Reply::Rejected)
            .reply("down@x.com", Reply::Fail(VerifyError::Transport("refused".into())));
        assert!(verifier.verify("good@x.com").await.unwrap().is_valid());
        assert!(!verifier.verify("bad@x.com").await.unwrap().is_valid());
        assert!(verifier.verify("down@x.com").await.is_err());
        assert_eq!(verifier.calls(), vec!["good@x.com", "bad@x.com", "down@x.com"]);
    }

    #[tokio::test]
    async fn test_default_reply() {
        let verifier = ScriptedVerifier::new().default_reply(Reply::Response(VerifyResponse {
            validation_status: true,
            status: 500,
        }));
        assert!(!verifier.verify("any@x.com").await.unwrap().is_valid());
    }

    #[tokio::test]
    async fn test_hold_blocks_until_release() {
        let verifier = ScriptedVerifier::new();
        verifier.hold("slow@x.com");

        let task = {
            let verifier = verifier.clone();
            tokio::spawn(async move { verifier.verify("slow@x.com").await })
        };
        verifier.wait_for_calls(1).await;
        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        verifier.release("slow@x.com");
        assert!(task.await.unwrap().unwrap().is_valid());
    }

    #[tokio::test]
    async fn test_release_before_call_does_not_block() {
        let verifier = ScriptedVerifier::new();
        verifier.hold("a@x.com");
        verifier.release("a@x.com");
        assert!(verifier.verify("a@x.com").await.is_ok());
    }

    #[test]
    #[should_panic(expected = "Expected 1 email check(s)")]
    fn test_assert_call_count_panics_on_mismatch() {
        ScriptedVerifier::new().assert_call_count(1);
    }
}
