//! Recording submission sink.
//!
//! [`RecordingSink`] captures every [`PersonRecord`] it receives so tests
//! can assert on what was submitted. It can also be switched into a
//! failing mode to exercise the form's error path.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use intake_core::{IntakeError, IntakeResult};
use intake_forms::{PersonRecord, SubmissionSink};

#[derive(Debug, Default)]
struct State {
    records: Vec<PersonRecord>,
    failure: Option<String>,
}

/// A [`SubmissionSink`] that stores records in memory.
///
/// Thread-safe via `Arc<Mutex<...>>`; clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    state: Arc<Mutex<State>>,
}

impl RecordingSink {
    /// Creates an empty sink that accepts every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that rejects every record with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        let sink = Self::new();
        sink.fail_with(Some(message.into()));
        sink
    }

    /// Switches failing mode on (`Some`) or off (`None`).
    pub fn fail_with(&self, message: Option<String>) {
        self.state.lock().expect("RecordingSink lock poisoned").failure = message;
    }

    /// Returns every accepted record.
    pub fn records(&self) -> Vec<PersonRecord> {
        self.state
            .lock()
            .expect("RecordingSink lock poisoned")
            .records
            .clone()
    }

    /// Returns the most recently accepted record, if any.
    pub fn last_record(&self) -> Option<PersonRecord> {
        self.state
            .lock()
            .expect("RecordingSink lock poisoned")
            .records
            .last()
            .cloned()
    }

    /// Returns the number of accepted records.
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .expect("RecordingSink lock poisoned")
            .records
            .len()
    }

    /// Returns `true` if nothing was accepted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Asserts that exactly `expected` records were accepted.
    ///
    /// # Panics
    ///
    /// Panics if the count does not match.
    pub fn assert_count(&self, expected: usize) {
        let actual = self.len();
        assert_eq!(
            actual, expected,
            "Expected {expected} submission(s), but {actual} were recorded"
        );
    }
}

#[async_trait]
impl SubmissionSink for RecordingSink {
    async fn submit(&self, record: &PersonRecord) -> IntakeResult<()> {
        let mut state = self.state.lock().expect("RecordingSink lock poisoned");
        if let Some(message) = &state.failure {
            return Err(IntakeError::Submission(message.clone()));
        }
        state.records.push(record.clone());
        Ok(())
    }
}
