//! Core error types for the intake workspace.
//!
//! [`IntakeError`] covers the failures surfaced through the public API:
//! configuration problems, submission gating, and sink failures. Per-field
//! validation messages are not errors in this sense; they live in
//! `intake_forms::errors::FieldError` and are recoverable by further input.

use thiserror::Error;

/// The primary error type for the intake workspace.
#[derive(Error, Debug)]
pub enum IntakeError {
    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ── Submission ───────────────────────────────────────────────────

    /// The submit gate is closed; the form cannot be submitted right now.
    #[error("Submit is disabled")]
    SubmitDisabled,

    /// A submission is already running.
    #[error("A submission is already in progress")]
    AlreadySubmitting,

    /// The submission sink rejected the record.
    #[error("Submission failed: {0}")]
    Submission(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntakeError {
    /// Returns a short, stable code for this error.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::SubmitDisabled => "submit_disabled",
            Self::AlreadySubmitting => "already_submitting",
            Self::Submission(_) => "submission",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
        }
    }
}

impl From<serde_json::Error> for IntakeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// A convenience type alias for `Result<T, IntakeError>`.
pub type IntakeResult<T> = Result<T, IntakeError>;
