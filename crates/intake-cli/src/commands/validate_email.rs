//! The `validate-email` command.
//!
//! Runs one address through the same [`EmailValidator`] the form uses and
//! prints the verdict.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use intake_core::{IntakeError, Settings};
use intake_forms::{
    EmailCheck, EmailValidator, EmailVerifier, FieldError, InvalidReason, ResolutionOutcome,
    Verdict,
};
use intake_http::HttpEmailVerifier;

use crate::command::IntakeCommand;

/// Checks a single address against the configured endpoint.
pub struct ValidateEmailCommand;

/// What a one-shot check concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailReport {
    /// The trimmed address.
    pub address: String,
    /// The error the form would show, if any.
    pub error: Option<FieldError>,
    /// The service verdict, absent when no request was needed.
    pub verdict: Option<Verdict>,
}

impl EmailReport {
    pub const fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for EmailReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let address = if self.address.is_empty() {
            "<empty>"
        } else {
            self.address.as_str()
        };
        match (&self.error, &self.verdict) {
            (None, _) => write!(f, "{address}: valid"),
            (Some(err), Some(Verdict::Invalid(InvalidReason::Rejected {
                validation_status,
                status,
            }))) => write!(
                f,
                "{address}: {err} (validation_status={validation_status}, status={status})"
            ),
            (Some(err), Some(Verdict::Invalid(InvalidReason::Failed(cause)))) => {
                write!(f, "{address}: {err} ({cause})")
            }
            (Some(err), _) => write!(f, "{address}: {err}"),
        }
    }
}

/// Validates `address` with `verifier`, waiting for the result.
pub async fn check_address<V: EmailVerifier>(
    verifier: V,
    address: &str,
    timeout: Duration,
) -> EmailReport {
    let mut validator = EmailValidator::new(verifier).with_timeout(timeout);
    let verdict = match validator.on_change(address) {
        EmailCheck::Required => None,
        EmailCheck::Cached(verdict) => Some(verdict),
        EmailCheck::Pending(_) | EmailCheck::AlreadyPending(_) => {
            match validator.next_resolution().await {
                Some(ResolutionOutcome::Applied(verdict)) => Some(verdict),
                Some(ResolutionOutcome::Stale) | None => None,
            }
        }
    };
    EmailReport {
        address: address.trim().to_string(),
        error: validator.error().cloned(),
        verdict,
    }
}

#[async_trait]
impl IntakeCommand for ValidateEmailCommand {
    fn name(&self) -> &'static str {
        "validate-email"
    }

    fn help(&self) -> &'static str {
        "Check one address against the email validation endpoint"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("address")
                .required(true)
                .help("The email address to check"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), IntakeError> {
        let address = matches
            .get_one::<String>("address")
            .ok_or_else(|| IntakeError::Configuration("address is required".to_string()))?;
        let verifier = HttpEmailVerifier::from_settings(&settings.email_validation)?;
        let timeout = Duration::from_millis(settings.email_validation.timeout_ms);

        let report = check_address(verifier, address, timeout).await;
        tracing::info!(address = %report.address, valid = report.is_valid(), "Email checked");
        println!("{report}");
        Ok(())
    }
}
