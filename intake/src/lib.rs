//! # intake
//!
//! A person intake form with asynchronous email validation.
//!
//! This is the meta-crate that re-exports all sub-crates. Depend on `intake`
//! to get everything, or on individual crates for finer-grained control.
//!
//! ```rust,no_run
//! use intake::forms::PersonForm;
//! use intake::http::HttpEmailVerifier;
//!
//! # async fn run() -> intake::core::IntakeResult<()> {
//! let verifier = HttpEmailVerifier::new("http://localhost/api/email-validator.php")?;
//! let mut form = PersonForm::new(verifier);
//! form.set_first_name("John");
//! form.set_email("john@gmail.com");
//! form.settle().await;
//! println!("submit enabled: {}", form.is_submit_enabled());
//! # Ok(())
//! # }
//! ```

/// Errors, settings, settings loaders, and logging setup.
pub use intake_core as core;

/// Field rules, the email validation coordinator, the submit gate, and the form.
pub use intake_forms as forms;

/// `reqwest`-backed email verifier.
#[cfg(feature = "http")]
pub use intake_http as http;

/// Command registry and built-in commands.
#[cfg(feature = "cli")]
pub use intake_cli as cli;

/// Scripted verifier, recording sink, and form assertions.
#[cfg(feature = "testing")]
pub use intake_test as test;

/// Commonly used types.
pub mod prelude {
    pub use intake_core::{IntakeError, IntakeResult, Settings};
    pub use intake_forms::{
        EmailVerifier, Field, FieldError, Gender, PersonForm, PersonRecord, SubmissionSink,
    };

    #[cfg(feature = "http")]
    pub use intake_http::HttpEmailVerifier;
}

pub use async_trait;
pub use chrono;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
pub use tracing_subscriber;
