//! Tracing setup for the form and its email checks.
//!
//! The validator logs each check it issues, reuses, supersedes, discards
//! or applies. Those events carry the span from [`form_span`], so several
//! forms in one process can be told apart by id.

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

/// Installs the global subscriber. Output goes to stderr so that it never
/// mixes with command output on stdout.
///
/// `settings.log_level` is an `EnvFilter` directive such as `"info"` or
/// `"intake_forms=debug"`; an unparsable directive falls back to `info`.
/// Debug builds get human-readable output, everything else one JSON object
/// per event. Only the first call in a process has any effect.
pub fn setup_logging(settings: &Settings) {
    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = if settings.debug {
        builder
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
    } else {
        builder.json().try_init()
    };
    if installed.is_err() {
        tracing::debug!("Subscriber already installed; keeping it");
    }
}

/// The span every event of one form is recorded under.
///
/// ```
/// use intake_core::logging::form_span;
///
/// let id = uuid::Uuid::new_v4();
/// let span = form_span(&id);
/// let _guard = span.enter();
/// tracing::info!("form mounted");
/// ```
pub fn form_span(form_id: &uuid::Uuid) -> tracing::Span {
    tracing::info_span!("form", id = %form_id)
}
