//! Settings for the intake workspace.
//!
//! This module provides the [`Settings`] struct, which holds all configuration,
//! and [`LazySettings`], a globally-accessible settings holder that is set
//! once at startup.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{IntakeError, IntakeResult};

/// Remote email-validation endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailValidationSettings {
    /// Absolute URL of the validation endpoint.
    pub endpoint: String,
    /// Name of the query parameter that carries the candidate address.
    pub query_param: String,
    /// Per-request timeout in milliseconds. Expiry counts as a failed check.
    pub timeout_ms: u64,
}

impl Default for EmailValidationSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost/api/email-validator.php".to_string(),
            query_param: "email".to_string(),
            timeout_ms: 5_000,
        }
    }
}

/// Bounds used by the synchronous field rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSettings {
    /// Minimum number of characters in the first name.
    pub first_name_min_length: usize,
    /// Maximum number of characters in the surname.
    pub surname_max_length: usize,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            first_name_min_length: 3,
            surname_max_length: 10,
        }
    }
}

/// The complete set of settings.
///
/// # Examples
///
/// ```
/// use intake_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.email_validation.timeout_ms, 5_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level or filter directive (e.g. "info", "intake_forms=debug").
    pub log_level: String,

    // ── Email validation ─────────────────────────────────────────────

    /// Remote email-validation endpoint.
    pub email_validation: EmailValidationSettings,

    // ── Form rules ───────────────────────────────────────────────────

    /// Bounds for the synchronous field rules.
    pub form: FormSettings,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            email_validation: EmailValidationSettings::default(),
            form: FormSettings::default(),
            extra: HashMap::new(),
        }
    }
}

/// A globally-accessible settings container, configured once at startup.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the settings. Only the first call succeeds.
    pub fn configure(&self, settings: Settings) -> IntakeResult<()> {
        self.inner.set(settings).map_err(|_| {
            IntakeError::Configuration("Settings have already been configured".to_string())
        })
    }

    /// Returns the configured settings.
    pub fn get(&self) -> IntakeResult<&Settings> {
        self.inner.get().ok_or_else(|| {
            IntakeError::Configuration(
                "Settings have not been configured. Call SETTINGS.configure() first.".to_string(),
            )
        })
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();
