//! # intake-core
//!
//! Core types shared by every intake crate: the error enum, the settings
//! structure and its loaders, and the tracing setup.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Settings and the global settings holder
//! - [`settings_loader`] - TOML/JSON/environment loading
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{IntakeError, IntakeResult};
pub use settings::{EmailValidationSettings, FormSettings, Settings, SETTINGS};
