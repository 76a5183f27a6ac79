//! # intake-cli
//!
//! Command line driver for the intake person form.
//!
//! This crate provides:
//!
//! - **Commands** - A registry of `clap` subcommands sharing one
//!   [`Settings`](intake_core::Settings) value
//! - **`validate-email`** - Runs a single address through the email validator
//! - **`fill`** - A line-driven session over a [`PersonForm`](intake_forms::PersonForm)
//!   that applies email checks as they resolve
//!
//! ## Quick Start
//!
//! ```rust
//! use intake_cli::command::CommandRegistry;
//! use intake_cli::commands::register_builtin_commands;
//!
//! let mut registry = CommandRegistry::new();
//! register_builtin_commands(&mut registry);
//!
//! let names = registry.list_commands();
//! assert_eq!(names, vec!["fill", "validate-email"]);
//! ```

// These clippy lints are intentionally allowed:
// - module_name_repetitions: re-exports make module-prefixed names redundant
// - unused_async: command handlers keep a uniform async signature
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::unused_async)]

pub mod command;
pub mod commands;
