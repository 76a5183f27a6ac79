//! # intake-test
//!
//! Test tooling for the intake workspace. Provides a scripted email
//! verifier whose responses can be held back and released in any order,
//! a submission sink that records what it receives, and assertion helpers
//! for form state.
//!
//! ## Modules
//!
//! - [`verifier`] - [`ScriptedVerifier`] with per-address replies and manual release
//! - [`sink`] - [`RecordingSink`] capturing submitted records
//! - [`assertions`] - Assertions over a [`PersonForm`](intake_forms::PersonForm)

pub mod assertions;
pub mod sink;
pub mod verifier;

pub use assertions::{assert_field_error, assert_gate_closed, assert_gate_open};
pub use sink::RecordingSink;
pub use verifier::{Reply, ScriptedVerifier};
