//! Assertions over form state.

use intake_forms::{EmailVerifier, Field, GateBlocker, PersonForm};

/// Asserts the displayed message for `field`, or that it has no error.
///
/// # Panics
///
/// Panics if the field's error differs from `expected`.
pub fn assert_field_error<V: EmailVerifier>(
    form: &PersonForm<V>,
    field: Field,
    expected: Option<&str>,
) {
    let actual = form.error(field).map(|err| err.to_string());
    assert_eq!(
        actual.as_deref(),
        expected,
        "Unexpected error on {field}; all errors: {:?}",
        form.errors()
    );
}

/// Asserts that the form can be submitted.
///
/// # Panics
///
/// Panics with the list of blockers if the gate is closed.
pub fn assert_gate_open<V: EmailVerifier>(form: &PersonForm<V>) {
    let blockers = form.blockers();
    assert!(
        form.is_submit_enabled(),
        "Expected submit to be enabled, blocked by: {blockers:?}"
    );
}

/// Asserts that the form cannot be submitted, and exactly why.
///
/// # Panics
///
/// Panics if the gate is open or the blockers differ.
pub fn assert_gate_closed<V: EmailVerifier>(form: &PersonForm<V>, expected: &[GateBlocker]) {
    assert!(!form.is_submit_enabled(), "Expected submit to be disabled");
    assert_eq!(form.blockers(), expected);
}
