//! Submit gate.

use std::fmt;

use crate::fields::Field;
use crate::validation::ErrorMap;

/// One reason the submit action is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateBlocker {
    /// A synchronous rule failed on this field.
    FieldError(Field),
    /// The email field has an error.
    EmailError,
    /// An email check is in flight.
    EmailValidating,
    /// Nothing has been entered yet.
    Pristine,
    /// A submission is running.
    Submitting,
}

impl fmt::Display for GateBlocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldError(field) => write!(f, "{field} has an error"),
            Self::EmailError => f.write_str("Email has an error"),
            Self::EmailValidating => f.write_str("Email is being validated"),
            Self::Pristine => f.write_str("no field has been changed"),
            Self::Submitting => f.write_str("a submission is in progress"),
        }
    }
}

/// The five inputs that decide whether the form can be submitted.
///
/// Holds no state of its own; build a fresh one whenever an input changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SubmitGate {
    pub sync_errors_empty: bool,
    pub email_error_empty: bool,
    pub email_loading: bool,
    pub any_dirty: bool,
    pub submitting: bool,
}

impl SubmitGate {
    /// Builds the gate from the combined error map (email entry included).
    pub fn from_state(errors: &ErrorMap, email_loading: bool, any_dirty: bool, submitting: bool) -> Self {
        Self {
            sync_errors_empty: errors.is_empty_excluding(Field::Email),
            email_error_empty: !errors.contains(Field::Email),
            email_loading,
            any_dirty,
            submitting,
        }
    }

    /// Enabled only when every input allows it.
    pub const fn is_enabled(&self) -> bool {
        self.sync_errors_empty
            && self.email_error_empty
            && !self.email_loading
            && self.any_dirty
            && !self.submitting
    }

    /// Lists why the gate is closed, consulting `errors` for field names.
    pub fn blockers(&self, errors: &ErrorMap) -> Vec<GateBlocker> {
        let mut blockers: Vec<GateBlocker> = errors
            .iter()
            .filter(|(field, _)| *field != Field::Email)
            .map(|(field, _)| GateBlocker::FieldError(field))
            .collect();
        if !self.email_error_empty {
            blockers.push(GateBlocker::EmailError);
        }
        if self.email_loading {
            blockers.push(GateBlocker::EmailValidating);
        }
        if !self.any_dirty {
            blockers.push(GateBlocker::Pristine);
        }
        if self.submitting {
            blockers.push(GateBlocker::Submitting);
        }
        blockers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FieldError;

    const OPEN: SubmitGate = SubmitGate {
        sync_errors_empty: true,
        email_error_empty: true,
        email_loading: false,
        any_dirty: true,
        submitting: false,
    };

    #[test]
    fn test_enabled_only_when_all_inputs_allow() {
        assert!(OPEN.is_enabled());
        let closed = [
            SubmitGate { sync_errors_empty: false, ..OPEN },
            SubmitGate { email_error_empty: false, ..OPEN },
            SubmitGate { email_loading: true, ..OPEN },
            SubmitGate { any_dirty: false, ..OPEN },
            SubmitGate { submitting: true, ..OPEN },
        ];
        for gate in closed {
            assert!(!gate.is_enabled(), "{gate:?} should be closed");
        }
    }

    #[test]
    fn test_full_truth_table() {
        for bits in 0u8..32 {
            let gate = SubmitGate {
                sync_errors_empty: bits & 1 != 0,
                email_error_empty: bits & 2 != 0,
                email_loading: bits & 4 != 0,
                any_dirty: bits & 8 != 0,
                submitting: bits & 16 != 0,
            };
            assert_eq!(gate.is_enabled(), bits == 0b01011, "bits {bits:05b}");
        }
    }

    #[test]
    fn test_from_state_splits_email_entry() {
        let mut errors = ErrorMap::new();
        errors.set(Field::Email, Some(FieldError::EmailRejected));
        let gate = SubmitGate::from_state(&errors, false, true, false);
        assert!(gate.sync_errors_empty);
        assert!(!gate.email_error_empty);
        assert!(!gate.is_enabled());
        assert_eq!(gate.blockers(&errors), vec![GateBlocker::EmailError]);
    }

    #[test]
    fn test_blockers_name_each_reason() {
        let mut errors = ErrorMap::new();
        errors.set(Field::FirstName, Some(FieldError::Required));
        errors.set(Field::Email, Some(FieldError::Required));
        let gate = SubmitGate::from_state(&errors, true, false, true);
        assert_eq!(
            gate.blockers(&errors),
            vec![
                GateBlocker::FieldError(Field::FirstName),
                GateBlocker::EmailError,
                GateBlocker::EmailValidating,
                GateBlocker::Pristine,
                GateBlocker::Submitting,
            ]
        );
        assert_eq!(
            GateBlocker::FieldError(Field::FirstName).to_string(),
            "First Name has an error"
        );
        assert!(OPEN.blockers(&ErrorMap::new()).is_empty());
    }
}
