//! User-facing field errors.
//!
//! A [`FieldError`] is what ends up in the form's error map and, once the
//! field is touched, on screen. None of them is fatal: every one clears
//! once the user enters an acceptable value.

use thiserror::Error;

use crate::fields::Field;

/// A validation failure attached to a single field.
///
/// The `Display` output is the exact message shown next to the field. The
/// two email variants share one message so that a transport failure is
/// indistinguishable from an explicit rejection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The field is required and has no value. A birth date after today
    /// also counts as missing.
    #[error("Required")]
    Required,

    /// The value has fewer characters than allowed.
    #[error("{field} must have more than {below} characters", below = .min.saturating_sub(1))]
    TooShort {
        /// The offending field.
        field: Field,
        /// Minimum number of characters.
        min: usize,
    },

    /// The value has more characters than allowed.
    #[error("{field} must have less than {above} characters", above = .max.saturating_add(1))]
    TooLong {
        /// The offending field.
        field: Field,
        /// Maximum number of characters.
        max: usize,
    },

    /// The remote service reported the address invalid.
    #[error("Email not valid")]
    EmailRejected,

    /// The remote check failed (network, timeout, malformed response).
    #[error("Email not valid")]
    EmailUnverified,
}

impl FieldError {
    /// Returns a short code identifying the kind of failure.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::TooShort { .. } => "min_length",
            Self::TooLong { .. } => "max_length",
            Self::EmailRejected => "email_rejected",
            Self::EmailUnverified => "email_unverified",
        }
    }

    /// Returns `true` for errors produced by the remote email check.
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::EmailRejected | Self::EmailUnverified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_form_copy() {
        assert_eq!(FieldError::Required.to_string(), "Required");
        assert_eq!(
            FieldError::TooShort {
                field: Field::FirstName,
                min: 3
            }
            .to_string(),
            "First Name must have more than 2 characters"
        );
        assert_eq!(
            FieldError::TooLong {
                field: Field::Surname,
                max: 10
            }
            .to_string(),
            "Surname must have less than 11 characters"
        );
        assert_eq!(FieldError::EmailRejected.to_string(), "Email not valid");
        assert_eq!(FieldError::EmailUnverified.to_string(), "Email not valid");
    }

    #[test]
    fn test_codes() {
        assert_eq!(FieldError::Required.code(), "required");
        assert_eq!(
            FieldError::TooShort {
                field: Field::FirstName,
                min: 3
            }
            .code(),
            "min_length"
        );
        assert_eq!(FieldError::EmailUnverified.code(), "email_unverified");
        assert!(FieldError::EmailRejected.is_remote());
        assert!(!FieldError::Required.is_remote());
    }
}
