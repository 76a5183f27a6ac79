//! Bound fields: a field paired with its value, flags, and error.
//!
//! A [`BoundField`] is the read-only projection a front end renders for
//! one input. It decides when an error is shown (only after the field is
//! touched, and never for the email while its check is loading) and which
//! status class the input carries.

use crate::errors::FieldError;
use crate::fields::{Field, FormValues};
use crate::values::FieldMeta;

/// Visual status of an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStatus {
    /// Untouched, or touched while loading.
    Neutral,
    /// Touched and valid.
    Success,
    /// Touched with an error.
    Error,
}

impl FieldStatus {
    /// The CSS class for this status, empty when neutral.
    pub const fn as_class(self) -> &'static str {
        match self {
            Self::Neutral => "",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// A field bound to the form's current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundField {
    /// Which input this is.
    pub field: Field,
    /// The current value rendered as text.
    pub value: String,
    /// The field's error, shown or not.
    pub error: Option<FieldError>,
    /// Touched/dirty flags.
    pub meta: FieldMeta,
    /// An email check is in flight (email only).
    pub loading: bool,
}

impl BoundField {
    /// Creates a bound field from the form's current state.
    pub fn new(
        field: Field,
        values: &FormValues,
        meta: FieldMeta,
        error: Option<FieldError>,
        loading: bool,
    ) -> Self {
        Self {
            field,
            value: display_value(field, values),
            error,
            meta,
            loading: loading && field == Field::Email,
        }
    }

    /// The label shown next to the input.
    pub const fn label(&self) -> &'static str {
        self.field.label()
    }

    /// Whether the error message should be on screen.
    pub const fn error_visible(&self) -> bool {
        self.error.is_some() && self.meta.touched && !self.loading
    }

    /// The error to display, if it is visible.
    pub fn visible_error(&self) -> Option<&FieldError> {
        self.error.as_ref().filter(|_| self.error_visible())
    }

    /// The status class. Loading suppresses both success and error.
    pub const fn status(&self) -> FieldStatus {
        if !self.meta.touched || self.loading {
            FieldStatus::Neutral
        } else if self.error.is_some() {
            FieldStatus::Error
        } else {
            FieldStatus::Success
        }
    }
}

fn display_value(field: Field, values: &FormValues) -> String {
    match field {
        Field::FirstName => values.first_name.clone(),
        Field::Surname => values.surname.clone(),
        Field::BirthDate => values
            .birth_date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Field::Gender => values
            .gender
            .iter()
            .map(|gender| gender.as_str())
            .collect::<Vec<_>>()
            .join(","),
        Field::Email => values.email.clone(),
    }
}
