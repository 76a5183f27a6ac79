//! Field definitions for the person form.
//!
//! [`Field`] names the five inputs, [`FormValues`] holds their current
//! values, and [`FieldRules`] carries the bounds the synchronous engine
//! checks against.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use intake_core::FormSettings;

/// One of the person form's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// Given name, required.
    FirstName,
    /// Family name, optional.
    Surname,
    /// Date of birth, required.
    BirthDate,
    /// Checkbox group, optional.
    Gender,
    /// Email address, required and checked remotely.
    Email,
}

impl Field {
    /// All fields in display order.
    pub const ALL: [Self; 5] = [
        Self::FirstName,
        Self::Surname,
        Self::BirthDate,
        Self::Gender,
        Self::Email,
    ];

    /// The field's wire name, as used in submitted records.
    pub const fn name(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::Surname => "surname",
            Self::BirthDate => "birthDate",
            Self::Gender => "gender",
            Self::Email => "email",
        }
    }

    /// The label shown next to the input.
    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstName => "first name",
            Self::Surname => "surname (optional)",
            Self::BirthDate => "birth date",
            Self::Gender => "gender (optional)",
            Self::Email => "email",
        }
    }

    /// Whether an empty value is an error.
    pub const fn required(self) -> bool {
        matches!(self, Self::FirstName | Self::BirthDate | Self::Email)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FirstName => "First Name",
            Self::Surname => "Surname",
            Self::BirthDate => "Birth Date",
            Self::Gender => "Gender",
            Self::Email => "Email",
        })
    }
}

/// Raised when parsing an unknown field or gender name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{name}'")]
pub struct UnknownName {
    kind: &'static str,
    name: String,
}

impl FromStr for Field {
    type Err = UnknownName;

    /// Accepts the wire name (`firstName`) or its snake case form (`first_name`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace('_', "").to_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.name().to_lowercase() == normalized)
            .ok_or_else(|| UnknownName {
                kind: "field",
                name: s.to_string(),
            })
    }
}

/// A gender checkbox value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// All checkboxes in display order.
    pub const ALL: [Self; 3] = [Self::Male, Self::Female, Self::Other];

    /// The checkbox value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|gender| gender.as_str() == lower)
            .ok_or_else(|| UnknownName {
                kind: "gender",
                name: s.to_string(),
            })
    }
}

/// The current values of every field.
///
/// `gender` is a set: the three checkboxes share one name and toggle
/// independently, so zero, one, or several may be selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormValues {
    pub first_name: String,
    pub surname: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: BTreeSet<Gender>,
    pub email: String,
}

/// A new value for exactly one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    FirstName(String),
    Surname(String),
    BirthDate(Option<NaiveDate>),
    Gender(BTreeSet<Gender>),
    Email(String),
}

impl FieldValue {
    /// The field this value belongs to.
    pub const fn field(&self) -> Field {
        match self {
            Self::FirstName(_) => Field::FirstName,
            Self::Surname(_) => Field::Surname,
            Self::BirthDate(_) => Field::BirthDate,
            Self::Gender(_) => Field::Gender,
            Self::Email(_) => Field::Email,
        }
    }

    /// Parses raw text input for `field`.
    ///
    /// Birth dates use `YYYY-MM-DD`, or `MM/DD/YYYY` as typed into the date
    /// picker; empty text clears the date. Genders are a comma-separated list.
    pub fn parse(field: Field, raw: &str) -> Result<Self, String> {
        match field {
            Field::FirstName => Ok(Self::FirstName(raw.to_string())),
            Field::Surname => Ok(Self::Surname(raw.to_string())),
            Field::Email => Ok(Self::Email(raw.to_string())),
            Field::BirthDate => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Ok(Self::BirthDate(None));
                }
                NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                    .or_else(|_| NaiveDate::parse_from_str(trimmed, "%m/%d/%Y"))
                    .map(|date| Self::BirthDate(Some(date)))
                    .map_err(|_| format!("Enter a valid date (YYYY-MM-DD), got '{trimmed}'"))
            }
            Field::Gender => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<Gender>().map_err(|e| e.to_string()))
                .collect::<Result<BTreeSet<_>, _>>()
                .map(Self::Gender),
        }
    }
}

/// Bounds checked by the synchronous engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRules {
    /// Minimum number of characters in the first name.
    pub first_name_min_length: usize,
    /// Maximum number of characters in the surname.
    pub surname_max_length: usize,
}

impl Default for FieldRules {
    fn default() -> Self {
        Self::from(&FormSettings::default())
    }
}

impl From<&FormSettings> for FieldRules {
    fn from(settings: &FormSettings) -> Self {
        Self {
            first_name_min_length: settings.first_name_min_length,
            surname_max_length: settings.surname_max_length,
        }
    }
}
