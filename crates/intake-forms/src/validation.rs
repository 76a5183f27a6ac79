//! Synchronous validation engine.
//!
//! [`evaluate`] is a pure function from [`FormValues`] to an [`ErrorMap`]
//! covering the fields whose rules need no I/O. Each field is checked
//! independently; there are no cross-field rules. The email entry is owned
//! by [`EmailValidator`](crate::email::EmailValidator) and never produced
//! here.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::errors::FieldError;
use crate::fields::{Field, FieldRules, FormValues};

/// Fields evaluated by the synchronous engine.
pub const SYNC_FIELDS: [Field; 4] = [
    Field::FirstName,
    Field::Surname,
    Field::BirthDate,
    Field::Gender,
];

/// Field name to error. A missing entry means the field is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMap(BTreeMap<Field, FieldError>);

impl ErrorMap {
    /// Creates an empty error map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the error for `field`, if any.
    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.0.get(&field)
    }

    /// Sets or clears the entry for `field`.
    pub fn set(&mut self, field: Field, error: Option<FieldError>) {
        match error {
            Some(error) => {
                self.0.insert(field, error);
            }
            None => {
                self.0.remove(&field);
            }
        }
    }

    /// Returns `true` if `field` has an error.
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Returns `true` if no field has an error.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if no field other than `excluded` has an error.
    pub fn is_empty_excluding(&self, excluded: Field) -> bool {
        self.0.keys().all(|field| *field == excluded)
    }

    /// Returns the number of fields with errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over `(field, error)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldError)> {
        self.0.iter().map(|(field, error)| (*field, error))
    }
}

/// Evaluates every synchronous field against `rules`.
///
/// `today` bounds the birth date; pass the caller's current local date.
pub fn evaluate(values: &FormValues, rules: &FieldRules, today: NaiveDate) -> ErrorMap {
    let mut errors = ErrorMap::new();
    for field in SYNC_FIELDS {
        errors.set(field, evaluate_field(field, values, rules, today));
    }
    errors
}

/// Evaluates a single field. Always `None` for [`Field::Email`].
pub fn evaluate_field(
    field: Field,
    values: &FormValues,
    rules: &FieldRules,
    today: NaiveDate,
) -> Option<FieldError> {
    match field {
        Field::FirstName => {
            let name = &values.first_name;
            if name.is_empty() {
                Some(FieldError::Required)
            } else if name.chars().count() < rules.first_name_min_length {
                Some(FieldError::TooShort {
                    field,
                    min: rules.first_name_min_length,
                })
            } else {
                None
            }
        }
        Field::Surname => (values.surname.chars().count() > rules.surname_max_length).then_some(
            FieldError::TooLong {
                field,
                max: rules.surname_max_length,
            },
        ),
        Field::BirthDate => match values.birth_date {
            Some(date) if date <= today => None,
            _ => Some(FieldError::Required),
        },
        Field::Gender | Field::Email => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn valid_values() -> FormValues {
        FormValues {
            first_name: "John".into(),
            surname: "Smith".into(),
            birth_date: NaiveDate::from_ymd_opt(2000, 1, 2),
            ..FormValues::default()
        }
    }

    #[test]
    fn test_valid_values_have_no_errors() {
        let errors = evaluate(&valid_values(), &FieldRules::default(), today());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_empty_form_errors() {
        let errors = evaluate(&FormValues::default(), &FieldRules::default(), today());
        assert_eq!(errors.get(Field::FirstName), Some(&FieldError::Required));
        assert_eq!(errors.get(Field::BirthDate), Some(&FieldError::Required));
        assert!(!errors.contains(Field::Surname));
        assert!(!errors.contains(Field::Gender));
        assert!(!errors.contains(Field::Email));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_first_name_too_short() {
        let values = FormValues {
            first_name: "Jo".into(),
            ..valid_values()
        };
        let errors = evaluate(&values, &FieldRules::default(), today());
        assert_eq!(
            errors.get(Field::FirstName).unwrap().to_string(),
            "First Name must have more than 2 characters"
        );
    }

    #[test]
    fn test_first_name_three_characters_is_valid() {
        let values = FormValues {
            first_name: "Joh".into(),
            ..valid_values()
        };
        assert_eq!(
            evaluate_field(Field::FirstName, &values, &FieldRules::default(), today()),
            None
        );
    }

    #[test]
    fn test_first_name_counted_as_entered() {
        let rules = FieldRules::default();
        for entered in ["   ", " Jo", "Jo "] {
            let values = FormValues {
                first_name: entered.into(),
                ..valid_values()
            };
            assert_eq!(
                evaluate_field(Field::FirstName, &values, &rules, today()),
                None,
                "{entered:?}"
            );
        }

        let two = FormValues {
            first_name: " J".into(),
            ..valid_values()
        };
        assert!(matches!(
            evaluate_field(Field::FirstName, &two, &rules, today()),
            Some(FieldError::TooShort { .. })
        ));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let values = FormValues {
            first_name: "Zoë".into(),
            surname: "Ølstrøm-Åsé".into(),
            ..valid_values()
        };
        let rules = FieldRules::default();
        assert_eq!(evaluate_field(Field::FirstName, &values, &rules, today()), None);
        assert!(evaluate_field(Field::Surname, &values, &rules, today()).is_some());
    }

    #[test]
    fn test_surname_bounds() {
        let rules = FieldRules::default();
        let ten = FormValues {
            surname: "Abcdefghij".into(),
            ..valid_values()
        };
        assert_eq!(evaluate_field(Field::Surname, &ten, &rules, today()), None);

        let long = FormValues {
            surname: "Prettylongsurname".into(),
            ..valid_values()
        };
        assert_eq!(
            evaluate_field(Field::Surname, &long, &rules, today())
                .unwrap()
                .to_string(),
            "Surname must have less than 11 characters"
        );
    }

    #[test]
    fn test_birth_date_bounds() {
        let rules = FieldRules::default();
        let on_today = FormValues {
            birth_date: Some(today()),
            ..valid_values()
        };
        assert_eq!(evaluate_field(Field::BirthDate, &on_today, &rules, today()), None);

        let tomorrow = FormValues {
            birth_date: today().succ_opt(),
            ..valid_values()
        };
        let error = evaluate_field(Field::BirthDate, &tomorrow, &rules, today());
        assert_eq!(error, Some(FieldError::Required));
        assert_eq!(error.unwrap().to_string(), "Required");
    }

    #[test]
    fn test_custom_rules() {
        let rules = FieldRules {
            first_name_min_length: 5,
            surname_max_length: 3,
        };
        let errors = evaluate(&valid_values(), &rules, today());
        assert_eq!(
            errors.get(Field::FirstName).unwrap().to_string(),
            "First Name must have more than 4 characters"
        );
        assert_eq!(
            errors.get(Field::Surname).unwrap().to_string(),
            "Surname must have less than 4 characters"
        );
    }

    #[test]
    fn test_error_map_is_empty_excluding() {
        let mut errors = ErrorMap::new();
        errors.set(Field::Email, Some(FieldError::Required));
        assert!(errors.is_empty_excluding(Field::Email));
        assert!(!errors.is_empty());
        errors.set(Field::FirstName, Some(FieldError::Required));
        assert!(!errors.is_empty_excluding(Field::Email));
        errors.set(Field::FirstName, None);
        assert!(errors.is_empty_excluding(Field::Email));
        assert_eq!(errors.iter().count(), 1);
    }
}
