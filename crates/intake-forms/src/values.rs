//! Field value store.
//!
//! [`FieldValueStore`] holds the current [`FormValues`] and the per-field
//! touched/dirty flags. It performs no validation and never fails; the
//! form recomputes errors after every mutation.

use std::collections::BTreeMap;

use crate::fields::{Field, FieldValue, FormValues, Gender};

/// Interaction flags for one field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldMeta {
    /// The user has focused or clicked the field.
    pub touched: bool,
    /// The value has been changed at least once.
    pub dirty: bool,
}

/// Current values plus touched/dirty flags for every field.
#[derive(Debug, Clone, Default)]
pub struct FieldValueStore {
    values: FormValues,
    meta: BTreeMap<Field, FieldMeta>,
}

impl FieldValueStore {
    /// Creates a store with empty values and all flags cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces one field's value and marks it dirty.
    pub fn set(&mut self, value: FieldValue) {
        let field = value.field();
        match value {
            FieldValue::FirstName(v) => self.values.first_name = v,
            FieldValue::Surname(v) => self.values.surname = v,
            FieldValue::BirthDate(v) => self.values.birth_date = v,
            FieldValue::Gender(v) => self.values.gender = v,
            FieldValue::Email(v) => self.values.email = v,
        }
        self.meta.entry(field).or_default().dirty = true;
    }

    /// Flips one gender checkbox and marks the gender field dirty.
    ///
    /// Returns `true` if the checkbox is now checked.
    pub fn toggle_gender(&mut self, gender: Gender) -> bool {
        let checked = if self.values.gender.remove(&gender) {
            false
        } else {
            self.values.gender.insert(gender);
            true
        };
        self.meta.entry(Field::Gender).or_default().dirty = true;
        checked
    }

    /// Marks a field as touched. Idempotent.
    pub fn mark_touched(&mut self, field: Field) {
        self.meta.entry(field).or_default().touched = true;
    }

    /// Returns the current values.
    pub const fn values(&self) -> &FormValues {
        &self.values
    }

    /// Returns the flags for `field`.
    pub fn meta(&self, field: Field) -> FieldMeta {
        self.meta.get(&field).copied().unwrap_or_default()
    }

    /// Returns `true` if any field has been changed.
    pub fn any_dirty(&self) -> bool {
        self.meta.values().any(|meta| meta.dirty)
    }

    /// Restores empty values and clears every flag.
    pub fn reset(&mut self) {
        self.values = FormValues::default();
        self.meta.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_pristine() {
        let store = FieldValueStore::new();
        assert!(!store.any_dirty());
        for field in Field::ALL {
            assert_eq!(store.meta(field), FieldMeta::default());
        }
        assert_eq!(store.values(), &FormValues::default());
    }

    #[test]
    fn test_set_marks_dirty_only_that_field() {
        let mut store = FieldValueStore::new();
        store.set(FieldValue::FirstName("John".into()));
        assert_eq!(store.values().first_name, "John");
        assert!(store.meta(Field::FirstName).dirty);
        assert!(!store.meta(Field::FirstName).touched);
        assert!(!store.meta(Field::Email).dirty);
        assert!(store.any_dirty());
    }

    #[test]
    fn test_dirty_survives_return_to_initial_value() {
        let mut store = FieldValueStore::new();
        store.set(FieldValue::Surname("Smith".into()));
        store.set(FieldValue::Surname(String::new()));
        assert!(store.meta(Field::Surname).dirty);
    }

    #[test]
    fn test_mark_touched_is_idempotent() {
        let mut store = FieldValueStore::new();
        store.mark_touched(Field::Email);
        store.mark_touched(Field::Email);
        assert!(store.meta(Field::Email).touched);
        assert!(!store.meta(Field::Email).dirty);
        assert!(!store.any_dirty());
    }

    #[test]
    fn test_toggle_gender_checks_and_unchecks_each_box() {
        let mut store = FieldValueStore::new();
        for gender in Gender::ALL {
            assert!(store.toggle_gender(gender));
        }
        assert_eq!(store.values().gender.len(), 3);
        for gender in Gender::ALL {
            assert!(!store.toggle_gender(gender));
        }
        assert!(store.values().gender.is_empty());
        assert!(store.meta(Field::Gender).dirty);
    }

    #[test]
    fn test_reset_clears_values_and_flags() {
        let mut store = FieldValueStore::new();
        store.set(FieldValue::Email("john@gmail.com".into()));
        store.mark_touched(Field::Email);
        store.reset();
        assert_eq!(store.values(), &FormValues::default());
        assert_eq!(store.meta(Field::Email), FieldMeta::default());
        assert!(!store.any_dirty());
    }
}
