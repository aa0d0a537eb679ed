//! Field catalog and the Field Store.
//!
//! The store is the single source of truth for wizard input. Every write goes
//! through [`FieldStore::set`], which records the value, clears the field's
//! previous error, re-validates that field and bumps the store revision so
//! observers can detect the change on their next read.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use serde::Serialize;

use crate::core::counter::MIN_COUNT;
use crate::core::error::WizardError;
use crate::core::types::{
    CountrySelection, FieldDescriptor, FieldName, FieldValue, FormatHint, ListingDraft,
};

static CATALOG: LazyLock<Vec<FieldDescriptor>> = LazyLock::new(|| {
    FieldName::ALL.into_iter().map(build_descriptor).collect()
});

fn build_descriptor(name: FieldName) -> FieldDescriptor {
    let (default_value, required, format_hint) = match name {
        FieldName::Category => (FieldValue::text(""), false, FormatHint::Plain),
        FieldName::Location => (FieldValue::Location(None), false, FormatHint::Country),
        FieldName::GuestCount | FieldName::RoomCount | FieldName::BathroomCount => {
            (FieldValue::Number(MIN_COUNT), false, FormatHint::Count)
        }
        FieldName::ImageSrc => (FieldValue::text(""), false, FormatHint::Image),
        FieldName::Price => (FieldValue::Number(1), true, FormatHint::Currency),
        FieldName::Title | FieldName::Description => {
            (FieldValue::text(""), true, FormatHint::Plain)
        }
    };
    FieldDescriptor {
        name,
        default_value,
        required,
        format_hint,
    }
}

/// Descriptors for every field, in catalog order.
pub fn catalog() -> &'static [FieldDescriptor] {
    &CATALOG
}

/// Descriptor for a single field.
pub fn descriptor(name: FieldName) -> &'static FieldDescriptor {
    // The catalog is built from `FieldName::ALL`, so every name has an entry.
    &CATALOG[name as usize]
}

/// Validation failure attached to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldError {
    Required,
    TooSmall { min: u64 },
}

impl FieldError {
    pub fn message(&self) -> String {
        match self {
            Self::Required => "This field is required".to_string(),
            Self::TooSmall { min } => format!("Must be at least {}", min),
        }
    }
}

/// Record of an accepted write, handed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub name: FieldName,
    pub revision: u64,
    pub error: Option<FieldError>,
}

/// Current values, validation errors and touched flags for every field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStore {
    values: BTreeMap<FieldName, FieldValue>,
    errors: BTreeMap<FieldName, FieldError>,
    touched: BTreeSet<FieldName>,
    revision: u64,
}

impl Default for FieldStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldStore {
    /// Store with every field at its catalog default.
    pub fn new() -> Self {
        let values = catalog()
            .iter()
            .map(|d| (d.name, d.default_value.clone()))
            .collect();
        Self {
            values,
            errors: BTreeMap::new(),
            touched: BTreeSet::new(),
            revision: 0,
        }
    }

    pub fn get(&self, name: FieldName) -> &FieldValue {
        self.values
            .get(&name)
            .unwrap_or(&descriptor(name).default_value)
    }

    /// Write a value, mark the field touched and re-validate it.
    pub fn set(&mut self, name: FieldName, value: FieldValue) -> Result<FieldChange, WizardError> {
        let desc = descriptor(name);
        if value.kind() != desc.kind() {
            return Err(WizardError::ValueKindMismatch {
                field: name.to_string(),
                expected: desc.kind(),
            });
        }

        self.values.insert(name, value);
        self.touched.insert(name);
        self.errors.remove(&name);
        let error = self.check(name);
        if let Some(err) = &error {
            self.errors.insert(name, err.clone());
        }
        self.revision += 1;

        Ok(FieldChange {
            name,
            revision: self.revision,
            error,
        })
    }

    /// Parse a field name from a payload key, then [`set`](Self::set) it.
    pub fn set_by_key(&mut self, key: &str, value: FieldValue) -> Result<FieldChange, WizardError> {
        let name: FieldName = key.parse()?;
        self.set(name, value)
    }

    /// Run the validation rules for `names`, recording or clearing errors.
    ///
    /// Returns the names that failed, in catalog order.
    pub fn validate(&mut self, names: &[FieldName]) -> Vec<FieldName> {
        let mut failed = Vec::new();
        for &name in names {
            match self.check(name) {
                Some(err) => {
                    self.errors.insert(name, err);
                    failed.push(name);
                }
                None => {
                    self.errors.remove(&name);
                }
            }
        }
        failed.sort();
        failed.dedup();
        if !failed.is_empty() {
            self.revision += 1;
        }
        failed
    }

    /// Validate every field in the catalog.
    pub fn validate_all(&mut self) -> Vec<FieldName> {
        self.validate(&FieldName::ALL)
    }

    fn check(&self, name: FieldName) -> Option<FieldError> {
        let desc = descriptor(name);
        match self.get(name) {
            FieldValue::Number(n) if desc.format_hint == FormatHint::Count && *n < MIN_COUNT => {
                Some(FieldError::TooSmall { min: MIN_COUNT })
            }
            FieldValue::Number(0) if desc.required => Some(FieldError::TooSmall { min: 1 }),
            FieldValue::Text(s) if desc.required && s.trim().is_empty() => {
                Some(FieldError::Required)
            }
            FieldValue::Location(None) if desc.required => Some(FieldError::Required),
            _ => None,
        }
    }

    pub fn error(&self, name: FieldName) -> Option<&FieldError> {
        self.errors.get(&name)
    }

    pub fn errors(&self) -> &BTreeMap<FieldName, FieldError> {
        &self.errors
    }

    pub fn is_touched(&self, name: FieldName) -> bool {
        self.touched.contains(&name)
    }

    /// Monotonic counter bumped by every accepted write or validation failure.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn text(&self, name: FieldName) -> &str {
        match self.get(name) {
            FieldValue::Text(s) => s,
            _ => "",
        }
    }

    pub fn number(&self, name: FieldName) -> u64 {
        match self.get(name) {
            FieldValue::Number(n) => *n,
            _ => 0,
        }
    }

    pub fn location(&self) -> Option<&CountrySelection> {
        match self.get(FieldName::Location) {
            FieldValue::Location(loc) => loc.as_ref(),
            _ => None,
        }
    }

    /// Snapshot of every field in the shape the listing store accepts.
    pub fn draft(&self) -> ListingDraft {
        ListingDraft {
            category: self.text(FieldName::Category).to_string(),
            location: self.location().cloned(),
            guest_count: self.number(FieldName::GuestCount),
            room_count: self.number(FieldName::RoomCount),
            bathroom_count: self.number(FieldName::BathroomCount),
            image_src: self.text(FieldName::ImageSrc).to_string(),
            price: self.number(FieldName::Price),
            title: self.text(FieldName::Title).to_string(),
            description: self.text(FieldName::Description).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_catalog() {
        let store = FieldStore::new();
        assert_eq!(store.get(FieldName::Category), &FieldValue::text(""));
        assert_eq!(store.get(FieldName::Location), &FieldValue::Location(None));
        assert_eq!(store.number(FieldName::GuestCount), 1);
        assert_eq!(store.number(FieldName::Price), 1);
        assert!(store.errors().is_empty());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn catalog_is_indexed_by_field_name() {
        for name in FieldName::ALL {
            assert_eq!(descriptor(name).name, name);
        }
        let required: Vec<FieldName> = catalog()
            .iter()
            .filter(|d| d.required)
            .map(|d| d.name)
            .collect();
        assert_eq!(
            required,
            vec![FieldName::Price, FieldName::Title, FieldName::Description]
        );
    }

    #[test]
    fn set_revalidates_and_clears_previous_error() {
        let mut store = FieldStore::new();
        let failed = store.validate(&[FieldName::Title]);
        assert_eq!(failed, vec![FieldName::Title]);
        assert_eq!(store.error(FieldName::Title), Some(&FieldError::Required));

        let change = store
            .set(FieldName::Title, FieldValue::text("Cabin"))
            .expect("set");
        assert_eq!(change.error, None);
        assert!(store.error(FieldName::Title).is_none());
        assert!(store.is_touched(FieldName::Title));
        assert_eq!(store.text(FieldName::Title), "Cabin");
    }

    #[test]
    fn set_records_new_error_for_invalid_value() {
        let mut store = FieldStore::new();
        let change = store
            .set(FieldName::RoomCount, FieldValue::Number(0))
            .expect("set");
        assert_eq!(change.error, Some(FieldError::TooSmall { min: 1 }));
        assert_eq!(
            store.error(FieldName::RoomCount),
            Some(&FieldError::TooSmall { min: 1 })
        );
    }

    #[test]
    fn set_rejects_wrong_kind() {
        let mut store = FieldStore::new();
        let err = store
            .set(FieldName::Price, FieldValue::text("100"))
            .unwrap_err();
        assert!(matches!(err, WizardError::ValueKindMismatch { .. }));
        assert_eq!(store.number(FieldName::Price), 1);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn unknown_key_fails_fast() {
        let mut store = FieldStore::new();
        let err = store
            .set_by_key("bedrooms", FieldValue::Number(2))
            .unwrap_err();
        assert_eq!(err, WizardError::UnknownField("bedrooms".to_string()));
    }

    #[test]
    fn revision_increases_per_write() {
        let mut store = FieldStore::new();
        store
            .set(FieldName::Category, FieldValue::text("Beach"))
            .expect("set");
        store
            .set(FieldName::Category, FieldValue::text("Lake"))
            .expect("set");
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn draft_reflects_current_values() {
        let mut store = FieldStore::new();
        store.set(FieldName::Title, FieldValue::text("Cabin")).expect("set");
        store.set(FieldName::Price, FieldValue::Number(100)).expect("set");
        let draft = store.draft();
        assert_eq!(draft.title, "Cabin");
        assert_eq!(draft.price, 100);
        assert_eq!(draft.guest_count, 1);
        assert!(draft.location.is_none());
    }
}
