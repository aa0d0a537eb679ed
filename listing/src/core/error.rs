//! Typed errors raised by core logic.
//!
//! `WizardError` is the programming-error class: it signals a mismatch between
//! the navigator, the step catalog and the field catalog, never bad user input.
//! `FavoriteError` is the precondition class for favorite mutations.

use std::fmt;

use crate::core::types::FieldKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    /// A step index outside `[0, count)` reached the step selector.
    InvalidStepIndex { index: usize, count: usize },
    /// A field name that is not part of the field catalog.
    UnknownField(String),
    /// A value whose shape does not match the field's declared kind.
    ValueKindMismatch { field: String, expected: FieldKind },
}

impl fmt::Display for WizardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStepIndex { index, count } => {
                write!(f, "invalid step index {} (wizard has {} steps)", index, count)
            }
            Self::UnknownField(name) => write!(f, "unknown field '{}'", name),
            Self::ValueKindMismatch { field, expected } => {
                write!(f, "field '{}' expects a {} value", field, expected)
            }
        }
    }
}

impl std::error::Error for WizardError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoriteError {
    /// No authenticated user could be resolved for the request.
    Unauthenticated,
    /// The listing identifier is missing or malformed.
    InvalidListingId(String),
}

impl fmt::Display for FavoriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "no authenticated user"),
            Self::InvalidListingId(id) => write!(f, "invalid listing id '{}'", id),
        }
    }
}

impl std::error::Error for FavoriteError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_step_index_names_bounds() {
        let err = WizardError::InvalidStepIndex { index: 7, count: 6 };
        assert_eq!(err.to_string(), "invalid step index 7 (wizard has 6 steps)");
    }

    #[test]
    fn favorite_errors_survive_anyhow_downcast() {
        let err = anyhow::Error::new(FavoriteError::Unauthenticated);
        assert_eq!(
            err.downcast_ref::<FavoriteError>(),
            Some(&FavoriteError::Unauthenticated)
        );
    }
}
