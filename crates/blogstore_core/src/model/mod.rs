//! Entity records for users, addresses, blog posts and keywords.
//!
//! # Responsibility
//! - Define the plain records persisted by the repository layer.
//! - Keep relationship fields explicit on both sides of each association.
//!
//! # Invariants
//! - Identity (`id`) is `None` until the record is added to a unit-of-work.
//! - Inverse references are updated by explicit mutation, never implicitly.

pub mod address;
pub mod keyword;
pub mod post;
pub mod user;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failures raised before a record reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Required string field is empty or whitespace only.
    EmptyField(&'static str),
    /// String field exceeds the declared column bound.
    TooLong {
        field: &'static str,
        max_chars: usize,
        actual_chars: usize,
    },
    /// Reference to a record that has not been added to a unit-of-work yet.
    UnsavedReference(&'static str),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{field} cannot be empty"),
            Self::TooLong {
                field,
                max_chars,
                actual_chars,
            } => write!(
                f,
                "{field} allows at most {max_chars} characters, got {actual_chars}"
            ),
            Self::UnsavedReference(field) => {
                write!(f, "{field} must be added before it can be referenced")
            }
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn require_non_empty(
    field: &'static str,
    value: &str,
) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::EmptyField(field));
    }
    Ok(())
}

pub(crate) fn require_max_chars(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ModelValidationError> {
    let actual_chars = value.chars().count();
    if actual_chars > max_chars {
        return Err(ModelValidationError::TooLong {
            field,
            max_chars,
            actual_chars,
        });
    }
    Ok(())
}
