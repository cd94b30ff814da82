//! Typed domain records for parties, laws and categories.
//!
//! # Responsibility
//! - Define the Rust shape of every persisted row.
//! - Validate field limits before rows reach SQL.
//!
//! # Invariants
//! - Every base record is identified by an 18-character `RecordId`.
//! - Identifiers are generated, never taken from user input.
//!
//! # See also
//! - `crate::schema` for the table-level declarations.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod associations;
pub mod category;
pub mod enums;
pub mod id;
pub mod law;
pub mod party;

/// Field-level validation failure for a domain record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    InvalidId(String),
    EmptyField(&'static str),
    TooLong {
        field: &'static str,
        max_chars: usize,
        actual: usize,
    },
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId(value) => write!(f, "invalid record id `{value}`"),
            Self::EmptyField(field) => write!(f, "{field} cannot be empty"),
            Self::TooLong {
                field,
                max_chars,
                actual,
            } => write!(
                f,
                "{field} is {actual} characters long; at most {max_chars} allowed"
            ),
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn check_id(value: &str) -> Result<(), ModelValidationError> {
    if id::is_valid_id(value) {
        Ok(())
    } else {
        Err(ModelValidationError::InvalidId(value.to_string()))
    }
}

pub(crate) fn check_required(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::EmptyField(field));
    }
    check_len(field, value, max_chars)
}

pub(crate) fn check_optional(
    field: &'static str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<(), ModelValidationError> {
    match value {
        Some(value) => check_len(field, value, max_chars),
        None => Ok(()),
    }
}

fn check_len(field: &'static str, value: &str, max_chars: usize) -> Result<(), ModelValidationError> {
    let actual = value.chars().count();
    if actual > max_chars {
        return Err(ModelValidationError::TooLong {
            field,
            max_chars,
            actual,
        });
    }
    Ok(())
}
