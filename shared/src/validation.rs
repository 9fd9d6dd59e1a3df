//! Validation utilities for the Pollination Monitor
//!
//! Checks applied to identifiers and filters before they are forwarded to
//! the evaluations API.

use thiserror::Error;

/// Longest identifier forwarded upstream
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Longest date key accepted in a selection
pub const MAX_DATE_KEY_LEN: usize = 64;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} is too long (max {max} characters)")]
    TooLong { field: &'static str, max: usize },

    #[error("{0} contains invalid characters")]
    InvalidCharacters(&'static str),
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Empty(field)
            | ValidationError::InvalidCharacters(field)
            | ValidationError::TooLong { field, .. } => *field,
        }
    }
}

/// Validate a farm or evaluation identifier used in an upstream path segment
pub fn validate_identifier(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    if value.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_IDENTIFIER_LEN,
        });
    }
    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidCharacters(field));
    }
    Ok(())
}

/// Validate an optional date filter.
///
/// Filters are matched verbatim against the date grouping keys, so no date
/// format is required.
pub fn validate_date_filter(value: Option<&str>) -> Result<(), ValidationError> {
    let date = match value.map(str::trim) {
        None | Some("") => return Ok(()),
        Some(date) => date,
    };
    if date.chars().count() > MAX_DATE_KEY_LEN {
        return Err(ValidationError::TooLong {
            field: "date",
            max: MAX_DATE_KEY_LEN,
        });
    }
    if date.chars().any(char::is_control) {
        return Err(ValidationError::InvalidCharacters("date"));
    }
    Ok(())
}
