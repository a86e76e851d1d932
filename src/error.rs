//! Error taxonomy shared by every engine component.

use std::fmt;

use thiserror::Error;

/// A single field-level validation message, suitable for showing next to a table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("Malformed time code: {0:?}")]
    MalformedTimeCode(String),

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Validation failed: {}", join_field_errors(.0))]
    ValidationFailed(Vec<FieldError>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnnotationError {
    /// Field-level messages for a rejected edit; empty for every other kind.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            AnnotationError::ValidationFailed(errors) => errors,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, AnnotationError>;

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| error.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
