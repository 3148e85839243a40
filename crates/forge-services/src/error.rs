//! Service error types.

use thiserror::Error;

/// Errors constructing or running a collaborator helper.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Rejections from [`parse_theme_response`](crate::theme::parse_theme_response).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("empty field: {0}")]
    EmptyField(&'static str),

    #[error("field given more than once: {0}")]
    DuplicateField(&'static str),

    #[error("{field} is {len} characters, limit is {max}")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        len: usize,
    },
}
