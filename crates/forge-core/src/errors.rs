//! Cross-cutting error types for ProxyForge.
//!
//! Domain-specific errors (e.g., `DatabaseError`, `SchemaError`) are defined in
//! their respective crates.

use thiserror::Error;

/// Errors that can be raised by any ProxyForge crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// A string could not be parsed into one of the closed enums.
    #[error("Unknown {kind} value: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    /// Data failed validation (schema, format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
