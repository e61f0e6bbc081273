//! Error types for field access.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while reading or writing object fields.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The type declares no field with this name.
    #[error("{entity_type} has no field named {field}")]
    UnknownField { entity_type: String, field: String },

    /// Conversion between a typed field and its JSON value failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ModelError {
    /// Shorthand for [`ModelError::UnknownField`].
    pub fn unknown_field(entity_type: &str, field: &str) -> Self {
        Self::UnknownField {
            entity_type: entity_type.to_string(),
            field: field.to_string(),
        }
    }
}
