//! Error types for the AgentDeck domain layer.

use thiserror::Error;

/// Result type for domain operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the record store and the task delegator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Referenced record does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A required field is missing or malformed
    #[error("Invalid value for '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// A record with the same identity already exists
    #[error("{kind} already exists: {key}")]
    Duplicate { kind: &'static str, key: String },

    /// The record is in a state that does not allow the operation
    #[error("{kind} {id} is {state}")]
    InvalidState {
        kind: &'static str,
        id: String,
        state: String,
    },
}

impl CoreError {
    /// Create a not found error
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a duplicate error
    pub fn duplicate(kind: &'static str, key: impl Into<String>) -> Self {
        Self::Duplicate {
            kind,
            key: key.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(
        kind: &'static str,
        id: impl Into<String>,
        state: impl std::fmt::Display,
    ) -> Self {
        Self::InvalidState {
            kind,
            id: id.into(),
            state: state.to_string(),
        }
    }

    /// Whether this error means the referenced record is missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
