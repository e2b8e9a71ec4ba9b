//! Core error model shared by every stockroom crate.

use thiserror::Error;

/// Result type used across the domain and service layers.
pub type CoreResult<T> = Result<T, CoreError>;

/// Coarse error classification handed to the request layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidState,
    Validation,
    Store,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::Validation => "validation_error",
            ErrorKind::Store => "store_error",
        }
    }
}

/// Error returned by every core operation.
///
/// Deterministic business failures (validation, lifecycle, uniqueness) are kept
/// apart from `Store`, which is reserved for persistence failures that are not
/// attributable to caller input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness constraint was violated (duplicate SKU, code, username, id).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation violates a lifecycle or numeric invariant.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Malformed input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Underlying persistence failure.
    #[error("store error: {0}")]
    Store(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::Conflict(_) => ErrorKind::Conflict,
            CoreError::InvalidState(_) => ErrorKind::InvalidState,
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::Store(_) => ErrorKind::Store,
        }
    }
}
