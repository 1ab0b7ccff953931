//! Custom error types for the common library
//!
//! This module defines the error type returned by every call that crosses
//! the boundary to the hosted backend, whether it targets a table or the
//! identity service.

use thiserror::Error;

/// Postgres SQLSTATE for `unique_violation`
pub const UNIQUE_VIOLATION: &str = "23505";

/// Custom error type for backend operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend has no usable configuration; every call fails with this
    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    /// Error reported by the backend, message passed through verbatim
    #[error("{message}")]
    Remote {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The call needs an active session and none is stored
    #[error("Auth session missing")]
    SessionMissing,

    /// Insert rejected by a unique constraint
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a body we could not interpret
    #[error("Malformed backend response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Build the error for a failed response, classifying constraint conflicts
    pub fn from_response(status: u16, code: Option<String>, message: String) -> Self {
        if status == 409 || code.as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::Conflict(message);
        }

        StoreError::Remote {
            status,
            code,
            message,
        }
    }

    /// Whether this error is a unique constraint conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_status_is_classified() {
        let err = StoreError::from_response(409, None, "duplicate key".to_string());
        assert!(err.is_conflict());
    }

    #[test]
    fn unique_violation_code_is_classified() {
        let err = StoreError::from_response(
            400,
            Some(UNIQUE_VIOLATION.to_string()),
            "duplicate key value violates unique constraint".to_string(),
        );
        assert!(err.is_conflict());
    }

    #[test]
    fn remote_message_is_verbatim() {
        let err = StoreError::from_response(
            401,
            Some("PGRST301".to_string()),
            "JWT expired".to_string(),
        );
        assert!(!err.is_conflict());
        assert_eq!(err.to_string(), "JWT expired");
    }
}
