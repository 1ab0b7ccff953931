//! Error types for the authentication service

use common::error::StoreError;
use thiserror::Error;

/// Custom error type for authentication operations
#[derive(Error, Debug)]
pub enum AuthError {
    /// Input rejected before contacting the identity store
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error reported by the identity store
    #[error(transparent)]
    Remote(#[from] StoreError),
}

/// Type alias for authentication results
pub type AuthResult<T> = Result<T, AuthError>;
