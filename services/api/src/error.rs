//! Custom error types for the API service

use auth::AuthError;
use common::error::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed input, detected before any round trip
    #[error("Validation error: {0}")]
    Validation(String),

    /// A by-id lookup matched no row
    #[error("{resource} {id} not found")]
    NotFound { resource: String, id: String },

    /// A by-id lookup matched more than one row
    #[error("Expected one {resource} row for id {id}, store returned {count}")]
    AmbiguousResult {
        resource: String,
        id: String,
        count: usize,
    },

    /// The operation needs a signed-in identity
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    /// The signed-in identity may not act on the target
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The identity already reviewed this movie
    #[error("Duplicate review: user {user_id} already reviewed movie {movie_id}")]
    DuplicateReview { movie_id: Uuid, user_id: Uuid },

    /// Error reported by the backend, passed through unchanged
    #[error(transparent)]
    Remote(#[from] StoreError),

    /// A record did not have the expected shape
    #[error("Malformed record: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(message) => ApiError::Validation(message),
            AuthError::Remote(e) => ApiError::Remote(e),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        ApiError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
