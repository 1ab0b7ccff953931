//! Repositories over the remote catalog
//!
//! Store failures are logged by the executor; failures raised here
//! (validation, missing identity, malformed records) are logged with the
//! operation's prefix before being returned.

use auth::AuthService;
use common::identity::Identity;
use tracing::error;

use crate::error::{ApiError, ApiResult};

pub mod movies;
pub mod reviews;
pub mod users;

/// Log a failure under a human-readable prefix and hand it back
pub(crate) fn failed(context: &str, err: impl Into<ApiError>) -> ApiError {
    let err = err.into();
    error!("{}: {}", context, err);
    err
}

/// Identity behind the active session, or `AuthRequired`
pub(crate) async fn require_identity(auth: &AuthService, context: &str) -> ApiResult<Identity> {
    match auth.get_current_user().await {
        Some(identity) => Ok(identity),
        None => Err(failed(
            context,
            ApiError::AuthRequired("no signed-in user".to_string()),
        )),
    }
}
