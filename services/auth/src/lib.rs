//! Authentication service
//!
//! Thin layer over the identity store: login, registration, logout and
//! session lookups. Failures are logged before they are returned; the
//! current-user and session lookups degrade to `None` instead.

pub mod error;
pub mod service;
pub mod validation;

pub use error::{AuthError, AuthResult};
pub use service::AuthService;
