//! Identity service abstraction
//!
//! Sign-in, sign-up and user lookups against the hosted identity store.
//! Implementations keep the active session themselves, the same way the
//! table store picks up its access token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::store::Record;

pub mod memory;
pub mod rest;

/// Metadata key holding the display name
pub const USERNAME_KEY: &str = "username";

/// Authenticated principal as reported by the identity store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Record,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Username from the metadata bag, ignoring empty values
    pub fn username(&self) -> Option<&str> {
        self.user_metadata
            .get(USERNAME_KEY)
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    }
}

/// Active session returned by a successful sign-in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Unix timestamp after which the access token is rejected
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: Identity,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now.timestamp())
    }
}

/// Outcome of a sign-up; the session is absent when confirmation is pending
#[derive(Debug, Clone, PartialEq)]
pub struct SignUp {
    pub user: Option<Identity>,
    pub session: Option<Session>,
}

/// Changes applied to the signed-in identity
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IdentityUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Replacement metadata bag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Record>,
}

impl IdentityUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none() && self.data.is_none()
    }
}

/// Operations offered by the identity store
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authenticate and store the resulting session
    async fn sign_in_with_password(&self, email: &str, password: &str) -> StoreResult<Session>;

    /// Create an account with the given metadata bag
    async fn sign_up(&self, email: &str, password: &str, metadata: Record) -> StoreResult<SignUp>;

    /// End the stored session; a no-op without one
    async fn sign_out(&self) -> StoreResult<()>;

    /// Stored session, refreshed first when it has expired
    async fn session(&self) -> StoreResult<Option<Session>>;

    /// Identity behind the stored session, `None` without one
    async fn user(&self) -> StoreResult<Option<Identity>>;

    /// Update the signed-in identity
    async fn update_user(&self, update: IdentityUpdate) -> StoreResult<Identity>;

    /// Look up any identity by id; needs administrative rights
    async fn user_by_id(&self, id: Uuid) -> StoreResult<Identity>;
}
