//! Stand-in backend used when configuration is missing
//!
//! Keeps the service layer constructible so callers get a typed
//! `NotConfigured` error per call instead of a crash at startup.

use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use super::RemoteStore;
use super::query::{Query, Record, Rows};
use crate::error::{StoreError, StoreResult};
use crate::identity::{Identity, IdentityProvider, IdentityUpdate, Session, SignUp};

/// Backend that fails every call with the reason it is unavailable
#[derive(Debug, Clone)]
pub struct Disconnected {
    reason: String,
}

impl Disconnected {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail<T>(&self, operation: &str) -> StoreResult<T> {
        warn!("Rejected {} on unconfigured backend", operation);
        Err(StoreError::NotConfigured(self.reason.clone()))
    }
}

#[async_trait]
impl RemoteStore for Disconnected {
    async fn select(&self, _resource: &str, _query: &Query) -> StoreResult<Rows> {
        self.fail("select")
    }

    async fn insert(&self, _resource: &str, _records: Vec<Record>) -> StoreResult<Vec<Record>> {
        self.fail("insert")
    }

    async fn update(
        &self,
        _resource: &str,
        _query: &Query,
        _patch: Record,
    ) -> StoreResult<Vec<Record>> {
        self.fail("update")
    }

    async fn delete(&self, _resource: &str, _query: &Query) -> StoreResult<Vec<Record>> {
        self.fail("delete")
    }
}

#[async_trait]
impl IdentityProvider for Disconnected {
    async fn sign_in_with_password(&self, _email: &str, _password: &str) -> StoreResult<Session> {
        self.fail("sign in")
    }

    async fn sign_up(&self, _email: &str, _password: &str, _metadata: Record) -> StoreResult<SignUp> {
        self.fail("sign up")
    }

    async fn sign_out(&self) -> StoreResult<()> {
        self.fail("sign out")
    }

    async fn session(&self) -> StoreResult<Option<Session>> {
        self.fail("session lookup")
    }

    async fn user(&self) -> StoreResult<Option<Identity>> {
        self.fail("user lookup")
    }

    async fn update_user(&self, _update: IdentityUpdate) -> StoreResult<Identity> {
        self.fail("user update")
    }

    async fn user_by_id(&self, _id: Uuid) -> StoreResult<Identity> {
        self.fail("admin user lookup")
    }
}
