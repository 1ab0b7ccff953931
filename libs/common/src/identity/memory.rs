//! In-process identity provider
//!
//! Accounts are confirmed on sign-up, the way a backend with auto-confirm
//! behaves. Administrative lookups are refused unless enabled, mirroring a
//! client that only holds the public key.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Identity, IdentityProvider, IdentityUpdate, Session, SignUp};
use crate::error::{StoreError, StoreResult};
use crate::store::Record;

#[derive(Debug, Clone)]
struct Account {
    identity: Identity,
    password: String,
}

/// In-memory identity store with a single session slot
#[derive(Debug, Default)]
pub struct MemoryIdentity {
    accounts: Mutex<HashMap<Uuid, Account>>,
    session: Mutex<Option<Session>>,
    admin: bool,
    calls: AtomicUsize,
}

fn remote(status: u16, code: &str, message: &str) -> StoreError {
    StoreError::Remote {
        status,
        code: Some(code.to_string()),
        message: message.to_string(),
    }
}

fn issue_session(identity: Identity) -> Session {
    Session {
        access_token: format!("memory-{}", Uuid::new_v4()),
        token_type: "bearer".to_string(),
        refresh_token: Uuid::new_v4().to_string(),
        expires_at: Some((Utc::now() + Duration::hours(1)).timestamp()),
        user: identity,
    }
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `user_by_id` lookups, as a service-role key would
    pub fn with_admin(mut self) -> Self {
        self.admin = true;
        self
    }

    /// Number of trait calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn email_taken(accounts: &HashMap<Uuid, Account>, email: &str, except: Option<Uuid>) -> bool {
    accounts.values().any(|a| {
        Some(a.identity.id) != except
            && a
                .identity
                .email
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case(email))
    })
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> StoreResult<Session> {
        self.touch();
        // Lock order is session before accounts everywhere
        let mut slot = self.session.lock().await;
        let mut accounts = self.accounts.lock().await;

        let account = accounts
            .values_mut()
            .find(|a| {
                a.identity
                    .email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .filter(|a| a.password == password)
            .ok_or_else(|| remote(400, "invalid_credentials", "Invalid login credentials"))?;

        account.identity.last_sign_in_at = Some(Utc::now());
        let session = issue_session(account.identity.clone());
        *slot = Some(session.clone());
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str, metadata: Record) -> StoreResult<SignUp> {
        self.touch();
        let mut slot = self.session.lock().await;
        let mut accounts = self.accounts.lock().await;

        if email_taken(&accounts, email, None) {
            return Err(remote(422, "user_already_exists", "User already registered"));
        }

        let now = Utc::now();
        let identity = Identity {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            user_metadata: metadata,
            created_at: now,
            last_sign_in_at: Some(now),
        };
        accounts.insert(
            identity.id,
            Account {
                identity: identity.clone(),
                password: password.to_string(),
            },
        );

        let session = issue_session(identity.clone());
        *slot = Some(session.clone());
        Ok(SignUp {
            user: Some(identity),
            session: Some(session),
        })
    }

    async fn sign_out(&self) -> StoreResult<()> {
        self.touch();
        *self.session.lock().await = None;
        Ok(())
    }

    async fn session(&self) -> StoreResult<Option<Session>> {
        self.touch();
        Ok(self.session.lock().await.clone())
    }

    async fn user(&self) -> StoreResult<Option<Identity>> {
        self.touch();
        let slot = self.session.lock().await;
        let Some(session) = slot.as_ref() else {
            return Ok(None);
        };

        let accounts = self.accounts.lock().await;
        match accounts.get(&session.user.id) {
            Some(account) => Ok(Some(account.identity.clone())),
            None => Err(remote(404, "user_not_found", "User not found")),
        }
    }

    async fn update_user(&self, update: IdentityUpdate) -> StoreResult<Identity> {
        self.touch();
        let mut session_slot = self.session.lock().await;
        let Some(session) = session_slot.as_mut() else {
            return Err(StoreError::SessionMissing);
        };

        let mut accounts = self.accounts.lock().await;
        if let Some(email) = &update.email {
            if email_taken(&accounts, email, Some(session.user.id)) {
                return Err(remote(
                    422,
                    "email_exists",
                    "A user with this email address has already been registered",
                ));
            }
        }

        let account = accounts
            .get_mut(&session.user.id)
            .ok_or_else(|| remote(404, "user_not_found", "User not found"))?;
        if let Some(email) = update.email {
            account.identity.email = Some(email);
        }
        if let Some(password) = update.password {
            account.password = password;
        }
        if let Some(data) = update.data {
            account.identity.user_metadata = data;
        }

        session.user = account.identity.clone();
        Ok(account.identity.clone())
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Identity> {
        self.touch();
        if !self.admin {
            return Err(remote(403, "not_admin", "User not allowed"));
        }

        self.accounts
            .lock()
            .await
            .get(&id)
            .map(|a| a.identity.clone())
            .ok_or_else(|| remote(404, "user_not_found", "User not found"))
    }
}
