//! Identity provider backed by the hosted auth API

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};
use uuid::Uuid;

use super::{Identity, IdentityProvider, IdentityUpdate, Session, SignUp};
use crate::client::{BackendClient, error_from_response, send_json};
use crate::error::{StoreError, StoreResult};
use crate::store::Record;

/// REST identity provider sharing the session slot of a [`BackendClient`]
#[derive(Clone)]
pub struct RestIdentity {
    client: BackendClient,
}

impl RestIdentity {
    /// Create a new identity provider over a shared client
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityProvider for RestIdentity {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> StoreResult<Session> {
        let url = self.client.config().auth_url("token?grant_type=password");
        let request = self
            .client
            .request_as(Method::POST, &url, &self.client.config().anon_key)
            .json(&json!({ "email": email, "password": password }));

        let session: Session = send_json(request).await?;
        self.client.set_session(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str, metadata: Record) -> StoreResult<SignUp> {
        let url = self.client.config().auth_url("signup");
        let request = self
            .client
            .request_as(Method::POST, &url, &self.client.config().anon_key)
            .json(&json!({ "email": email, "password": password, "data": metadata }));

        // With auto-confirm the body is a session, otherwise the bare user
        let body: Value = send_json(request).await?;
        if body.get("access_token").is_some() {
            let session: Session =
                serde_json::from_value(body).map_err(|e| StoreError::Decode(e.to_string()))?;
            self.client.set_session(Some(session.clone()));
            return Ok(SignUp {
                user: Some(session.user.clone()),
                session: Some(session),
            });
        }

        let user: Identity =
            serde_json::from_value(body).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(SignUp {
            user: Some(user),
            session: None,
        })
    }

    async fn sign_out(&self) -> StoreResult<()> {
        let Some(session) = self.client.session() else {
            return Ok(());
        };
        self.client.set_session(None);

        let url = self.client.config().auth_url("logout");
        let response = self
            .client
            .request_as(Method::POST, &url, &session.access_token)
            .send()
            .await?;

        // Tokens the server already forgot count as signed out
        match response.status().as_u16() {
            200..=299 | 401 | 403 | 404 => Ok(()),
            _ => Err(error_from_response(response).await),
        }
    }

    async fn session(&self) -> StoreResult<Option<Session>> {
        self.client.active_session().await
    }

    async fn user(&self) -> StoreResult<Option<Identity>> {
        let Some(session) = self.session().await? else {
            return Ok(None);
        };

        let url = self.client.config().auth_url("user");
        let request = self
            .client
            .request_as(Method::GET, &url, &session.access_token);
        let user: Identity = send_json(request).await?;
        Ok(Some(user))
    }

    async fn update_user(&self, update: IdentityUpdate) -> StoreResult<Identity> {
        let Some(mut session) = self.session().await? else {
            return Err(StoreError::SessionMissing);
        };

        let url = self.client.config().auth_url("user");
        let request = self
            .client
            .request_as(Method::PUT, &url, &session.access_token)
            .json(&update);
        let user: Identity = send_json(request).await?;

        session.user = user.clone();
        self.client.set_session(Some(session));
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Identity> {
        let url = self.client.config().auth_url(&format!("admin/users/{}", id));
        let request = self.client.request(Method::GET, &url).await?;
        send_json(request).await
    }
}
