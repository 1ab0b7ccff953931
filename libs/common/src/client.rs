//! Backend client handle
//!
//! One [`BackendClient`] is built at startup and shared by the REST table
//! store and the REST identity provider. It owns the HTTP client, the
//! configuration and the slot holding the active session; the session's
//! access token is what row-level security sees on every table request.
//! Expired sessions are refreshed before the token is presented.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::config::BackendConfig;
use crate::error::{StoreError, StoreResult};
use crate::identity::Session;

/// Shared handle to the hosted backend
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    config: Arc<BackendConfig>,
    session: Arc<RwLock<Option<Session>>>,
}

impl BackendClient {
    /// Build the client for a validated configuration
    pub fn new(config: BackendConfig) -> StoreResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        info!("Backend client initialized for {}", config.url);
        Ok(Self {
            http,
            config: Arc::new(config),
            session: Arc::new(RwLock::new(None)),
        })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Currently stored session, if any
    pub fn session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the stored session
    pub fn set_session(&self, session: Option<Session>) {
        *self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Stored session, refreshed first if it has expired
    ///
    /// An expired session without a refresh token, or one the server will
    /// not refresh, is dropped from the slot.
    pub async fn active_session(&self) -> StoreResult<Option<Session>> {
        let Some(session) = self.session() else {
            return Ok(None);
        };
        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }
        if session.refresh_token.is_empty() {
            warn!("Session expired without refresh token");
            self.set_session(None);
            return Ok(None);
        }

        match self.refresh(&session.refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(e) => {
                self.set_session(None);
                Err(e)
            }
        }
    }

    async fn refresh(&self, refresh_token: &str) -> StoreResult<Session> {
        info!("Refreshing expired session");

        let url = self.config.auth_url("token?grant_type=refresh_token");
        let request = self
            .request_as(Method::POST, &url, &self.config.anon_key)
            .json(&json!({ "refresh_token": refresh_token }));

        let session: Session = send_json(request).await?;
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    /// Token presented as bearer: the active session's access token, else the anon key
    pub async fn bearer(&self) -> StoreResult<String> {
        Ok(self
            .active_session()
            .await?
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.config.anon_key.clone()))
    }

    /// Request carrying the API key and the current bearer token
    pub async fn request(&self, method: Method, url: &str) -> StoreResult<RequestBuilder> {
        let token = self.bearer().await?;
        Ok(self.request_as(method, url, &token))
    }

    /// Request carrying the API key and an explicit bearer token
    pub fn request_as(&self, method: Method, url: &str, token: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
    }
}

/// Send a request and decode a successful JSON body
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> StoreResult<T> {
    let response = send(request).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| StoreError::Decode(e.to_string()))
}

/// Send a request, turning non-success statuses into errors
pub(crate) async fn send(request: RequestBuilder) -> StoreResult<Response> {
    let response = request.send().await?;
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(error_from_response(response).await)
    }
}

/// Extract the backend's own error message and code from a failed response
pub(crate) async fn error_from_response(response: Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let (code, message) = parse_error_body(status, &body);
    StoreError::from_response(status, code, message)
}

fn parse_error_body(status: u16, body: &str) -> (Option<String>, String) {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    let code = parsed.as_ref().and_then(|v| {
        v.get("code")
            .or_else(|| v.get("error_code"))
            .filter(|c| !c.is_null())
            .map(|c| match c {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    });

    let message = parsed
        .as_ref()
        .and_then(|v| {
            ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                body.trim().to_string()
            }
        });

    (code, message)
}
