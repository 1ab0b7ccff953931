//! Backend configuration
//!
//! The hosted backend is addressed by a project URL and a public (anon) API
//! key. Both are read from `SUPABASE_*` environment variables.

use config::{Config, Environment};
use reqwest::Url;
use serde::Deserialize;

use crate::error::{StoreError, StoreResult};

/// Default timeout applied to every backend request, in seconds
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Raw settings as found in the environment, before validation
#[derive(Debug, Clone, Default, Deserialize)]
struct RawSettings {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    anon_key: Option<String>,
    #[serde(default)]
    request_timeout: Option<u64>,
}

/// Backend configuration struct
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Project URL, without trailing slash
    pub url: String,
    /// Public API key sent as `apikey` and as the default bearer token
    pub anon_key: String,
    /// Request timeout in seconds
    pub request_timeout: u64,
}

impl BackendConfig {
    /// Create a configuration from explicit values
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> StoreResult<Self> {
        let url = url.into();
        let anon_key = anon_key.into();
        Self::validate(Some(url), Some(anon_key), None)
    }

    /// Create a new BackendConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SUPABASE_URL`: project URL (required)
    /// - `SUPABASE_ANON_KEY`: public API key (required)
    /// - `SUPABASE_REQUEST_TIMEOUT`: request timeout in seconds (default: 30)
    pub fn from_env() -> StoreResult<Self> {
        let raw: RawSettings = Config::builder()
            .add_source(Environment::with_prefix("SUPABASE"))
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| StoreError::NotConfigured(format!("Invalid environment: {}", e)))?;

        Self::validate(raw.url, raw.anon_key, raw.request_timeout)
    }

    fn validate(
        url: Option<String>,
        anon_key: Option<String>,
        request_timeout: Option<u64>,
    ) -> StoreResult<Self> {
        let url = url.map(|u| u.trim().trim_end_matches('/').to_string());
        let anon_key = anon_key.map(|k| k.trim().to_string());

        let (url, anon_key) = match (url, anon_key) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => (url, key),
            _ => {
                return Err(StoreError::NotConfigured(
                    "Missing environment variables SUPABASE_URL or SUPABASE_ANON_KEY".to_string(),
                ));
            }
        };

        let parsed = Url::parse(&url)
            .map_err(|e| StoreError::NotConfigured(format!("Invalid SUPABASE_URL: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StoreError::NotConfigured(format!(
                "Invalid SUPABASE_URL scheme: {}",
                parsed.scheme()
            )));
        }

        Ok(Self {
            url,
            anon_key,
            request_timeout: request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        })
    }

    /// Endpoint of a table resource
    pub fn rest_url(&self, resource: &str) -> String {
        format!("{}/rest/v1/{}", self.url, resource)
    }

    /// Endpoint of the identity service
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path.trim_start_matches('/'))
    }
}
