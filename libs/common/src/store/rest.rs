//! PostgREST-backed table store

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use super::RemoteStore;
use super::query::{Query, Record, Rows};
use crate::client::{BackendClient, send, send_json};
use crate::error::{StoreError, StoreResult};

/// Table store speaking the hosted backend's REST dialect
#[derive(Clone)]
pub struct RestStore {
    client: BackendClient,
}

impl RestStore {
    /// Create a new REST store over a shared client
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

/// Total from a `Content-Range: 0-9/42` header; `*` means unknown
pub fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn select(&self, resource: &str, query: &Query) -> StoreResult<Rows> {
        let url = self.client.config().rest_url(resource);
        let mut request = self
            .client
            .request(Method::GET, &url)
            .await?
            .query(&query.to_params());
        if query.count {
            request = request.header("Prefer", "count=exact");
        }

        let response = send(request).await?;
        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range);
        let records: Vec<Record> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        debug!(resource, rows = records.len(), ?total, "rest select");
        Ok(Rows { records, total })
    }

    async fn insert(&self, resource: &str, records: Vec<Record>) -> StoreResult<Vec<Record>> {
        let url = self.client.config().rest_url(resource);
        let request = self
            .client
            .request(Method::POST, &url)
            .await?
            .header("Prefer", "return=representation")
            .json(&records);

        send_json(request).await
    }

    async fn update(
        &self,
        resource: &str,
        query: &Query,
        patch: Record,
    ) -> StoreResult<Vec<Record>> {
        let url = self.client.config().rest_url(resource);
        let request = self
            .client
            .request(Method::PATCH, &url)
            .await?
            .query(&query.filter_params())
            .header("Prefer", "return=representation")
            .json(&patch);

        send_json(request).await
    }

    async fn delete(&self, resource: &str, query: &Query) -> StoreResult<Vec<Record>> {
        let url = self.client.config().rest_url(resource);
        let request = self
            .client
            .request(Method::DELETE, &url)
            .await?
            .query(&query.filter_params())
            .header("Prefer", "return=representation");

        send_json(request).await
    }
}
