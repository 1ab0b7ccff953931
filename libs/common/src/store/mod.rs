//! Table store abstraction
//!
//! [`RemoteStore`] is the narrow seam between the service layer and the
//! hosted backend's tables. [`rest::RestStore`] talks to the real backend,
//! [`memory::MemoryStore`] keeps rows in process for tests and demos, and
//! [`disconnected::Disconnected`] stands in when the backend is not
//! configured.

use async_trait::async_trait;

use crate::error::StoreResult;

pub mod disconnected;
pub mod memory;
pub mod query;
pub mod rest;

pub use query::{Predicate, Query, Record, Rows, Sort, SortDirection};

/// Row-level operations over named resources
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read the rows matching `query`, with the total count when requested
    async fn select(&self, resource: &str, query: &Query) -> StoreResult<Rows>;

    /// Insert records and return them as persisted
    async fn insert(&self, resource: &str, records: Vec<Record>) -> StoreResult<Vec<Record>>;

    /// Merge `patch` into every row matching `query`, returning updated rows
    async fn update(&self, resource: &str, query: &Query, patch: Record)
    -> StoreResult<Vec<Record>>;

    /// Delete every row matching `query`, returning the removed rows
    async fn delete(&self, resource: &str, query: &Query) -> StoreResult<Vec<Record>>;
}
