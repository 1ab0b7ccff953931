//! Query executor and result normalizer
//!
//! Every repository goes through [`QueryExecutor`]: it turns filter, page and
//! sort requests into store queries, runs single-row mutations, and folds the
//! store's answer into one of two outcomes, a value or an [`ApiError`].
//!
//! Rules applied uniformly:
//! - required fields are checked before the round trip, so invalid payloads
//!   never reach the store;
//! - `created_at`/`updated_at` are stamped here, never trusted from callers;
//! - by-id operations expect exactly one row: zero is `NotFound`, more than
//!   one is `AmbiguousResult` and is logged as a contract violation;
//! - store errors are logged and returned unchanged, never retried.

use std::sync::Arc;

use common::error::StoreError;
use common::store::query::{CREATED_AT, ID_COLUMN, UPDATED_AT};
use common::store::{Predicate, Query, Record, RemoteStore, Sort};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::clock::Clock;
use crate::error::{ApiError, ApiResult};

/// A named remote collection and the rules its writes follow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub name: &'static str,
    /// Fields that must be present, non-null and non-blank on create
    pub required: &'static [&'static str],
    /// Whether writes refresh `updated_at`
    pub tracks_updates: bool,
}

pub const MOVIES: Resource = Resource {
    name: "movies",
    required: &["title"],
    tracks_updates: true,
};

pub const REVIEWS: Resource = Resource {
    name: "reviews",
    required: &["movie_id", "user_id"],
    tracks_updates: false,
};

pub const USER_MOVIES: Resource = Resource {
    name: "user_movies",
    required: &["user_id", "movie_id", "status"],
    tracks_updates: false,
};

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page index
    pub page: u32,
    /// items per page
    pub per_page: u32,
}

impl Pagination {
    pub const MAX_PER_PAGE: u32 = 100;

    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    /// Clamp to sane values: page 0 becomes 1, per_page is kept in 1..=100
    pub fn normalize(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, Self::MAX_PER_PAGE),
        }
    }

    /// Zero-based offset of the first row of the page
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.per_page as usize
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

/// Filtered, paginated, sorted read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListRequest {
    /// Conjunction of predicates
    pub filters: Vec<Predicate>,
    pub pagination: Pagination,
    /// Defaults to newest first
    pub sort: Sort,
}

impl ListRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn page(mut self, page: u32, per_page: u32) -> Self {
        self.pagination = Pagination::new(page, per_page);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }
}

/// One window of a filtered result set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the whole filtered set, independent of the window
    pub total_items: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    /// Convert every item, keeping the window metadata
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            total_items: self.total_items,
            page: self.page,
            per_page: self.per_page,
        })
    }
}

/// Client-side reduction applied by [`QueryExecutor::aggregate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Count,
    Sum,
    Average,
}

/// Numeric summary over the matching rows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    /// Rows that contributed to the value
    pub rows: usize,
    pub value: f64,
}

/// Executes queries against a [`RemoteStore`] and normalizes the results
#[derive(Clone)]
pub struct QueryExecutor {
    store: Arc<dyn RemoteStore>,
    clock: Arc<Clock>,
}

/// Log a store failure with the operation it interrupted, then convert it
fn store_failure(operation: &str, resource: &Resource, err: StoreError) -> ApiError {
    error!("Store rejected {} on {}: {}", operation, resource.name, err);
    ApiError::Remote(err)
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl QueryExecutor {
    /// Create a new executor over a store
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            clock: Arc::new(Clock::new()),
        }
    }

    /// Check required fields without touching the store
    pub fn validate(&self, resource: &Resource, payload: &Record) -> ApiResult<()> {
        let missing: Vec<&str> = resource
            .required
            .iter()
            .copied()
            .filter(|field| match payload.get(*field) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(format!(
                "Missing required field(s) for {}: {}",
                resource.name,
                missing.join(", ")
            )))
        }
    }

    fn exactly_one(&self, resource: &Resource, id: &str, mut rows: Vec<Record>) -> ApiResult<Record> {
        match rows.len() {
            0 => Err(ApiError::not_found(resource.name, id)),
            1 => Ok(rows.remove(0)),
            count => {
                error!(
                    "Contract violation: {} rows in {} share id {}",
                    count, resource.name, id
                );
                Err(ApiError::AmbiguousResult {
                    resource: resource.name.to_string(),
                    id: id.to_string(),
                    count,
                })
            }
        }
    }

    fn stamp_insert(&self, resource: &Resource, payload: &mut Record) {
        let now = Value::String(self.clock.stamp());
        if resource.tracks_updates {
            payload.insert(UPDATED_AT.to_string(), now.clone());
        }
        payload.insert(CREATED_AT.to_string(), now);
    }

    /// Windowed read with the exact size of the filtered set
    pub async fn list(&self, resource: &Resource, request: &ListRequest) -> ApiResult<Page<Record>> {
        let pagination = request.pagination.normalize();
        let query = Query::new()
            .filters(request.filters.iter().cloned())
            .order(request.sort.clone())
            .range(pagination.offset(), pagination.per_page as usize)
            .with_count();

        let rows = self
            .store
            .select(resource.name, &query)
            .await
            .map_err(|e| store_failure("list", resource, e))?;

        let total_items = rows
            .total
            .unwrap_or((pagination.offset() + rows.records.len()) as u64);
        info!(
            "Listed {} of {} {} (page {})",
            rows.records.len(),
            total_items,
            resource.name,
            pagination.page
        );

        Ok(Page {
            items: rows.records,
            total_items,
            page: pagination.page,
            per_page: pagination.per_page,
        })
    }

    /// Unwindowed read; `query` carries its own filters, sort and limit
    pub async fn list_all(&self, resource: &Resource, query: &Query) -> ApiResult<Vec<Record>> {
        let rows = self
            .store
            .select(resource.name, query)
            .await
            .map_err(|e| store_failure("list", resource, e))?;
        Ok(rows.records)
    }

    /// Exactly one record by id
    pub async fn get_by_id(&self, resource: &Resource, id: &str) -> ApiResult<Record> {
        let rows = self
            .store
            .select(resource.name, &Query::by_id(id))
            .await
            .map_err(|e| store_failure("get", resource, e))?;
        self.exactly_one(resource, id, rows.records)
    }

    /// Validate, stamp and insert one record; returns it as persisted
    pub async fn create(&self, resource: &Resource, mut payload: Record) -> ApiResult<Record> {
        self.validate(resource, &payload)?;
        self.stamp_insert(resource, &mut payload);

        let mut inserted = self
            .store
            .insert(resource.name, vec![payload])
            .await
            .map_err(|e| store_failure("create", resource, e))?;

        if inserted.len() != 1 {
            let err = StoreError::Decode(format!("insert returned {} rows", inserted.len()));
            return Err(store_failure("create", resource, err));
        }
        Ok(inserted.remove(0))
    }

    /// Validate every payload, then insert them in one round trip
    pub async fn create_many(
        &self,
        resource: &Resource,
        payloads: Vec<Record>,
    ) -> ApiResult<Vec<Record>> {
        for payload in &payloads {
            self.validate(resource, payload)?;
        }
        let payloads = payloads
            .into_iter()
            .map(|mut p| {
                self.stamp_insert(resource, &mut p);
                p
            })
            .collect();

        self.store
            .insert(resource.name, payloads)
            .await
            .map_err(|e| store_failure("create", resource, e))
    }

    /// Merge a partial payload into one record and return the result
    pub async fn update(&self, resource: &Resource, id: &str, mut patch: Record) -> ApiResult<Record> {
        patch.remove(ID_COLUMN);
        patch.remove(CREATED_AT);
        if resource.tracks_updates {
            patch.insert(UPDATED_AT.to_string(), Value::String(self.clock.stamp()));
        } else if patch.is_empty() {
            return Err(ApiError::Validation(format!(
                "Nothing to update on {} {}",
                resource.name, id
            )));
        }

        let rows = self
            .store
            .update(resource.name, &Query::by_id(id), patch)
            .await
            .map_err(|e| store_failure("update", resource, e))?;
        self.exactly_one(resource, id, rows)
    }

    /// Delete one record and return it
    ///
    /// A delete that matches nothing is `NotFound`, so repeating a delete is
    /// never reported as success.
    pub async fn delete(&self, resource: &Resource, id: &str) -> ApiResult<Record> {
        let rows = self
            .store
            .delete(resource.name, &Query::by_id(id))
            .await
            .map_err(|e| store_failure("delete", resource, e))?;
        self.exactly_one(resource, id, rows)
    }

    /// Delete every record matching a non-empty filter; returns the count
    pub async fn delete_where(&self, resource: &Resource, filters: Vec<Predicate>) -> ApiResult<usize> {
        if filters.is_empty() {
            return Err(ApiError::Validation(format!(
                "Refusing to delete every row of {}",
                resource.name
            )));
        }

        let removed = self
            .store
            .delete(resource.name, &Query::new().filters(filters))
            .await
            .map_err(|e| store_failure("delete", resource, e))?;
        Ok(removed.len())
    }

    /// Reduce `column` over the matching rows
    ///
    /// Rows are pulled and reduced client-side, so the cost is O(n) in the
    /// number of matching rows. Not a scalable aggregation path.
    pub async fn aggregate(
        &self,
        resource: &Resource,
        filters: Vec<Predicate>,
        column: &str,
        reduction: Reduction,
    ) -> ApiResult<Aggregate> {
        let query = Query::new().select(&[column]).filters(filters);
        let rows = self
            .store
            .select(resource.name, &query)
            .await
            .map_err(|e| store_failure("aggregate", resource, e))?;

        if reduction == Reduction::Count {
            let rows = rows.records.len();
            return Ok(Aggregate {
                rows,
                value: rows as f64,
            });
        }

        let values: Vec<f64> = rows
            .records
            .iter()
            .filter_map(|r| r.get(column).and_then(numeric))
            .collect();
        let sum: f64 = values.iter().sum();
        let value = match reduction {
            Reduction::Average if values.is_empty() => 0.0,
            Reduction::Average => sum / values.len() as f64,
            _ => sum,
        };

        Ok(Aggregate {
            rows: values.len(),
            value,
        })
    }
}
