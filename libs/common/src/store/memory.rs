//! In-process table store
//!
//! Evaluates [`Query`] values against rows held in memory. Used by tests and
//! by the CLIs' `--memory` mode. Every trait call is counted so callers can
//! assert that no store access happened.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::RemoteStore;
use super::query::{ID_COLUMN, Query, Record, Rows, SortDirection, compare_values, values_equal};
use crate::error::{StoreError, StoreResult};

/// In-memory store with optional unique constraints
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Record>>>,
    unique: HashMap<String, Vec<Vec<String>>>,
    calls: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store without constraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a unique constraint over `columns` of `resource`
    pub fn with_unique(mut self, resource: &str, columns: &[&str]) -> Self {
        self.unique
            .entry(resource.to_string())
            .or_default()
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Number of trait calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of a resource's rows, in insertion order; not counted as a call
    pub async fn rows(&self, resource: &str) -> Vec<Record> {
        self.tables
            .lock()
            .await
            .get(resource)
            .cloned()
            .unwrap_or_default()
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn violates(&self, resource: &str, existing: &[Record], candidate: &Record) -> Option<String> {
        let constraints = self.unique.get(resource)?;

        constraints.iter().find_map(|columns| {
            let values: Vec<&Value> = columns
                .iter()
                .map(|c| candidate.get(c).unwrap_or(&Value::Null))
                .collect();
            // NULLs never collide, as in SQL
            if values.iter().any(|v| v.is_null()) {
                return None;
            }

            let clash = existing.iter().any(|row| {
                columns
                    .iter()
                    .zip(&values)
                    .all(|(c, v)| row.get(c).is_some_and(|actual| values_equal(actual, v)))
            });

            clash.then(|| {
                format!(
                    "duplicate key value violates unique constraint \"{}_{}_key\"",
                    resource,
                    columns.join("_")
                )
            })
        })
    }
}

fn project(record: Record, columns: &Option<Vec<String>>) -> Record {
    match columns {
        Some(columns) => record
            .into_iter()
            .filter(|(key, _)| columns.iter().any(|c| c == key))
            .collect(),
        None => record,
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, resource: &str, query: &Query) -> StoreResult<Rows> {
        self.touch();
        let tables = self.tables.lock().await;

        let mut matched: Vec<Record> = tables
            .get(resource)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();

        if let Some(sort) = &query.sort {
            matched.sort_by(|a, b| {
                let ordering = compare_values(
                    a.get(&sort.column).unwrap_or(&Value::Null),
                    b.get(&sort.column).unwrap_or(&Value::Null),
                );
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        let total = matched.len() as u64;
        let records = matched
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|r| project(r, &query.columns))
            .collect();

        debug!(resource, total, "memory select");
        Ok(Rows {
            records,
            total: query.count.then_some(total),
        })
    }

    async fn insert(&self, resource: &str, records: Vec<Record>) -> StoreResult<Vec<Record>> {
        self.touch();
        let mut tables = self.tables.lock().await;
        let table = tables.entry(resource.to_string()).or_default();

        let mut staged: Vec<Record> = Vec::with_capacity(records.len());
        for mut record in records {
            if !record.get(ID_COLUMN).is_some_and(|id| !id.is_null()) {
                record.insert(
                    ID_COLUMN.to_string(),
                    Value::String(Uuid::new_v4().to_string()),
                );
            }

            let seen: Vec<Record> = table.iter().chain(staged.iter()).cloned().collect();
            if let Some(message) = self.violates(resource, &seen, &record) {
                return Err(StoreError::Conflict(message));
            }
            staged.push(record);
        }

        table.extend(staged.iter().cloned());
        Ok(staged)
    }

    async fn update(
        &self,
        resource: &str,
        query: &Query,
        patch: Record,
    ) -> StoreResult<Vec<Record>> {
        self.touch();
        let mut tables = self.tables.lock().await;

        let Some(table) = tables.get_mut(resource) else {
            return Ok(Vec::new());
        };

        let mut updated = Vec::new();
        for row in table.iter_mut().filter(|r| query.matches(r)) {
            for (key, value) in &patch {
                row.insert(key.clone(), value.clone());
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, resource: &str, query: &Query) -> StoreResult<Vec<Record>> {
        self.touch();
        let mut tables = self.tables.lock().await;

        let Some(table) = tables.get_mut(resource) else {
            return Ok(Vec::new());
        };

        let (removed, kept): (Vec<Record>, Vec<Record>) =
            table.drain(..).partition(|r| query.matches(r));
        *table = kept;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::query::Sort;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_ids() {
        let store = MemoryStore::new();
        let inserted = store
            .insert("movies", vec![record(json!({"title": "Heat"}))])
            .await
            .unwrap();

        let id = inserted[0].get("id").and_then(Value::as_str).unwrap();
        assert!(Uuid::parse_str(id).is_ok());
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn unique_constraint_rejects_second_insert() {
        let store = MemoryStore::new().with_unique("reviews", &["movie_id", "user_id"]);
        let review = record(json!({"movie_id": "m1", "user_id": "u1", "rating": 8}));

        store.insert("reviews", vec![review.clone()]).await.unwrap();
        let err = store.insert("reviews", vec![review]).await.unwrap_err();
        assert!(err.is_conflict());

        let other_user = record(json!({"movie_id": "m1", "user_id": "u2", "rating": 5}));
        assert!(store.insert("reviews", vec![other_user]).await.is_ok());
    }

    #[tokio::test]
    async fn select_sorts_windows_and_counts() {
        let store = MemoryStore::new();
        let rows = (1..=5)
            .map(|i| record(json!({"title": format!("Movie {}", i), "rating": i})))
            .collect();
        store.insert("movies", rows).await.unwrap();

        let query = Query::new()
            .order(Sort::new("rating", SortDirection::Desc))
            .range(1, 2)
            .with_count();
        let result = store.select("movies", &query).await.unwrap();

        assert_eq!(result.total, Some(5));
        let ratings: Vec<i64> = result
            .records
            .iter()
            .map(|r| r.get("rating").and_then(Value::as_i64).unwrap())
            .collect();
        assert_eq!(ratings, vec![4, 3]);
    }

    #[tokio::test]
    async fn select_projects_columns() {
        let store = MemoryStore::new();
        store
            .insert("reviews", vec![record(json!({"rating": 7, "comment": "ok"}))])
            .await
            .unwrap();

        let result = store
            .select("reviews", &Query::new().select(&["rating"]))
            .await
            .unwrap();
        assert_eq!(result.records[0].len(), 1);
        assert_eq!(result.total, None);
    }

    #[tokio::test]
    async fn update_and_delete_only_touch_matches() {
        let store = MemoryStore::new();
        let inserted = store
            .insert(
                "movies",
                vec![
                    record(json!({"title": "A", "genre": "Drama"})),
                    record(json!({"title": "B", "genre": "Drama"})),
                ],
            )
            .await
            .unwrap();
        let id = inserted[0].get("id").and_then(Value::as_str).unwrap();

        let updated = store
            .update(
                "movies",
                &Query::by_id(id),
                record(json!({"genre": "Crime"})),
            )
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].get("title"), Some(&json!("A")));

        let removed = store.delete("movies", &Query::by_id(id)).await.unwrap();
        assert_eq!(removed.len(), 1);
        assert!(store.delete("movies", &Query::by_id(id)).await.unwrap().is_empty());
        assert_eq!(store.rows("movies").await.len(), 1);
    }
}
