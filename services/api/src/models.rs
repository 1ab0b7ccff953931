//! API models for request and response payloads

use common::store::Record;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

pub mod movie;
pub mod review;
pub mod user;

/// Serialize a payload into the record shape the store expects
pub fn to_record<T: Serialize>(value: &T) -> ApiResult<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::Validation(format!(
            "Expected an object payload, got {}",
            other
        ))),
    }
}

/// Decode a store record into a typed model
pub fn from_record<T: DeserializeOwned>(record: Record) -> ApiResult<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

/// Decode every record, failing on the first malformed one
pub fn from_records<T: DeserializeOwned>(records: Vec<Record>) -> ApiResult<Vec<T>> {
    records.into_iter().map(from_record).collect()
}
