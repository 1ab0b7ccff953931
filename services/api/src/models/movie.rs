//! Movie models for the API service

use chrono::{DateTime, Utc};
use common::store::Predicate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::executor::ListRequest;

pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 10.0;

/// Movie as persisted in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    /// External catalog id
    #[serde(default)]
    pub tmdb_id: Option<i64>,
    /// Owner
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn check_rating(rating: Option<f64>) -> ApiResult<()> {
    match rating {
        Some(r) if !(MIN_RATING..=MAX_RATING).contains(&r) => Err(ApiError::Validation(format!(
            "Movie rating must be between {} and {}, got {}",
            MIN_RATING, MAX_RATING, r
        ))),
        _ => Ok(()),
    }
}

/// Request for movie creation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewMovie {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<i64>,
}

impl NewMovie {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> ApiResult<()> {
        if self.title.trim().is_empty() {
            return Err(ApiError::Validation("Movie title is required".to_string()));
        }
        check_rating(self.rating)
    }
}

/// Partial movie update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MovieUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<i64>,
}

impl MovieUpdate {
    pub fn validate(&self) -> ApiResult<()> {
        if matches!(&self.title, Some(title) if title.trim().is_empty()) {
            return Err(ApiError::Validation("Movie title cannot be blank".to_string()));
        }
        check_rating(self.rating)
    }
}

/// Search parameters for movie listing
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieFilter {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Exact genre
    pub genre: Option<String>,
    /// Exact release year
    pub year: Option<i32>,
    /// Page number (1-based)
    pub page: Option<u32>,
    /// Number of items per page
    pub per_page: Option<u32>,
}

impl MovieFilter {
    /// Build the list request; empty filter values are ignored
    pub fn to_request(&self) -> ListRequest {
        let defaults = ListRequest::new().pagination;
        let mut request = ListRequest::new().page(
            self.page.unwrap_or(defaults.page),
            self.per_page.unwrap_or(defaults.per_page),
        );

        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            request = request.filter(Predicate::contains("title", title));
        }
        if let Some(genre) = self.genre.as_deref().filter(|g| !g.is_empty()) {
            request = request.filter(Predicate::eq("genre", genre));
        }
        if let Some(year) = self.year {
            request = request.filter(Predicate::eq("year", year));
        }
        request
    }
}
