//! Review models for the API service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

pub const MIN_REVIEW_RATING: i32 = 1;
pub const MAX_REVIEW_RATING: i32 = 10;

/// A user's review of a movie; at most one per (movie, user)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn check_rating(rating: i32) -> ApiResult<()> {
    if (MIN_REVIEW_RATING..=MAX_REVIEW_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "Review rating must be between {} and {}, got {}",
            MIN_REVIEW_RATING, MAX_REVIEW_RATING, rating
        )))
    }
}

/// Request for review creation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewReview {
    pub movie_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub rating: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl NewReview {
    pub fn new(movie_id: Uuid, user_id: Uuid, rating: i32) -> Self {
        Self {
            movie_id: Some(movie_id),
            user_id: Some(user_id),
            rating,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Check the payload and return the (movie, user) pair it targets
    pub fn validate(&self) -> ApiResult<(Uuid, Uuid)> {
        let (Some(movie_id), Some(user_id)) = (self.movie_id, self.user_id) else {
            return Err(ApiError::Validation(
                "movie_id and user_id are required".to_string(),
            ));
        };
        check_rating(self.rating)?;
        Ok((movie_id, user_id))
    }
}

/// Partial review update
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReviewUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ReviewUpdate {
    pub fn validate(&self) -> ApiResult<()> {
        self.rating.map_or(Ok(()), check_rating)
    }
}
