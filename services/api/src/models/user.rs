//! User profile models for the API service

use std::fmt;

use chrono::{DateTime, Utc};
use common::identity::Identity;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use auth::validation::email_local_part;

/// Public projection of an identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: Option<String>,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Present on the current-user variant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sign_in: Option<DateTime<Utc>>,
    /// Present after an update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Profile as seen by anyone; username only if one was set
    pub fn public(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email.clone(),
            username: identity.username().map(str::to_string),
            created_at: identity.created_at,
            last_sign_in: None,
            updated_at: None,
        }
    }

    /// Profile of the signed-in identity; username falls back to the email local part
    pub fn current(identity: &Identity) -> Self {
        let username = identity.username().map(str::to_string).or_else(|| {
            identity
                .email
                .as_deref()
                .map(|email| email_local_part(email).to_string())
        });
        Self {
            username,
            last_sign_in: identity.last_sign_in_at,
            ..Self::public(identity)
        }
    }
}

/// Request for profile update
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Per-user counters, recomputed on every request
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserStats {
    /// Movies owned by the user
    pub total_movies: u64,
    pub watched_movies: u64,
    pub favorite_movies: u64,
    pub pending_movies: u64,
}

/// Status of a movie on a user's list
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WatchStatus {
    Watched,
    Pending,
    Favorite,
}

impl WatchStatus {
    pub const ALL: [WatchStatus; 3] = [WatchStatus::Watched, WatchStatus::Pending, WatchStatus::Favorite];

    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::Watched => "watched",
            WatchStatus::Pending => "pending",
            WatchStatus::Favorite => "favorite",
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Link between a user and a movie on their list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserMovie {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub status: WatchStatus,
    #[serde(default)]
    pub user_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserMovie {
    pub fn new(user_id: Uuid, movie_id: Uuid, status: WatchStatus) -> Self {
        Self {
            id: None,
            user_id,
            movie_id,
            status,
            user_rating: None,
            created_at: None,
        }
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.user_rating = Some(rating);
        self
    }
}
