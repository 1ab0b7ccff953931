//! User profile repository

use auth::AuthService;
use auth::validation::validate_username;
use chrono::Utc;
use common::identity::{IdentityUpdate, USERNAME_KEY};
use common::store::Predicate;
use serde_json::Value;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::executor::{MOVIES, QueryExecutor, Reduction, Resource, USER_MOVIES};
use crate::models::user::{ProfileUpdate, UserMovie, UserProfile, UserStats, WatchStatus};
use crate::models::{from_records, to_record};
use crate::repositories::{failed, require_identity};

/// Profiles and per-user statistics
#[derive(Clone)]
pub struct UserRepository {
    executor: QueryExecutor,
    auth: AuthService,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(executor: QueryExecutor, auth: AuthService) -> Self {
        Self { executor, auth }
    }

    /// Profile of any user
    ///
    /// Uses the administrative lookup. Without admin rights only the
    /// signed-in user's own profile is reachable; anything else is `Forbidden`.
    #[instrument(skip(self))]
    pub async fn get_user_profile(&self, user_id: Uuid) -> ApiResult<UserProfile> {
        match self.auth.identity().user_by_id(user_id).await {
            Ok(identity) => {
                info!("Profile loaded: {:?}", identity.email);
                Ok(UserProfile::public(&identity))
            }
            Err(e) => {
                warn!("Admin lookup of {} failed, trying current user: {}", user_id, e);
                match self.auth.get_current_user().await {
                    Some(current) if current.id == user_id => Ok(UserProfile::public(&current)),
                    _ => Err(failed(
                        "Failed to get user profile",
                        ApiError::Forbidden(format!("cannot access profile of user {}", user_id)),
                    )),
                }
            }
        }
    }

    /// Profile of the signed-in user
    pub async fn get_current_user_profile(&self) -> ApiResult<UserProfile> {
        let current = require_identity(&self.auth, "Failed to get current profile").await?;
        let profile = UserProfile::current(&current);
        info!("Current profile loaded: {:?}", profile.email);
        Ok(profile)
    }

    /// Change username and/or email of the signed-in user
    ///
    /// Only the signed-in user's own profile can change. The email is sent
    /// only when it differs from the current one.
    #[instrument(skip(self, update))]
    pub async fn update_user_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> ApiResult<UserProfile> {
        const CONTEXT: &str = "Failed to update profile";

        let current = require_identity(&self.auth, CONTEXT).await?;
        if current.id != user_id {
            return Err(failed(
                CONTEXT,
                ApiError::Forbidden("users can only update their own profile".to_string()),
            ));
        }

        let mut changes = IdentityUpdate::default();
        if let Some(username) = update.username.filter(|u| !u.is_empty()) {
            validate_username(&username).map_err(|e| failed(CONTEXT, ApiError::Validation(e)))?;
            let mut metadata = current.user_metadata.clone();
            metadata.insert(USERNAME_KEY.to_string(), Value::String(username));
            changes.data = Some(metadata);
        }
        if let Some(email) = update.email.filter(|e| current.email.as_ref() != Some(e)) {
            changes.email = Some(email);
        }
        if changes.is_empty() {
            return Err(failed(
                CONTEXT,
                ApiError::Validation("Nothing to update".to_string()),
            ));
        }

        let updated = self.auth.update_user(changes).await?;
        info!("Profile updated: {}", updated.id);
        Ok(UserProfile {
            updated_at: Some(Utc::now()),
            ..UserProfile::public(&updated)
        })
    }

    /// Put movies on users' lists in one round trip
    #[instrument(skip_all, fields(count = links.len()))]
    pub async fn add_user_movies(&self, links: Vec<UserMovie>) -> ApiResult<Vec<UserMovie>> {
        const CONTEXT: &str = "Failed to create user movies";

        let payloads = links
            .iter()
            .map(to_record)
            .collect::<ApiResult<Vec<_>>>()
            .map_err(|e| failed(CONTEXT, e))?;
        let records = self.executor.create_many(&USER_MOVIES, payloads).await?;

        let created: Vec<UserMovie> = from_records(records).map_err(|e| failed(CONTEXT, e))?;
        info!("{} user movies created", created.len());
        Ok(created)
    }

    /// Empty a user's lists; returns how many links were removed
    #[instrument(skip(self))]
    pub async fn clear_user_movies(&self, user_id: Uuid) -> ApiResult<usize> {
        let removed = self
            .executor
            .delete_where(
                &USER_MOVIES,
                vec![Predicate::eq("user_id", user_id.to_string())],
            )
            .await?;
        info!("{} user movies removed", removed);
        Ok(removed)
    }

    async fn count(&self, resource: &Resource, filters: Vec<Predicate>) -> ApiResult<u64> {
        let aggregate = self
            .executor
            .aggregate(resource, filters, "id", Reduction::Count)
            .await?;
        Ok(aggregate.rows as u64)
    }

    /// Owned movies plus list counts per status
    #[instrument(skip(self))]
    pub async fn get_user_stats(&self, user_id: Uuid) -> ApiResult<UserStats> {
        let owner = || Predicate::eq("user_id", user_id.to_string());

        let mut stats = UserStats {
            total_movies: self.count(&MOVIES, vec![owner()]).await?,
            ..Default::default()
        };
        for status in WatchStatus::ALL {
            let count = self
                .count(
                    &USER_MOVIES,
                    vec![owner(), Predicate::eq("status", status.as_str())],
                )
                .await?;
            match status {
                WatchStatus::Watched => stats.watched_movies = count,
                WatchStatus::Pending => stats.pending_movies = count,
                WatchStatus::Favorite => stats.favorite_movies = count,
            }
        }

        info!("Stats for {}: {:?}", user_id, stats);
        Ok(stats)
    }

    pub async fn get_current_user_stats(&self) -> ApiResult<UserStats> {
        let current = require_identity(&self.auth, "Failed to get current stats").await?;
        self.get_user_stats(current.id).await
    }
}
