//! Review repository
//!
//! One review per (movie, user). With [`ReviewRepository::with_duplicate_check`]
//! an existing review is looked up before inserting; the hosted catalog has
//! no unique constraint, so [`AppState`](crate::AppState) always turns it on.
//! That check is not atomic: two concurrent inserts can both pass it. Where
//! the store does carry a unique constraint, its conflict also surfaces as
//! [`ApiError::DuplicateReview`].

use common::store::{Predicate, Query, Sort};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::executor::{QueryExecutor, REVIEWS, Reduction};
use crate::models::review::{NewReview, Review, ReviewUpdate};
use crate::models::{from_record, from_records, to_record};
use crate::repositories::failed;

pub const DEFAULT_LATEST: usize = 10;

/// Review repository over the remote catalog
#[derive(Clone)]
pub struct ReviewRepository {
    executor: QueryExecutor,
    duplicate_check: bool,
}

impl ReviewRepository {
    /// Create a new review repository
    pub fn new(executor: QueryExecutor) -> Self {
        Self {
            executor,
            duplicate_check: false,
        }
    }

    /// Look for an existing review before inserting
    pub fn with_duplicate_check(mut self) -> Self {
        self.duplicate_check = true;
        self
    }

    async fn list(&self, query: Query, context: &str) -> ApiResult<Vec<Review>> {
        let records = self.executor.list_all(&REVIEWS, &query).await?;
        from_records(records).map_err(|e| failed(context, e))
    }

    /// Reviews of a movie, newest first
    pub async fn get_reviews_by_movie(&self, movie_id: Uuid) -> ApiResult<Vec<Review>> {
        let query = Query::new()
            .eq("movie_id", movie_id.to_string())
            .order(Sort::newest_first());
        let reviews = self.list(query, "Failed to get reviews").await?;
        info!("Got {} reviews", reviews.len());
        Ok(reviews)
    }

    /// Reviews written by a user, newest first
    pub async fn get_reviews_by_user(&self, user_id: Uuid) -> ApiResult<Vec<Review>> {
        let query = Query::new()
            .eq("user_id", user_id.to_string())
            .order(Sort::newest_first());
        let reviews = self.list(query, "Failed to get user reviews").await?;
        info!("Got {} reviews by user {}", reviews.len(), user_id);
        Ok(reviews)
    }

    pub async fn get_latest_reviews(&self, limit: Option<usize>) -> ApiResult<Vec<Review>> {
        let query = Query::new()
            .order(Sort::newest_first())
            .limit(limit.unwrap_or(DEFAULT_LATEST));
        self.list(query, "Failed to get latest reviews").await
    }

    pub async fn get_review_by_id(&self, id: Uuid) -> ApiResult<Review> {
        let record = self.executor.get_by_id(&REVIEWS, &id.to_string()).await?;
        from_record(record).map_err(|e| failed("Failed to get review", e))
    }

    #[instrument(skip(self, review))]
    pub async fn create_review(&self, review: NewReview) -> ApiResult<Review> {
        const CONTEXT: &str = "Failed to create review";

        let (movie_id, user_id) = review.validate().map_err(|e| failed(CONTEXT, e))?;
        let duplicate = || failed(CONTEXT, ApiError::DuplicateReview { movie_id, user_id });

        if self.duplicate_check {
            let query = Query::new()
                .select(&["id"])
                .eq("movie_id", movie_id.to_string())
                .eq("user_id", user_id.to_string())
                .limit(1);
            if !self.executor.list_all(&REVIEWS, &query).await?.is_empty() {
                return Err(duplicate());
            }
        }

        let payload = to_record(&review).map_err(|e| failed(CONTEXT, e))?;
        let record = match self.executor.create(&REVIEWS, payload).await {
            Ok(record) => record,
            Err(ApiError::Remote(e)) if e.is_conflict() => return Err(duplicate()),
            Err(e) => return Err(e),
        };

        let created: Review = from_record(record).map_err(|e| failed(CONTEXT, e))?;
        info!("Review created: {}", created.id);
        Ok(created)
    }

    #[instrument(skip(self, update))]
    pub async fn update_review(&self, id: Uuid, update: ReviewUpdate) -> ApiResult<Review> {
        const CONTEXT: &str = "Failed to update review";

        update.validate().map_err(|e| failed(CONTEXT, e))?;
        let patch = to_record(&update).map_err(|e| failed(CONTEXT, e))?;
        let record = self.executor.update(&REVIEWS, &id.to_string(), patch).await?;

        let updated: Review = from_record(record).map_err(|e| failed(CONTEXT, e))?;
        info!("Review updated: {}", updated.id);
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_review(&self, id: Uuid) -> ApiResult<Review> {
        let record = self.executor.delete(&REVIEWS, &id.to_string()).await?;
        let deleted: Review = from_record(record).map_err(|e| failed("Failed to delete review", e))?;
        info!("Review deleted: {}", deleted.id);
        Ok(deleted)
    }

    /// Mean rating of a movie rounded to one decimal; 0.0 without reviews
    pub async fn get_average_rating(&self, movie_id: Uuid) -> ApiResult<f64> {
        let aggregate = self
            .executor
            .aggregate(
                &REVIEWS,
                vec![Predicate::eq("movie_id", movie_id.to_string())],
                "rating",
                Reduction::Average,
            )
            .await?;

        let average = (aggregate.value * 10.0).round() / 10.0;
        info!("Average rating for {}: {:.1}", movie_id, average);
        Ok(average)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::store::memory::MemoryStore;
    use std::sync::Arc;

    fn repository(store: MemoryStore) -> (ReviewRepository, Arc<MemoryStore>) {
        let store = Arc::new(store);
        (ReviewRepository::new(QueryExecutor::new(store.clone())), store)
    }

    fn constrained() -> MemoryStore {
        MemoryStore::new().with_unique("reviews", &["movie_id", "user_id"])
    }

    #[tokio::test]
    async fn duplicate_review_maps_constraint_conflict() {
        let (reviews, store) = repository(constrained());
        let (movie, user) = (Uuid::new_v4(), Uuid::new_v4());

        reviews
            .create_review(NewReview::new(movie, user, 8).with_comment("Great"))
            .await
            .unwrap();
        let err = reviews
            .create_review(NewReview::new(movie, user, 3))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApiError::DuplicateReview { movie_id, user_id } if movie_id == movie && user_id == user
        ));
        assert_eq!(store.rows("reviews").await.len(), 1);
    }

    #[tokio::test]
    async fn precheck_catches_duplicates_without_constraint() {
        let (reviews, store) = repository(MemoryStore::new());
        let reviews = reviews.with_duplicate_check();
        let (movie, user) = (Uuid::new_v4(), Uuid::new_v4());

        reviews
            .create_review(NewReview::new(movie, user, 8))
            .await
            .unwrap();
        assert!(matches!(
            reviews.create_review(NewReview::new(movie, user, 9)).await,
            Err(ApiError::DuplicateReview { .. })
        ));
        assert_eq!(store.rows("reviews").await.len(), 1);
    }

    #[tokio::test]
    async fn invalid_review_never_reaches_store() {
        let (reviews, store) = repository(constrained());
        let missing_user = NewReview {
            movie_id: Some(Uuid::new_v4()),
            rating: 5,
            ..Default::default()
        };

        assert!(matches!(
            reviews.create_review(missing_user).await,
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            reviews
                .create_review(NewReview::new(Uuid::new_v4(), Uuid::new_v4(), 11))
                .await,
            Err(ApiError::Validation(_))
        ));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn average_rating_rounds_to_one_decimal() {
        let (reviews, _) = repository(constrained());
        let movie = Uuid::new_v4();

        assert_eq!(reviews.get_average_rating(movie).await.unwrap(), 0.0);

        for rating in [8, 9, 9] {
            reviews
                .create_review(NewReview::new(movie, Uuid::new_v4(), rating))
                .await
                .unwrap();
        }
        assert_eq!(reviews.get_average_rating(movie).await.unwrap(), 8.7);
    }

    #[tokio::test]
    async fn lookups_update_and_delete() {
        let (reviews, _) = repository(constrained());
        let (movie, user) = (Uuid::new_v4(), Uuid::new_v4());

        let first = reviews
            .create_review(NewReview::new(movie, user, 6))
            .await
            .unwrap();
        let second = reviews
            .create_review(NewReview::new(Uuid::new_v4(), user, 7))
            .await
            .unwrap();

        assert_eq!(reviews.get_reviews_by_movie(movie).await.unwrap(), vec![first.clone()]);
        let by_user = reviews.get_reviews_by_user(user).await.unwrap();
        assert_eq!(by_user, vec![second.clone(), first.clone()]);
        assert_eq!(reviews.get_latest_reviews(Some(1)).await.unwrap(), vec![second]);

        let update = ReviewUpdate {
            rating: Some(10),
            comment: Some("Grew on me".to_string()),
        };
        let updated = reviews.update_review(first.id, update).await.unwrap();
        assert_eq!(updated.rating, Some(10));
        assert_eq!(reviews.get_review_by_id(first.id).await.unwrap(), updated);

        assert!(matches!(
            reviews.update_review(first.id, ReviewUpdate::default()).await,
            Err(ApiError::Validation(_))
        ));

        reviews.delete_review(first.id).await.unwrap();
        assert!(matches!(
            reviews.delete_review(first.id).await,
            Err(ApiError::NotFound { .. })
        ));
    }
}
