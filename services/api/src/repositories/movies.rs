//! Movie repository

use auth::AuthService;
use common::store::{Predicate, Query, Record, Sort, SortDirection};
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::executor::{MOVIES, Page, QueryExecutor};
use crate::models::movie::{Movie, MovieFilter, MovieUpdate, NewMovie};
use crate::models::{from_record, from_records, to_record};
use crate::repositories::{failed, require_identity};

pub const DEFAULT_TOP_RATED: usize = 10;

fn by_rating() -> Sort {
    Sort::new("rating", SortDirection::Desc)
}

/// Movie repository over the remote catalog
#[derive(Clone)]
pub struct MovieRepository {
    executor: QueryExecutor,
    auth: AuthService,
}

impl MovieRepository {
    /// Create a new movie repository
    pub fn new(executor: QueryExecutor, auth: AuthService) -> Self {
        Self { executor, auth }
    }

    /// Create a movie owned by the signed-in user
    ///
    /// The payload is validated before the identity lookup, so an invalid
    /// movie never causes a round trip.
    #[instrument(skip(self, movie), fields(title = %movie.title))]
    pub async fn create_movie(&self, movie: NewMovie) -> ApiResult<Movie> {
        const CONTEXT: &str = "Failed to create movie";

        movie.validate().map_err(|e| failed(CONTEXT, e))?;
        let owner = require_identity(&self.auth, CONTEXT).await?;

        let mut payload = to_record(&movie).map_err(|e| failed(CONTEXT, e))?;
        payload.insert("user_id".to_string(), Value::String(owner.id.to_string()));

        let record = self.executor.create(&MOVIES, payload).await?;
        let created: Movie = from_record(record).map_err(|e| failed(CONTEXT, e))?;
        info!("Movie created: {}", created.title);
        Ok(created)
    }

    /// Insert a batch of movies owned by the signed-in user in one round trip
    #[instrument(skip_all, fields(count = movies.len()))]
    pub async fn create_movies(&self, movies: Vec<NewMovie>) -> ApiResult<Vec<Movie>> {
        const CONTEXT: &str = "Failed to insert movies";

        for movie in &movies {
            movie.validate().map_err(|e| failed(CONTEXT, e))?;
        }
        let owner = require_identity(&self.auth, CONTEXT).await?;

        let payloads = movies
            .iter()
            .map(|movie| -> ApiResult<Record> {
                let mut payload = to_record(movie)?;
                payload.insert("user_id".to_string(), Value::String(owner.id.to_string()));
                Ok(payload)
            })
            .collect::<ApiResult<Vec<_>>>()
            .map_err(|e| failed(CONTEXT, e))?;

        let records = self.executor.create_many(&MOVIES, payloads).await?;
        let created: Vec<Movie> = from_records(records).map_err(|e| failed(CONTEXT, e))?;
        info!("{} movies inserted", created.len());
        Ok(created)
    }

    /// Delete every movie owned by `user_id`; returns how many were removed
    #[instrument(skip(self))]
    pub async fn delete_movies_of(&self, user_id: Uuid) -> ApiResult<usize> {
        let removed = self
            .executor
            .delete_where(&MOVIES, vec![Predicate::eq("user_id", user_id.to_string())])
            .await?;
        info!("{} movies removed", removed);
        Ok(removed)
    }

    /// Filtered, paginated search, newest first
    #[instrument(skip(self))]
    pub async fn search_movies(&self, filter: &MovieFilter) -> ApiResult<Page<Movie>> {
        let page = self.executor.list(&MOVIES, &filter.to_request()).await?;
        let shown = page.items.len();
        let page = page
            .try_map(from_record)
            .map_err(|e| failed("Failed to search movies", e))?;
        info!("Found {} movies (showing {})", page.total_items, shown);
        Ok(page)
    }

    #[instrument(skip(self))]
    pub async fn get_movie_by_id(&self, id: Uuid) -> ApiResult<Movie> {
        let record = self.executor.get_by_id(&MOVIES, &id.to_string()).await?;
        from_record(record).map_err(|e| failed("Failed to get movie", e))
    }

    /// Apply a partial update and return the stored movie
    #[instrument(skip(self, update))]
    pub async fn update_movie(&self, id: Uuid, update: MovieUpdate) -> ApiResult<Movie> {
        const CONTEXT: &str = "Failed to update movie";

        update.validate().map_err(|e| failed(CONTEXT, e))?;
        let patch = to_record(&update).map_err(|e| failed(CONTEXT, e))?;

        let record = self.executor.update(&MOVIES, &id.to_string(), patch).await?;
        let updated: Movie = from_record(record).map_err(|e| failed(CONTEXT, e))?;
        info!("Movie updated: {}", updated.title);
        Ok(updated)
    }

    /// Delete a movie and return what was removed
    #[instrument(skip(self))]
    pub async fn delete_movie(&self, id: Uuid) -> ApiResult<Movie> {
        let record = self.executor.delete(&MOVIES, &id.to_string()).await?;
        let deleted: Movie = from_record(record).map_err(|e| failed("Failed to delete movie", e))?;
        info!("Movie deleted: {}", deleted.id);
        Ok(deleted)
    }

    pub async fn list_all_movies(&self) -> ApiResult<Vec<Movie>> {
        let query = Query::new().order(Sort::newest_first());
        let records = self.executor.list_all(&MOVIES, &query).await?;
        from_records(records).map_err(|e| failed("Failed to list movies", e))
    }

    /// Movies owned by the signed-in user, newest first
    pub async fn list_user_movies(&self) -> ApiResult<Vec<Movie>> {
        const CONTEXT: &str = "Failed to list user movies";

        let owner = require_identity(&self.auth, CONTEXT).await?;
        let query = Query::new()
            .eq("user_id", owner.id.to_string())
            .order(Sort::newest_first());
        let records = self.executor.list_all(&MOVIES, &query).await?;
        from_records(records).map_err(|e| failed(CONTEXT, e))
    }

    /// Genre substring match, best rated first
    pub async fn get_movies_by_genre(&self, genre: &str) -> ApiResult<Vec<Movie>> {
        let query = Query::new()
            .filter(Predicate::contains("genre", genre))
            .order(by_rating());
        let records = self.executor.list_all(&MOVIES, &query).await?;
        from_records(records).map_err(|e| failed("Failed to filter movies by genre", e))
    }

    pub async fn get_movies_by_year(&self, year: i32) -> ApiResult<Vec<Movie>> {
        let query = Query::new().eq("year", year).order(by_rating());
        let records = self.executor.list_all(&MOVIES, &query).await?;
        from_records(records).map_err(|e| failed("Failed to filter movies by year", e))
    }

    /// Best rated movies; `limit` defaults to [`DEFAULT_TOP_RATED`]
    pub async fn get_top_rated_movies(&self, limit: Option<usize>) -> ApiResult<Vec<Movie>> {
        let query = Query::new()
            .order(by_rating())
            .limit(limit.unwrap_or(DEFAULT_TOP_RATED));
        let records = self.executor.list_all(&MOVIES, &query).await?;
        from_records(records).map_err(|e| failed("Failed to get top rated movies", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use common::identity::memory::MemoryIdentity;
    use common::store::memory::MemoryStore;
    use std::sync::Arc;

    const PASSWORD: &str = "TestPassword123!";

    struct Fixture {
        movies: MovieRepository,
        auth: AuthService,
        store: Arc<MemoryStore>,
        identity: Arc<MemoryIdentity>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(MemoryIdentity::new());
        let auth = AuthService::new(identity.clone());
        let movies = MovieRepository::new(QueryExecutor::new(store.clone()), auth.clone());
        Fixture {
            movies,
            auth,
            store,
            identity,
        }
    }

    async fn signed_in() -> Fixture {
        let fixture = fixture();
        fixture
            .auth
            .register("critic@example.com", PASSWORD, None)
            .await
            .unwrap();
        fixture
    }

    fn movie(title: &str, genre: &str, year: i32, rating: f64) -> NewMovie {
        NewMovie {
            genre: Some(genre.to_string()),
            year: Some(year),
            rating: Some(rating),
            ..NewMovie::new(title)
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips_title() {
        let f = signed_in().await;
        let created = f
            .movies
            .create_movie(movie("Inception", "Sci-Fi", 2010, 8.8))
            .await
            .unwrap();

        let fetched = f.movies.get_movie_by_id(created.id).await.unwrap();
        assert_eq!(fetched.title, "Inception");
        assert_eq!(fetched, created);

        let owner = f.auth.get_current_user().await.unwrap();
        assert_eq!(created.user_id, Some(owner.id));
    }

    #[tokio::test]
    async fn empty_title_fails_without_any_call() {
        let f = fixture();
        let err = f.movies.create_movie(NewMovie::new("")).await.unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(f.store.calls(), 0);
        assert_eq!(f.identity.calls(), 0);
    }

    #[tokio::test]
    async fn create_requires_identity() {
        let f = fixture();
        let err = f
            .movies
            .create_movie(NewMovie::new("Heat"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AuthRequired(_)));
        assert_eq!(f.store.calls(), 0);
    }

    #[tokio::test]
    async fn update_rating_bumps_updated_at() {
        let f = signed_in().await;
        let created = f
            .movies
            .create_movie(movie("Heat", "Crime", 1995, 8.3))
            .await
            .unwrap();

        let update = MovieUpdate {
            rating: Some(9.0),
            ..Default::default()
        };
        f.movies.update_movie(created.id, update).await.unwrap();
        let fetched = f.movies.get_movie_by_id(created.id).await.unwrap();

        assert_eq!(fetched.rating, Some(9.0));
        assert!(fetched.updated_at > created.updated_at);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let f = signed_in().await;
        let created = f
            .movies
            .create_movie(NewMovie::new("Heat"))
            .await
            .unwrap();

        f.movies.delete_movie(created.id).await.unwrap();
        assert!(matches!(
            f.movies.get_movie_by_id(created.id).await,
            Err(ApiError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn search_combines_filters() {
        let f = signed_in().await;
        for (title, genre, year, rating) in [
            ("The Matrix", "Sci-Fi", 1999, 8.7),
            ("The Matrix Reloaded", "Sci-Fi", 2003, 7.2),
            ("Matrix of Leadership", "Drama", 1999, 5.0),
            ("Interstellar", "Sci-Fi", 2014, 8.6),
        ] {
            f.movies
                .create_movie(movie(title, genre, year, rating))
                .await
                .unwrap();
        }

        let filter = MovieFilter {
            title: Some("MATRIX".to_string()),
            genre: Some("Sci-Fi".to_string()),
            year: Some(1999),
            ..Default::default()
        };
        let page = f.movies.search_movies(&filter).await.unwrap();

        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].title, "The Matrix");
        assert_eq!((page.page, page.per_page), (1, 10));
    }

    #[tokio::test]
    async fn listings_and_rankings() {
        let f = signed_in().await;
        for (title, genre, year, rating) in [
            ("Alien", "Sci-Fi Horror", 1979, 8.5),
            ("Arrival", "Sci-Fi", 2016, 7.9),
            ("Heat", "Crime", 1995, 8.3),
            ("Se7en", "Crime", 1995, 8.6),
        ] {
            f.movies
                .create_movie(movie(title, genre, year, rating))
                .await
                .unwrap();
        }

        let all = f.movies.list_all_movies().await.unwrap();
        assert_eq!(all.first().map(|m| m.title.as_str()), Some("Se7en"));

        let sci_fi = f.movies.get_movies_by_genre("sci-fi").await.unwrap();
        let titles: Vec<_> = sci_fi.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Alien", "Arrival"]);

        let ninety_five = f.movies.get_movies_by_year(1995).await.unwrap();
        assert_eq!(ninety_five[0].title, "Se7en");

        let top = f.movies.get_top_rated_movies(Some(2)).await.unwrap();
        let titles: Vec<_> = top.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Se7en", "Alien"]);

        assert_eq!(f.movies.list_user_movies().await.unwrap().len(), 4);
        f.auth.logout().await.unwrap();
        assert!(matches!(
            f.movies.list_user_movies().await,
            Err(ApiError::AuthRequired(_))
        ));
    }
}
