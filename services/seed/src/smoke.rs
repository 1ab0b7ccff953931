//! End-to-end smoke suite
//!
//! Walks a fresh account through registration, movie CRUD, search, profile,
//! stats and reviews, then cleans up. Each step is recorded; later steps
//! that depend on a failed one are recorded as skipped failures.

use std::fmt::Display;

use api::models::movie::{MovieFilter, MovieUpdate, NewMovie};
use api::models::review::NewReview;
use api::models::user::ProfileUpdate;
use api::{ApiError, AppState};
use chrono::Utc;
use tracing::{error, info};

pub const TEST_PASSWORD: &str = "TestPassword123!";
pub const TEST_USERNAME: &str = "TestUser";

/// Result of one step
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub name: String,
    pub passed: bool,
    pub detail: Option<String>,
}

/// Ordered record of every step
#[derive(Debug, Default)]
pub struct Suite {
    outcomes: Vec<Outcome>,
}

impl Suite {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: &str, passed: bool, detail: Option<String>) {
        self.outcomes.push(Outcome {
            name: name.to_string(),
            passed,
            detail,
        });
    }

    /// Record the outcome of a call, handing back its value on success
    pub fn record<T, E: Display>(&mut self, name: &str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => {
                info!("PASS {}", name);
                self.push(name, true, None);
                Some(value)
            }
            Err(e) => {
                error!("FAIL {}: {}", name, e);
                self.push(name, false, Some(e.to_string()));
                None
            }
        }
    }

    /// Record a condition
    pub fn ensure(&mut self, name: &str, condition: bool, detail: impl Into<String>) {
        if condition {
            info!("PASS {}", name);
            self.push(name, true, None);
        } else {
            let detail = detail.into();
            error!("FAIL {}: {}", name, detail);
            self.push(name, false, Some(detail));
        }
    }

    fn skip(&mut self, name: &str) {
        error!("FAIL {}: skipped, prerequisite failed", name);
        self.push(name, false, Some("skipped, prerequisite failed".to_string()));
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn print_summary(&self) {
        let rule = "=".repeat(50);
        println!("\n{}\nSUMMARY\n{}", rule, rule);
        for outcome in &self.outcomes {
            let mark = if outcome.passed { "PASS" } else { "FAIL" };
            match &outcome.detail {
                Some(detail) => println!("  {} {}: {}", mark, outcome.name, detail),
                None => println!("  {} {}", mark, outcome.name),
            }
        }
        println!(
            "\n  Passed: {}  Failed: {}  Total: {}\n{}",
            self.passed(),
            self.failed(),
            self.outcomes.len(),
            rule
        );
    }
}

/// Run every step against `state`
pub async fn run(state: &AppState) -> Suite {
    let mut suite = Suite::new();
    let stamp = Utc::now().timestamp_millis();
    let email = format!("test_{}@cinematicverse.com", stamp);
    info!("Smoke user: {}", email);

    // Auth
    suite.record(
        "register",
        state
            .auth
            .register(&email, TEST_PASSWORD, Some(TEST_USERNAME))
            .await,
    );
    let session = suite.record("login", state.auth.login(&email, TEST_PASSWORD).await);
    let current = state.auth.get_current_user().await;
    suite.ensure(
        "current user",
        current.as_ref().and_then(|u| u.email.as_deref()) == Some(email.as_str()),
        "no signed-in user after login",
    );
    suite.ensure(
        "session check",
        state.auth.check_session().await.is_some(),
        "no active session",
    );
    let Some(user) = session.map(|s| s.user) else {
        for step in ["movie crud", "search", "profile", "stats", "reviews", "cleanup"] {
            suite.skip(step);
        }
        return suite;
    };

    // Movies
    let title = format!("Test Movie {}", stamp);
    let new_movie = NewMovie {
        genre: Some("Action".to_string()),
        year: Some(2024),
        director: Some("Test Director".to_string()),
        poster_url: Some("https://example.com/poster.jpg".to_string()),
        rating: Some(8.5),
        ..NewMovie::new(&title)
    };
    let created = suite.record("create movie", state.movies.create_movie(new_movie).await);
    suite.ensure(
        "reject empty title",
        matches!(
            state.movies.create_movie(NewMovie::new("")).await,
            Err(ApiError::Validation(_))
        ),
        "empty title was accepted",
    );

    if let Some(movie) = &created {
        let fetched = suite.record("get movie", state.movies.get_movie_by_id(movie.id).await);
        suite.ensure(
            "get movie title",
            fetched.is_some_and(|m| m.title == title),
            "title mismatch",
        );

        let update = MovieUpdate {
            rating: Some(9.0),
            ..Default::default()
        };
        let updated = suite.record(
            "update movie",
            state.movies.update_movie(movie.id, update).await,
        );
        suite.ensure(
            "update movie rating",
            updated.is_some_and(|m| m.rating == Some(9.0) && m.updated_at > movie.updated_at),
            "rating or updated_at not refreshed",
        );

        let mine = suite.record("list user movies", state.movies.list_user_movies().await);
        suite.ensure(
            "list user movies contains new movie",
            mine.is_some_and(|list| list.iter().any(|m| m.id == movie.id)),
            "new movie missing from user list",
        );
    } else {
        suite.skip("movie crud");
    }

    // Search
    let by_title = MovieFilter {
        title: Some(title.to_lowercase()),
        ..Default::default()
    };
    let found = suite.record("search by title", state.movies.search_movies(&by_title).await);
    suite.ensure(
        "search by title finds movie",
        found.is_some_and(|page| page.total_items >= 1 && page.items.iter().any(|m| m.title == title)),
        "title search returned nothing",
    );
    let by_genre = MovieFilter {
        genre: Some("Action".to_string()),
        per_page: Some(5),
        ..Default::default()
    };
    let page = suite.record("search by genre", state.movies.search_movies(&by_genre).await);
    suite.ensure(
        "search window",
        page.is_some_and(|p| p.items.len() <= 5 && p.items.iter().all(|m| m.genre.as_deref() == Some("Action"))),
        "window too large or wrong genre",
    );
    suite.record("top rated", state.movies.get_top_rated_movies(Some(5)).await);

    // Profile and stats
    let profile = suite.record("current profile", state.users.get_current_user_profile().await);
    suite.ensure(
        "profile username",
        profile.is_some_and(|p| p.username.as_deref() == Some(TEST_USERNAME)),
        "username not stored",
    );
    let update = ProfileUpdate {
        username: Some(format!("Tester{}", stamp % 100_000)),
        email: None,
    };
    suite.record(
        "update profile",
        state.users.update_user_profile(user.id, update).await,
    );
    suite.record("profile by id", state.users.get_user_profile(user.id).await);
    let stats = suite.record("stats", state.users.get_current_user_stats().await);
    suite.ensure(
        "stats count own movie",
        stats.is_some_and(|s| s.total_movies >= u64::from(created.is_some())),
        "owned movie not counted",
    );

    // Reviews
    if let Some(movie) = &created {
        let review = NewReview::new(movie.id, user.id, 9).with_comment("Smoke review");
        let written = suite.record("create review", state.reviews.create_review(review).await);
        suite.ensure(
            "duplicate review rejected",
            matches!(
                state
                    .reviews
                    .create_review(NewReview::new(movie.id, user.id, 3))
                    .await,
                Err(ApiError::DuplicateReview { .. })
            ),
            "second review for the same movie was accepted",
        );
        let average = suite.record(
            "average rating",
            state.reviews.get_average_rating(movie.id).await,
        );
        suite.ensure(
            "average rating value",
            average == Some(9.0),
            format!("expected 9.0, got {:?}", average),
        );

        // Cleanup
        if let Some(review) = written {
            suite.record("delete review", state.reviews.delete_review(review.id).await);
        }
        suite.record("delete movie", state.movies.delete_movie(movie.id).await);
        suite.ensure(
            "deleted movie is gone",
            matches!(
                state.movies.get_movie_by_id(movie.id).await,
                Err(ApiError::NotFound { .. })
            ),
            "movie still readable after delete",
        );
    } else {
        suite.skip("reviews");
        suite.skip("cleanup");
    }

    suite.record("logout", state.auth.logout().await);
    suite.ensure(
        "signed out",
        state.auth.get_current_user().await.is_none(),
        "user still signed in after logout",
    );

    suite
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suite_counts_outcomes() {
        let mut suite = Suite::new();
        assert_eq!(suite.record::<_, String>("ok", Ok(1)), Some(1));
        assert_eq!(suite.record::<i32, _>("bad", Err("boom")), None);
        suite.ensure("check", true, "unused");

        assert_eq!(suite.passed(), 2);
        assert_eq!(suite.failed(), 1);
        assert!(!suite.is_success());
        assert_eq!(suite.outcomes()[1].detail.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn disconnected_backend_fails_the_suite() {
        let offline = std::sync::Arc::new(common::store::disconnected::Disconnected::new("no config"));
        let state = AppState::new(offline.clone(), offline);

        let suite = run(&state).await;
        assert!(!suite.is_success());
        assert!(suite.outcomes().iter().any(|o| o.name == "cleanup" && !o.passed));
    }
}
