//! End-to-end catalog behaviour against the in-memory backend

use api::models::movie::{MovieFilter, MovieUpdate, NewMovie};
use api::models::review::NewReview;
use api::models::user::ProfileUpdate;
use api::{ApiError, AppState};

const PASSWORD: &str = "TestPassword123!";

const FIXTURES: [(&str, &str, i32, f64); 10] = [
    ("Inception", "Sci-Fi", 2010, 8.8),
    ("The Dark Knight", "Action", 2008, 9.0),
    ("Interstellar", "Sci-Fi", 2014, 8.6),
    ("Pulp Fiction", "Crime", 1994, 8.9),
    ("The Matrix", "Sci-Fi", 1999, 8.7),
    ("Forrest Gump", "Drama", 1994, 8.8),
    ("The Shawshank Redemption", "Drama", 1994, 9.3),
    ("Fight Club", "Drama", 1999, 8.4),
    ("Gladiator", "Action", 2000, 8.5),
    ("The Godfather", "Crime", 1972, 9.2),
];

async fn seeded_state() -> AppState {
    let state = AppState::in_memory();
    state
        .auth
        .register("test@example.com", PASSWORD, Some("TestUser"))
        .await
        .unwrap();

    for (title, genre, year, rating) in FIXTURES {
        state
            .movies
            .create_movie(NewMovie {
                genre: Some(genre.to_string()),
                year: Some(year),
                rating: Some(rating),
                ..NewMovie::new(title)
            })
            .await
            .unwrap();
    }
    state
}

#[tokio::test]
async fn genre_search_reports_full_filtered_count() {
    let state = seeded_state().await;

    let filter = MovieFilter {
        genre: Some("Sci-Fi".to_string()),
        ..Default::default()
    };
    let page = state.movies.search_movies(&filter).await.unwrap();

    assert_eq!(page.total_items, 3);
    assert!(page.items.iter().all(|m| m.genre.as_deref() == Some("Sci-Fi")));
}

#[tokio::test]
async fn pages_stay_within_window_with_constant_total() {
    let state = seeded_state().await;

    let mut seen = Vec::new();
    for page in 1..=4 {
        let filter = MovieFilter {
            page: Some(page),
            per_page: Some(3),
            ..Default::default()
        };
        let result = state.movies.search_movies(&filter).await.unwrap();
        assert!(result.items.len() <= 3);
        assert_eq!(result.total_items, 10);
        seen.extend(result.items.into_iter().map(|m| m.id));
    }

    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 10);
}

#[tokio::test]
async fn movie_lifecycle() {
    let state = seeded_state().await;

    let created = state
        .movies
        .create_movie(NewMovie::new("Test Movie"))
        .await
        .unwrap();
    assert_eq!(
        state.movies.get_movie_by_id(created.id).await.unwrap().title,
        "Test Movie"
    );

    let update = MovieUpdate {
        rating: Some(9.0),
        ..Default::default()
    };
    let updated = state.movies.update_movie(created.id, update).await.unwrap();
    assert_eq!(updated.rating, Some(9.0));
    assert!(updated.updated_at > created.updated_at);

    state.movies.delete_movie(created.id).await.unwrap();
    assert!(matches!(
        state.movies.get_movie_by_id(created.id).await,
        Err(ApiError::NotFound { .. })
    ));
}

#[tokio::test]
async fn review_uniqueness_and_average() {
    let state = seeded_state().await;
    let me = state.auth.get_current_user().await.unwrap();
    let movie = state.movies.list_all_movies().await.unwrap().remove(0);

    state
        .reviews
        .create_review(NewReview::new(movie.id, me.id, 9).with_comment("Great"))
        .await
        .unwrap();
    let err = state
        .reviews
        .create_review(NewReview::new(movie.id, me.id, 2))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::DuplicateReview { .. }));
    assert_eq!(state.reviews.get_average_rating(movie.id).await.unwrap(), 9.0);
}

#[tokio::test]
async fn profile_and_stats_follow_the_session() {
    let state = seeded_state().await;
    let me = state.auth.get_current_user().await.unwrap();

    let profile = state.users.get_current_user_profile().await.unwrap();
    assert_eq!(profile.username.as_deref(), Some("TestUser"));

    let update = ProfileUpdate {
        username: Some("Critic".to_string()),
        email: None,
    };
    state.users.update_user_profile(me.id, update).await.unwrap();
    let profile = state.users.get_user_profile(me.id).await.unwrap();
    assert_eq!(profile.username.as_deref(), Some("Critic"));

    let stats = state.users.get_current_user_stats().await.unwrap();
    assert_eq!(stats.total_movies, 10);

    state.auth.logout().await.unwrap();
    assert!(matches!(
        state.users.get_current_user_stats().await,
        Err(ApiError::AuthRequired(_))
    ));
}
