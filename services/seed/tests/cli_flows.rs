//! Seed and smoke runs against the in-memory backend

use api::AppState;
use api::models::user::UserStats;
use seed::fixtures::{DEMO_EMAIL, DEMO_PASSWORD, DEMO_USERNAME};

#[tokio::test]
async fn seed_creates_demo_user_and_catalog() {
    let state = AppState::in_memory();

    let report = seed::seeding::seed(&state).await.unwrap();
    assert_eq!(report.movies, 10);
    assert_eq!(report.user_movies, 10);
    assert_eq!(
        report.stats,
        UserStats {
            total_movies: 10,
            watched_movies: 4,
            favorite_movies: 3,
            pending_movies: 3,
        }
    );

    // signed out at the end, the account stays usable
    assert!(state.auth.get_current_user().await.is_none());
    let session = state.auth.login(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
    assert_eq!(session.user.username(), Some(DEMO_USERNAME));
}

#[tokio::test]
async fn reseeding_replaces_previous_data() {
    let state = AppState::in_memory();

    let first = seed::seeding::seed(&state).await.unwrap();
    let second = seed::seeding::seed(&state).await.unwrap();

    assert_eq!(first.user_id, second.user_id);
    assert_eq!(second.stats, first.stats);
}

#[tokio::test]
async fn seed_fails_without_backend() {
    let offline = std::sync::Arc::new(common::store::disconnected::Disconnected::new("no config"));
    let state = AppState::new(offline.clone(), offline);

    assert!(seed::seeding::seed(&state).await.is_err());
}

#[tokio::test]
async fn smoke_suite_passes_in_memory() {
    let state = AppState::in_memory();

    let suite = seed::smoke::run(&state).await;
    let failures: Vec<_> = suite.outcomes().iter().filter(|o| !o.passed).collect();
    assert!(failures.is_empty(), "{:?}", failures);
}

#[test]
fn memory_flag_selects_in_process_backend() {
    use clap::Parser;
    use seed::cli::SeedCli;

    let cli = SeedCli::try_parse_from(["seed", "--memory"]).unwrap();
    assert!(cli.backend.memory);
    assert!(SeedCli::try_parse_from(["seed", "--memroy"]).is_err());
}
