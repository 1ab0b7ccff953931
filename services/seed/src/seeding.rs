//! Demo data loader
//!
//! Signs in as the demo user (creating it on first run), wipes that user's
//! movies and list entries, inserts the sample catalog, puts every movie on
//! the user's list and signs out again.

use anyhow::{Context, Result};
use api::AppState;
use api::models::movie::Movie;
use api::models::user::{UserMovie, UserStats};
use common::identity::Identity;
use tracing::{info, warn};
use uuid::Uuid;

use crate::fixtures::{
    DEMO_EMAIL, DEMO_PASSWORD, DEMO_USERNAME, SAMPLE_MOVIES, plan_user_movies,
};

/// What a seed run left behind
#[derive(Debug, Clone, PartialEq)]
pub struct SeedReport {
    pub user_id: Uuid,
    pub movies: usize,
    pub user_movies: usize,
    pub stats: UserStats,
}

/// Sign in as the demo user, registering the account if sign-in fails
pub async fn login_or_create_demo_user(state: &AppState) -> Result<Identity> {
    info!("Signing in as {}", DEMO_EMAIL);

    let session = match state.auth.login(DEMO_EMAIL, DEMO_PASSWORD).await {
        Ok(session) => session,
        Err(e) => {
            warn!("Demo sign-in failed ({}), creating the account", e);
            state
                .auth
                .register(DEMO_EMAIL, DEMO_PASSWORD, Some(DEMO_USERNAME))
                .await
                .context("Failed to create demo user")?;
            state
                .auth
                .login(DEMO_EMAIL, DEMO_PASSWORD)
                .await
                .context("Failed to sign in after creating demo user")?
        }
    };

    info!("Signed in: {}", session.user.id);
    Ok(session.user)
}

/// Remove the user's list entries, then the movies they own
pub async fn clear_existing_data(state: &AppState, user_id: Uuid) -> Result<()> {
    let links = state
        .users
        .clear_user_movies(user_id)
        .await
        .context("Failed to clear user movies")?;
    let movies = state
        .movies
        .delete_movies_of(user_id)
        .await
        .context("Failed to clear movies")?;

    info!("Previous data removed ({} movies, {} list entries)", movies, links);
    Ok(())
}

pub async fn insert_movies(state: &AppState) -> Result<Vec<Movie>> {
    let movies = SAMPLE_MOVIES.iter().map(|m| m.to_new_movie()).collect();
    let inserted = state
        .movies
        .create_movies(movies)
        .await
        .context("Failed to insert sample movies")?;
    info!("{} movies inserted", inserted.len());
    Ok(inserted)
}

pub async fn insert_user_movies(
    state: &AppState,
    user_id: Uuid,
    movies: &[Movie],
) -> Result<Vec<UserMovie>> {
    let links = plan_user_movies(user_id, movies, &mut rand::thread_rng());
    let inserted = state
        .users
        .add_user_movies(links)
        .await
        .context("Failed to create user movies")?;
    info!("{} list entries created", inserted.len());
    Ok(inserted)
}

fn print_stats(stats: &UserStats) {
    let rule = "-".repeat(40);
    println!("\nSTATS");
    println!("{}", rule);
    println!("  Total movies:       {}", stats.total_movies);
    println!("  Watched:            {}", stats.watched_movies);
    println!("  Pending:            {}", stats.pending_movies);
    println!("  Favorite:           {}", stats.favorite_movies);
    println!("{}", rule);
}

/// Run the whole seed; the demo session is closed on success
pub async fn seed(state: &AppState) -> Result<SeedReport> {
    let user = login_or_create_demo_user(state).await?;
    clear_existing_data(state, user.id).await?;

    let movies = insert_movies(state).await?;
    let links = insert_user_movies(state, user.id, &movies).await?;

    let stats = state
        .users
        .get_user_stats(user.id)
        .await
        .context("Failed to compute stats")?;
    print_stats(&stats);

    state.auth.logout().await.context("Failed to sign out")?;

    Ok(SeedReport {
        user_id: user.id,
        movies: movies.len(),
        user_movies: links.len(),
        stats,
    })
}
