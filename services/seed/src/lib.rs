//! Command-line tooling for the cinema catalog
//!
//! Shared by the `seed` and `smoke` binaries: logging setup, backend
//! selection, demo fixtures, the seed routine and the smoke suite.

use api::AppState;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod fixtures;
pub mod seeding;
pub mod smoke;

use cli::BackendArgs;

/// Initialize logging; `RUST_LOG` overrides the default `info` level
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Build the application state for a CLI run
///
/// Hosted settings come from the environment, after loading `.env` if one
/// exists. Missing settings leave the state disconnected, and every call
/// then fails with a configuration error.
pub fn load_state(backend: BackendArgs) -> AppState {
    if backend.memory {
        info!("Using in-memory backend");
        return AppState::in_memory();
    }

    if let Err(e) = dotenvy::dotenv() {
        debug!("No .env file loaded: {}", e);
    }
    AppState::from_env()
}
