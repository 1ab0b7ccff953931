//! Application state composing the repositories

use std::sync::Arc;

use auth::AuthService;
use common::client::BackendClient;
use common::config::BackendConfig;
use common::error::StoreResult;
use common::identity::IdentityProvider;
use common::identity::memory::MemoryIdentity;
use common::identity::rest::RestIdentity;
use common::store::RemoteStore;
use common::store::disconnected::Disconnected;
use common::store::memory::MemoryStore;
use common::store::rest::RestStore;
use tracing::{error, info};

use crate::executor::{QueryExecutor, REVIEWS};
use crate::repositories::{movies::MovieRepository, reviews::ReviewRepository, users::UserRepository};

/// Application state shared by every caller
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub movies: MovieRepository,
    pub reviews: ReviewRepository,
    pub users: UserRepository,
}

impl AppState {
    /// Wire the repositories over one table store and one identity provider
    ///
    /// Reviews are checked for an existing (movie, user) pair before insert.
    pub fn new(store: Arc<dyn RemoteStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        let executor = QueryExecutor::new(store);
        let auth = AuthService::new(identity);
        Self {
            movies: MovieRepository::new(executor.clone(), auth.clone()),
            reviews: ReviewRepository::new(executor.clone()).with_duplicate_check(),
            users: UserRepository::new(executor, auth.clone()),
            auth,
        }
    }

    /// State backed by the hosted backend; both stores share one client
    pub fn connect(config: BackendConfig) -> StoreResult<Self> {
        let client = BackendClient::new(config)?;
        Ok(Self::new(
            Arc::new(RestStore::new(client.clone())),
            Arc::new(RestIdentity::new(client)),
        ))
    }

    /// State from `SUPABASE_*` settings
    ///
    /// Missing or invalid settings are reported at error level and yield a
    /// disconnected state whose every call fails with `NotConfigured`.
    pub fn from_env() -> Self {
        match BackendConfig::from_env().and_then(Self::connect) {
            Ok(state) => {
                info!("Backend client initialised");
                state
            }
            Err(e) => {
                error!("Backend unavailable, running disconnected: {}", e);
                let offline = Arc::new(Disconnected::new(e.to_string()));
                Self::new(offline.clone(), offline)
            }
        }
    }

    /// Self-contained state for local runs and tests
    pub fn in_memory() -> Self {
        let store = MemoryStore::new().with_unique(REVIEWS.name, &["movie_id", "user_id"]);
        Self::new(Arc::new(store), Arc::new(MemoryIdentity::new()))
    }
}
