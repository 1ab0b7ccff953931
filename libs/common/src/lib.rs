//! Common library for the cinema catalog
//!
//! This crate provides the pieces shared by every service: backend
//! configuration, the shared client handle, the table store and identity
//! seams with their REST, in-memory and disconnected implementations, and
//! the error type for calls that cross the backend boundary.
//!
//! ```rust,no_run
//! use common::client::BackendClient;
//! use common::config::BackendConfig;
//! use common::store::{Query, RemoteStore, rest::RestStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BackendConfig::from_env()?;
//!     let store = RestStore::new(BackendClient::new(config)?);
//!     let rows = store.select("movies", &Query::new().eq("genre", "Sci-Fi").with_count()).await?;
//!     println!("Sci-Fi movies: {:?}", rows.total);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod store;
