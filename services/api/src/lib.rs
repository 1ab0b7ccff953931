//! Cinema catalog API
//!
//! Typed repositories for movies, reviews and user profiles on top of a
//! remote table store. Every read and write goes through
//! [`executor::QueryExecutor`], which normalizes pagination, stamps
//! timestamps and folds store answers into [`error::ApiResult`].

pub mod clock;
pub mod error;
pub mod executor;
pub mod models;
pub mod repositories;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use executor::{ListRequest, Page, Pagination, QueryExecutor};
pub use state::AppState;
