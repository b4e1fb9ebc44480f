//! Catalog API Library
//!
//! HTTP server components for the product catalog: configuration, error
//! mapping, bearer-token authentication, role-based access control and the
//! category/product routes.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
