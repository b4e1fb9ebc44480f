//! API routes

pub mod auth;
pub mod categories;
pub mod extract;
pub mod health;
pub mod products;
pub mod products_v2;
pub mod users;

use std::any::Any;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use catalog_shared::{PageRequest, Role, SortDirection, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    auth::{authenticate, require_access, Access},
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Body returned by delete endpoints that answer 200
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// Paging query parameters shared by list endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl PageParams {
    /// Apply defaults and check the sort field against `allowed`
    pub fn resolve(&self, allowed: &[(&str, &'static str)]) -> ApiResult<PageRequest> {
        Ok(PageRequest::resolve(
            self.page.unwrap_or(0),
            self.size.unwrap_or(DEFAULT_PAGE_SIZE),
            self.sort_by.as_deref().unwrap_or("id"),
            self.sort_dir
                .as_deref()
                .map(SortDirection::parse)
                .unwrap_or_default(),
            allowed,
        )?)
    }
}

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    let auth_state = state.auth_state();
    let cors = cors_layer(&state.config.cors_allowed_origins);

    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Public routes: login and catalog reads
    let public_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/api/categories", get(categories::list_categories))
        .route("/api/categories/:id", get(categories::get_category))
        .route("/api/products", get(products::list_products))
        .route("/api/products/:id", get(products::get_product))
        .route("/api/v2/products", get(products_v2::list_products))
        .route("/api/v2/products/:id", get(products_v2::get_product));

    // Any authenticated caller
    let authenticated_routes = Router::new()
        .route("/auth/context", get(auth::context))
        .route("/users/password", put(users::update_password))
        .route_layer(middleware::from_fn_with_state(
            Access::Authenticated,
            require_access,
        ));

    // Admin only: user administration and catalog mutations
    let admin_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/users", get(auth::list_users))
        .route(
            "/auth/users/:id",
            get(auth::get_user).delete(auth::delete_user),
        )
        .route("/api/categories", post(categories::create_category))
        .route(
            "/api/categories/:id",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route("/api/products", post(products::create_product))
        .route(
            "/api/products/:id",
            put(products::update_product).delete(products::delete_product),
        )
        .route("/api/v2/products", post(products_v2::create_product))
        .route(
            "/api/v2/products/:id",
            put(products_v2::update_product).delete(products_v2::delete_product),
        )
        .route_layer(middleware::from_fn_with_state(
            Access::Role(Role::Admin),
            require_access,
        ));

    Router::new()
        .merge(health_routes)
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(admin_routes)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(auth_state, authenticate))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Resource not found".to_string())
}

/// Turn a handler panic into the generic 500 body
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
