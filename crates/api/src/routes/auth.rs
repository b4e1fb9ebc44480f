//! Authentication and user administration routes

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use validator::Validate;

use super::extract::{not_blank, Path, ValidatedJson};
use super::SuccessResponse;
use crate::{
    auth::{CurrentUser, LoginResponse, UserContext},
    error::ApiResult,
    state::AppState,
};

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "must have at most 100 characters")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(
        email(message = "must be a valid email"),
        length(max = 150, message = "must have at most 150 characters")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 8, message = "must have at least 8 characters"))]
    pub password: String,
    /// Checked by the service: exactly `admin` or `user`
    #[serde(default)]
    pub role: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Exchange credentials for a bearer token
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    tracing::info!(email = %req.email, "Login attempt");
    let response = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(response))
}

/// Create a user (admin only)
pub async fn register(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserContext>)> {
    tracing::info!(email = %req.email, requested_by = admin.user_id, "Registering user");
    let user = state
        .auth
        .register(&req.name, &req.email, &req.password, &req.role)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Context of the calling user, served from the user-context cache
pub async fn context(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<UserContext>> {
    let context = state.auth.user_context(user.user_id).await?;
    Ok(Json(context))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserContext>>> {
    let users = state.auth.list_users().await?;
    tracing::info!(count = users.len(), "Listed users");
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserContext>> {
    Ok(Json(state.auth.get_user(id).await?))
}

/// Delete another user. Deleting yourself is rejected.
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<SuccessResponse>> {
    state.auth.delete_user(admin.user_id, id).await?;
    Ok(Json(SuccessResponse::new("User deleted successfully")))
}
