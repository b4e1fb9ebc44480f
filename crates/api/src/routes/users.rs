//! Self-service user routes

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use validator::Validate;

use super::extract::ValidatedJson;
use crate::{auth::CurrentUser, error::ApiResult, state::AppState};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    #[validate(length(min = 8, message = "must have at least 8 characters"))]
    pub current_password: String,
    #[serde(default)]
    #[validate(length(min = 8, message = "must have at least 8 characters"))]
    pub new_password: String,
}

/// Change the caller's own password
pub async fn update_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(req): ValidatedJson<UpdatePasswordRequest>,
) -> ApiResult<StatusCode> {
    tracing::info!(user_id = user.user_id, email = %user.email, "Password update requested");
    state
        .auth
        .change_password(user.user_id, &req.current_password, &req.new_password)
        .await?;
    Ok(StatusCode::OK)
}
