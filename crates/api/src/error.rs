//! API error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use catalog_shared::{PagingError, StoreError};
use serde::Serialize;
use serde_json::json;

use crate::auth::{JwtError, PasswordError};

/// One rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Authentication required")]
    Unauthorized,
    #[error("Insufficient permissions")]
    Forbidden,

    // Validation errors
    #[error("Invalid request data")]
    Validation(Vec<FieldError>),
    #[error("Invalid request: {0}")]
    BadRequest(String),

    // Domain rule violations
    #[error("{0}")]
    InvalidOperation(String),

    // Resource errors
    #[error("{0}")]
    NotFound(String),
    #[error("User not found")]
    UserNotFound,
    #[error("{0}")]
    Conflict(String),

    // Internal errors (detail is logged, never returned)
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Validation(_) | ApiError::BadRequest(_) | ApiError::InvalidOperation(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) | ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            // Authentication
            ApiError::InvalidCredentials => ("INVALID_CREDENTIALS", self.to_string()),
            ApiError::Unauthorized => ("UNAUTHORIZED", self.to_string()),
            ApiError::Forbidden => ("FORBIDDEN", self.to_string()),

            // Validation
            ApiError::Validation(_) => ("VALIDATION_ERROR", self.to_string()),
            ApiError::BadRequest(msg) => ("BAD_REQUEST", msg.clone()),
            ApiError::InvalidOperation(msg) => ("INVALID_OPERATION", msg.clone()),

            // Resources
            ApiError::NotFound(msg) => ("NOT_FOUND", msg.clone()),
            ApiError::UserNotFound => ("USER_NOT_FOUND", self.to_string()),
            ApiError::Conflict(msg) => ("CONFLICT", msg.clone()),

            // Internal
            ApiError::Database(detail) => {
                tracing::error!(error = %detail, "Database error");
                ("DATABASE_ERROR", "Internal server error. Please try again later.".to_string())
            }
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                ("INTERNAL_ERROR", "Internal server error. Please try again later.".to_string())
            }
        };

        let body = match &self {
            ApiError::Validation(fields) => json!({
                "error": {
                    "code": code,
                    "message": message,
                    "fields": fields,
                }
            }),
            _ => json!({
                "error": {
                    "code": code,
                    "message": message,
                }
            }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(format!("Not found: {what}")),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Database(msg) => ApiError::Database(msg),
        }
    }
}

impl From<PagingError> for ApiError {
    fn from(err: PagingError) -> Self {
        let field = match err {
            PagingError::InvalidSize(_) => "size",
            PagingError::InvalidSortField(_) => "sortBy",
        };
        ApiError::validation(field, err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value ({})", e.code));
                    FieldError::new(field.to_string(), message)
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field).then(a.message.cmp(&b.message)));
        ApiError::Validation(fields)
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired | JwtError::Invalid => ApiError::Unauthorized,
            JwtError::Encoding(msg) => ApiError::Internal(format!("token encoding: {msg}")),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
