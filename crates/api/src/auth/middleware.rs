//! Bearer token authentication middleware
//!
//! Runs on every request. A valid token attaches an [`AuthUser`] to the
//! request extensions; anything else leaves the request anonymous and lets
//! the route's [`Access`](super::Access) requirement decide.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use catalog_shared::Role;

use super::jwt::JwtManager;
use crate::error::ApiError;

/// State needed by the authentication middleware
#[derive(Clone)]
pub struct AuthState {
    pub jwt: JwtManager,
}

/// Identity attached to an authenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub email: String,
    pub user_id: i64,
    pub role: Role,
    /// Granted authorities, e.g. `ROLE_ADMIN`
    pub authorities: Vec<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Attach the caller's identity when a valid bearer token is presented.
///
/// Never rejects a request: missing, malformed and expired tokens all
/// continue as anonymous.
pub async fn authenticate(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = bearer_token(request.headers()).and_then(|token| {
        match state.jwt.verify(token) {
            Ok(claims) => Some(AuthUser {
                authorities: vec![claims.role.authority()],
                email: claims.email,
                user_id: claims.user_id,
                role: claims.role,
            }),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %request.uri().path(),
                    "Bearer token rejected, continuing as anonymous"
                );
                None
            }
        }
    });

    if let Some(user) = identity {
        if request.extensions().get::<AuthUser>().is_none() {
            tracing::debug!(user_id = user.user_id, email = %user.email, "Request authenticated");
            request.extensions_mut().insert(user);
        }
    }

    next.run(request).await
}

/// Extractor for handlers that need the caller's identity
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}
