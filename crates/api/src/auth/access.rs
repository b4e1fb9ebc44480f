//! Per-route access requirements
//!
//! Each route group declares what it needs and is wrapped with
//! `route_layer(from_fn_with_state(Access::.., require_access))`. The check
//! runs after [`authenticate`](super::authenticate) has attached (or not)
//! the caller's identity.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use catalog_shared::Role;

use super::middleware::AuthUser;
use crate::error::ApiError;

/// Access requirement of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Role(Role),
}

impl Access {
    /// Missing identity is `Unauthorized`; an identity with the wrong role is `Forbidden`
    pub fn check(&self, identity: Option<&AuthUser>) -> Result<(), ApiError> {
        match (self, identity) {
            (Access::Public, _) => Ok(()),
            (_, None) => Err(ApiError::Unauthorized),
            (Access::Authenticated, Some(_)) => Ok(()),
            (Access::Role(required), Some(user)) if user.role == *required => Ok(()),
            (Access::Role(required), Some(user)) => {
                tracing::warn!(
                    user_id = user.user_id,
                    role = %user.role,
                    required = %required,
                    "Access denied: insufficient role"
                );
                Err(ApiError::Forbidden)
            }
        }
    }
}

/// Reject the request before the handler runs unless `access` is satisfied
pub async fn require_access(
    State(access): State<Access>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    access.check(request.extensions().get::<AuthUser>())?;
    Ok(next.run(request).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn identity(role: Role) -> AuthUser {
        AuthUser {
            email: "someone@example.com".to_string(),
            user_id: 5,
            role,
            authorities: vec![role.authority()],
        }
    }

    #[test]
    fn test_public_allows_everyone() {
        assert!(Access::Public.check(None).is_ok());
        assert!(Access::Public.check(Some(&identity(Role::User))).is_ok());
    }

    #[test]
    fn test_authenticated_requires_identity() {
        assert!(matches!(
            Access::Authenticated.check(None),
            Err(ApiError::Unauthorized)
        ));
        assert!(Access::Authenticated
            .check(Some(&identity(Role::User)))
            .is_ok());
    }

    #[test]
    fn test_role_gate() {
        let admin_only = Access::Role(Role::Admin);

        assert!(matches!(admin_only.check(None), Err(ApiError::Unauthorized)));
        assert!(matches!(
            admin_only.check(Some(&identity(Role::User))),
            Err(ApiError::Forbidden)
        ));
        assert!(admin_only.check(Some(&identity(Role::Admin))).is_ok());
    }
}
