//! Login, registration, password change and user administration

use std::sync::Arc;

use catalog_shared::{NewUser, Role, UserRepository};
use serde::Serialize;

use super::context_cache::{UserContext, UserContextCache};
use super::jwt::JwtManager;
use super::password::PasswordHasher;
use crate::error::{ApiError, ApiResult};

const INVALID_ROLE: &str = "Role must be 'admin' or 'user'";

/// Successful login
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in_ms: i64,
    pub user: UserContext,
}

/// Orchestrates credential checks over the user repository
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    jwt: JwtManager,
    cache: Arc<UserContextCache>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: PasswordHasher,
        jwt: JwtManager,
        cache: Arc<UserContextCache>,
    ) -> Self {
        Self {
            users,
            hasher,
            jwt,
            cache,
        }
    }

    /// Verify credentials and issue a token.
    ///
    /// Unknown email and wrong password produce the same error. An unknown
    /// email returns before any hash is computed.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::warn!(email = %email, "Login failed: unknown email");
            return Err(ApiError::InvalidCredentials);
        };

        let valid = self
            .hasher
            .verify_blocking(password.to_string(), user.password_hash.clone())
            .await?;
        if !valid {
            tracing::warn!(user_id = user.id, email = %email, "Login failed: wrong password");
            return Err(ApiError::InvalidCredentials);
        }

        let issued = self.jwt.issue(user.id, &user.email, user.role)?;
        tracing::info!(user_id = user.id, email = %user.email, "Login successful");

        Ok(LoginResponse {
            token: issued.token,
            token_type: "Bearer",
            expires_in_ms: self.jwt.ttl_ms(),
            user: UserContext::from(&user),
        })
    }

    /// Create a user. `role` must be exactly `admin` or `user`.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> ApiResult<UserContext> {
        let role = Role::parse(role).ok_or_else(|| ApiError::validation("role", INVALID_ROLE))?;

        if self.users.exists_by_email(email).await? {
            tracing::warn!(email = %email, "Registration rejected: email already registered");
            return Err(ApiError::InvalidOperation(format!(
                "Email already registered: {email}"
            )));
        }

        let password_hash = self.hasher.hash_blocking(password.to_string()).await?;
        let user = self
            .users
            .insert(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
                role,
            })
            .await?;

        tracing::info!(user_id = user.id, email = %user.email, role = %user.role, "User registered");
        Ok(UserContext::from(&user))
    }

    /// Cached context of the given user
    pub async fn user_context(&self, user_id: i64) -> ApiResult<UserContext> {
        self.cache.get_cached_user_context(user_id).await
    }

    /// Replace the caller's password after checking the current one
    pub async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> ApiResult<()> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        let current_ok = self
            .hasher
            .verify_blocking(current_password.to_string(), user.password_hash.clone())
            .await?;
        if !current_ok {
            tracing::warn!(user_id, "Password change rejected: current password is incorrect");
            return Err(ApiError::InvalidOperation(
                "Current password is incorrect".to_string(),
            ));
        }

        let unchanged = self
            .hasher
            .verify_blocking(new_password.to_string(), user.password_hash)
            .await?;
        if unchanged {
            tracing::warn!(user_id, "Password change rejected: new password equals current");
            return Err(ApiError::InvalidOperation(
                "New password must differ from the current password".to_string(),
            ));
        }

        let password_hash = self.hasher.hash_blocking(new_password.to_string()).await?;
        self.users.update_password(user_id, &password_hash).await?;
        self.cache.invalidate(user_id);

        tracing::info!(user_id, "Password updated");
        Ok(())
    }

    pub async fn list_users(&self) -> ApiResult<Vec<UserContext>> {
        let users = self.users.find_all().await?;
        Ok(users.iter().map(UserContext::from).collect())
    }

    pub async fn get_user(&self, id: i64) -> ApiResult<UserContext> {
        self.users
            .find_by_id(id)
            .await?
            .map(|user| UserContext::from(&user))
            .ok_or(ApiError::UserNotFound)
    }

    /// Delete a user on behalf of `requester_id`. Admins cannot delete themselves.
    pub async fn delete_user(&self, requester_id: i64, id: i64) -> ApiResult<()> {
        if requester_id == id {
            tracing::warn!(user_id = id, "Admin attempted to delete their own account");
            return Err(ApiError::InvalidOperation(
                "Cannot delete your own account".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        if !self.users.delete(id).await? {
            return Err(ApiError::UserNotFound);
        }
        self.cache.invalidate(id);

        tracing::info!(user_id = id, email = %user.email, requested_by = requester_id, "User deleted");
        Ok(())
    }

    /// Ensure an admin account with the given credentials exists.
    ///
    /// An existing account keeps its id and role and gets the new password.
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> ApiResult<()> {
        let password_hash = self.hasher.hash_blocking(password.to_string()).await?;

        match self.users.find_by_email(email).await? {
            Some(user) => {
                self.users.update_password(user.id, &password_hash).await?;
                self.cache.invalidate(user.id);
                tracing::info!(user_id = user.id, email = %email, "Admin password reset from configuration");
            }
            None => {
                let user = self
                    .users
                    .insert(NewUser {
                        name: "Administrator".to_string(),
                        email: email.to_string(),
                        password_hash,
                        role: Role::Admin,
                    })
                    .await?;
                tracing::info!(user_id = user.id, email = %email, "Admin account created from configuration");
            }
        }

        Ok(())
    }
}
