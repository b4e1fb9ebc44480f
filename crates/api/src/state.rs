//! Application state shared by all handlers

use std::sync::Arc;

use catalog_shared::{
    CategoryRepository, PgCategoryRepository, PgProductRepository, PgUserRepository,
    ProductRepository, UserRepository,
};
use sqlx::PgPool;

use crate::auth::{
    AuthService, AuthState, JwtManager, PasswordError, PasswordHasher, UserContextCache,
};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Used directly only by the health probes
    pub pool: PgPool,
    pub jwt: JwtManager,
    pub categories: Arc<dyn CategoryRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub auth: AuthService,
}

impl AppState {
    /// Build state backed by PostgreSQL repositories
    pub fn new(config: Config, pool: PgPool) -> Result<Self, PasswordError> {
        let users = Arc::new(PgUserRepository::new(pool.clone()));
        let categories = Arc::new(PgCategoryRepository::new(pool.clone()));
        let products = Arc::new(PgProductRepository::new(pool.clone()));
        Self::with_repositories(config, pool, users, categories, products)
    }

    /// Build state over arbitrary repository implementations
    pub fn with_repositories(
        config: Config,
        pool: PgPool,
        users: Arc<dyn UserRepository>,
        categories: Arc<dyn CategoryRepository>,
        products: Arc<dyn ProductRepository>,
    ) -> Result<Self, PasswordError> {
        let hasher = PasswordHasher::new(
            config.password_hash_iterations,
            config.password_hash_memory_kib,
        )?;
        let jwt = JwtManager::new(&config.jwt_secret, config.jwt_expiration_ms);
        let context_cache = Arc::new(UserContextCache::new(users.clone()));
        let auth = AuthService::new(users, hasher, jwt.clone(), context_cache);

        Ok(Self {
            config: Arc::new(config),
            pool,
            jwt,
            categories,
            products,
            auth,
        })
    }

    /// State for the authentication middleware
    pub fn auth_state(&self) -> AuthState {
        AuthState {
            jwt: self.jwt.clone(),
        }
    }
}
