//! Application configuration

use std::env;

/// Default token lifetime: 24 hours
pub const DEFAULT_JWT_EXPIRATION_MS: i64 = 86_400_000;

/// Longest accepted token lifetime: 365 days
pub const MAX_JWT_EXPIRATION_MS: i64 = 365 * 86_400_000;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,
    pub cors_allowed_origins: Vec<String>,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Authentication
    pub jwt_secret: String,
    pub jwt_expiration_ms: i64,
    pub password_hash_iterations: u32,
    pub password_hash_memory_kib: u32,

    // Optional admin bootstrap
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,

            // Authentication
            jwt_secret: {
                let secret =
                    env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
                if secret.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "JWT_SECRET must be at least 32 characters",
                    ));
                }
                secret
            },
            jwt_expiration_ms: {
                let ttl = parse_or("JWT_EXPIRATION_MS", DEFAULT_JWT_EXPIRATION_MS)?;
                if ttl <= 0 || ttl > MAX_JWT_EXPIRATION_MS {
                    return Err(ConfigError::Invalid("JWT_EXPIRATION_MS"));
                }
                ttl
            },
            password_hash_iterations: {
                let iterations = parse_or("PASSWORD_HASH_ITERATIONS", 3)?;
                if iterations == 0 {
                    return Err(ConfigError::Invalid("PASSWORD_HASH_ITERATIONS"));
                }
                iterations
            },
            password_hash_memory_kib: parse_or("PASSWORD_HASH_MEMORY_KIB", 19_456)?,

            admin_email: env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset.
/// A set but unparsable value is an error rather than a silent default.
fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
}
