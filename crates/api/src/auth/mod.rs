//! Authentication and authorization for the catalog API

pub mod access;
pub mod context_cache;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use access::{require_access, Access};
pub use context_cache::{CacheStats, UserContext, UserContextCache};
pub use jwt::{Claims, IssuedToken, JwtError, JwtManager, VerifiedClaims};
pub use middleware::{authenticate, AuthState, AuthUser, CurrentUser};
pub use password::{PasswordError, PasswordHasher};
pub use service::{AuthService, LoginResponse};
