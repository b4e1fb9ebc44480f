//! Read-through cache of user-context projections
//!
//! Caches `{id, email, role}` per user id so identity checks do not hit the
//! database on every call. Entries never expire on their own: callers that
//! mutate a user must call [`UserContextCache::invalidate`].
//!
//! Every invalidation bumps a generation counter. A load that started under
//! an older generation is handed to its caller but never published, so a
//! lookup racing with a delete cannot resurrect the deleted entry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use catalog_shared::{Role, User, UserRepository};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};

/// Public projection of a credential record (no password hash)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserContext {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserContext {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Thread-safe in-memory user-context cache
pub struct UserContextCache {
    entries: RwLock<HashMap<i64, UserContext>>,
    users: Arc<dyn UserRepository>,
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl UserContextCache {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            users,
            generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get the cached context for a user, loading it on first use.
    ///
    /// Concurrent first calls for the same id may both hit the repository;
    /// the first value published wins and every caller sees a complete entry.
    pub async fn get_cached_user_context(&self, user_id: i64) -> ApiResult<UserContext> {
        if let Some(context) = self.get(user_id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(context);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::info!(user_id, "User context cache miss, loading from database");
        let generation = self.generation.load(Ordering::Acquire);

        let user = self.users.find_by_id(user_id).await?.ok_or_else(|| {
            tracing::warn!(user_id, "User not found while populating context cache");
            ApiError::UserNotFound
        })?;

        Ok(self.publish(UserContext::from(&user), generation))
    }

    /// Get a cached entry without loading
    pub fn get(&self, user_id: i64) -> Option<UserContext> {
        let entries = self.entries.read().ok()?;
        entries.get(&user_id).cloned()
    }

    /// Publish a fully built entry unless one is already present or the
    /// cache was invalidated since `generation` was read; returns the value
    /// the caller should use
    fn publish(&self, context: UserContext, generation: u64) -> UserContext {
        match self.entries.write() {
            Ok(mut entries) => {
                if self.generation.load(Ordering::Acquire) != generation {
                    tracing::debug!(user_id = context.id, "Invalidated during load, not cached");
                    return context;
                }
                let stored = entries.entry(context.id).or_insert(context).clone();
                tracing::info!(user_id = stored.id, email = %stored.email, "User context cached");
                stored
            }
            // A poisoned lock only loses caching, not correctness
            Err(_) => context,
        }
    }

    /// Drop the entry for one user. Loads already in flight are not cached.
    pub fn invalidate(&self, user_id: i64) {
        if let Ok(mut entries) = self.entries.write() {
            self.generation.fetch_add(1, Ordering::AcqRel);
            if entries.remove(&user_id).is_some() {
                tracing::debug!(user_id, "User context evicted");
            }
        }
    }

    /// Drop every entry
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            self.generation.fetch_add(1, Ordering::AcqRel);
            entries.clear();
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.read().map(|e| e.len()).unwrap_or(0),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Cache statistics
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}
