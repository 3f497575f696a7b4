//! In-memory caching using moka
//!
//! Remembers which checkout session was created for an idempotency key, so a
//! client retrying the same booking gets the same redirect instead of a second
//! session.

use moka::future::Cache;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Longest idempotency key the provider accepts
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// A created checkout session and the fingerprint of what it charges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSession {
    pub fingerprint: String,
    pub url: String,
}

/// Application cache holding created checkout sessions
#[derive(Clone)]
pub struct SessionCache {
    /// Checkout sessions (idempotency key -> session)
    pub sessions: Cache<String, Arc<CachedSession>>,
}

impl SessionCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self::with_limits(10_000, Duration::from_secs(24 * 60 * 60))
    }

    pub fn with_limits(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Session stored under `idempotency_key`, created by `create` on a miss.
    ///
    /// Concurrent callers for one key share a single `create` call. Failures
    /// are not cached. The flag is true when this call created the entry.
    pub async fn get_or_create<F, E>(
        &self,
        idempotency_key: &str,
        create: F,
    ) -> Result<(Arc<CachedSession>, bool), Arc<E>>
    where
        F: Future<Output = Result<CachedSession, E>>,
        E: Send + Sync + 'static,
    {
        let entry = self
            .sessions
            .entry_by_ref(idempotency_key)
            .or_try_insert_with(async move { create.await.map(Arc::new) })
            .await?;
        let created = entry.is_fresh();
        Ok((entry.into_value(), created))
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            sessions_size: self.sessions.entry_count(),
        }
    }

    /// Normalize a caller-supplied key. Blank keys count as absent.
    pub fn normalize_key(raw: Option<&str>) -> Result<Option<String>, String> {
        match raw.map(str::trim).filter(|key| !key.is_empty()) {
            None => Ok(None),
            Some(key) if key.len() > MAX_IDEMPOTENCY_KEY_LEN => Err(format!(
                "idempotency key must be at most {} characters",
                MAX_IDEMPOTENCY_KEY_LEN
            )),
            Some(key) => Ok(Some(key.to_string())),
        }
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub sessions_size: u64,
}
