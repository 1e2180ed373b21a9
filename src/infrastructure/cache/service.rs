//! Cache trait, cached record types, and error types.
//!
//! The cache holds two independent records per short code:
//!
//! - `link:<code>` - a JSON projection of (original_url, expires_at), expiring
//!   no later than the link itself
//! - `stats:<code>` - a mutable mapping of (redirect_count, last_used) with a
//!   longer TTL that is refreshed on every hit
//!
//! They are keyed and expired independently: the projection follows business
//! expiry, while stats follow an operational idle timeout so counters survive
//! between reconciliation passes.

use crate::domain::entities::Link;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    Connection(String),
    #[error("cache operation error: {0}")]
    Operation(String),
    /// A record was present but could not be decoded. Distinct from I/O
    /// failures so callers can skip one corrupt record without treating the
    /// backend as down.
    #[error("cache data error: {0}")]
    Data(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Denormalized cache copy of a link's redirect-relevant fields.
///
/// Not authoritative: it may be absent, and it may linger briefly after the
/// store row changes. It carries its own `expires_at` so readers can re-check
/// expiry locally on a cache hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkProjection {
    pub original_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl LinkProjection {
    /// Returns true if the projected link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|e| Utc::now() >= e)
    }

    /// Cache TTL in seconds for this projection.
    ///
    /// Links with their own expiry live exactly until it (never past logical
    /// expiry); links without one use the configured default. Returns 0 for
    /// already-expired links, which implementations treat as "do not cache".
    pub fn remaining_ttl(&self, default_ttl_seconds: u64) -> u64 {
        match self.expires_at {
            Some(e) => (e - Utc::now()).num_seconds().max(0) as u64,
            None => default_ttl_seconds,
        }
    }
}

impl From<&Link> for LinkProjection {
    fn from(link: &Link) -> Self {
        Self {
            original_url: link.original_url.clone(),
            expires_at: link.expires_at,
        }
    }
}

/// Cache-resident usage counters for one link.
///
/// `redirect_count` is a running total seeded by increments, not a delta
/// since the last reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedStats {
    pub redirect_count: i64,
    pub last_used: Option<DateTime<Utc>>,
}

/// Trait for the two-record link cache.
///
/// Implementations must be thread-safe, and every operation used here (get,
/// set-with-TTL, atomic increment, delete) must be independently atomic so
/// callers need no locking. Read paths degrade gracefully: a miss is a normal
/// outcome, never an error.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache
/// - [`crate::infrastructure::cache::MemoryCache`] - in-process fallback
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkCache: Send + Sync {
    /// Retrieves the cached projection for a short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(projection))` on cache hit
    /// - `Ok(None)` on miss, or on backend I/O failure (fail-open)
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Data`] if a stored projection cannot be decoded.
    async fn get_projection(&self, code: &str) -> CacheResult<Option<LinkProjection>>;

    /// Stores a projection under `link:<code>`.
    ///
    /// TTL follows [`LinkProjection::remaining_ttl`]; an already-expired
    /// projection is silently not cached.
    ///
    /// # Errors
    ///
    /// Backend failures are logged and swallowed so writers never stall on
    /// the cache.
    async fn set_projection(&self, code: &str, projection: &LinkProjection) -> CacheResult<()>;

    /// Records one redirect: atomically increments `redirect_count`, sets
    /// `last_used` to now, and refreshes the stats TTL.
    ///
    /// Concurrent calls never lose an increment.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Operation`] on backend failure. Callers on the
    /// redirect path invoke this fire-and-forget and log the error.
    async fn record_hit(&self, code: &str) -> CacheResult<()>;

    /// Retrieves the stats record for a short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(stats))` when a non-empty record exists
    /// - `Ok(None)` when no record exists (normal for never-hit links)
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Operation`] on backend failure and
    /// [`CacheError::Data`] on an undecodable record; the reconciler skips
    /// the affected link either way.
    async fn get_stats(&self, code: &str) -> CacheResult<Option<CachedStats>>;

    /// Removes both the projection and the stats record for a short code.
    ///
    /// Used on link deletion so neither entry can resurrect deleted data.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Operation`] on backend failure.
    async fn remove(&self, code: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    ///
    /// Used by health check endpoints to report cache status.
    async fn health_check(&self) -> bool;
}
