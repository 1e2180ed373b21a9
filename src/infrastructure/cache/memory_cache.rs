//! In-process cache implementation backed by concurrent hash maps.

use super::service::{CacheResult, CachedStats, LinkCache, LinkProjection};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

/// A cached value plus the instant it stops being valid.
///
/// Expiry is enforced lazily: expired entries are dropped when read, and a
/// hit on an expired stats entry starts a fresh one.
#[derive(Debug, Clone)]
struct Expiring<T> {
    value: T,
    valid_until: DateTime<Utc>,
}

impl<T> Expiring<T> {
    fn new(value: T, ttl_seconds: u64) -> Self {
        Self {
            value,
            valid_until: Utc::now() + Duration::seconds(ttl_seconds as i64),
        }
    }

    fn is_expired(&self) -> bool {
        Utc::now() >= self.valid_until
    }
}

/// In-process [`LinkCache`] used when no Redis backend is configured.
///
/// Sharded maps allow concurrent access without a global lock, and per-entry
/// mutation through the map's entry API keeps hit recording atomic. TTL
/// semantics mirror [`super::RedisCache`]: projections live until link
/// expiry (or the default TTL), stats entries are refreshed on every hit.
///
/// Counters only survive as long as the process; a restart loses whatever
/// the reconciler has not yet written back.
pub struct MemoryCache {
    projections: DashMap<String, Expiring<LinkProjection>>,
    stats: DashMap<String, Expiring<CachedStats>>,
    link_ttl: u64,
    stats_ttl: u64,
}

impl MemoryCache {
    pub fn new(link_ttl_seconds: u64, stats_ttl_seconds: u64) -> Self {
        Self {
            projections: DashMap::new(),
            stats: DashMap::new(),
            link_ttl: link_ttl_seconds,
            stats_ttl: stats_ttl_seconds,
        }
    }
}

#[async_trait]
impl LinkCache for MemoryCache {
    async fn get_projection(&self, code: &str) -> CacheResult<Option<LinkProjection>> {
        // The read guard must drop before remove_if takes the shard's write
        // lock, so the expired branch re-locates the entry instead of holding
        // the guard across the removal.
        if let Some(entry) = self.projections.get(code) {
            if !entry.is_expired() {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.projections.remove_if(code, |_, entry| entry.is_expired());
        Ok(None)
    }

    async fn set_projection(&self, code: &str, projection: &LinkProjection) -> CacheResult<()> {
        let ttl_seconds = projection.remaining_ttl(self.link_ttl);
        if ttl_seconds == 0 {
            debug!("Not caching {}: already expired", code);
            return Ok(());
        }

        self.projections
            .insert(code.to_string(), Expiring::new(projection.clone(), ttl_seconds));
        Ok(())
    }

    async fn record_hit(&self, code: &str) -> CacheResult<()> {
        let now = Utc::now();
        let stats_ttl = self.stats_ttl;

        self.stats
            .entry(code.to_string())
            .and_modify(|entry| {
                if entry.is_expired() {
                    entry.value = CachedStats::default();
                }
                entry.value.redirect_count += 1;
                entry.value.last_used = Some(now);
                entry.valid_until = now + Duration::seconds(stats_ttl as i64);
            })
            .or_insert_with(|| {
                Expiring::new(
                    CachedStats {
                        redirect_count: 1,
                        last_used: Some(now),
                    },
                    stats_ttl,
                )
            });

        Ok(())
    }

    async fn get_stats(&self, code: &str) -> CacheResult<Option<CachedStats>> {
        if let Some(entry) = self.stats.get(code) {
            if !entry.is_expired() {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.stats.remove_if(code, |_, entry| entry.is_expired());
        Ok(None)
    }

    async fn remove(&self, code: &str) -> CacheResult<()> {
        self.projections.remove(code);
        self.stats.remove(code);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
