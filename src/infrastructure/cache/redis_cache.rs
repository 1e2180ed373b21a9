//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CachedStats, LinkCache, LinkProjection};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// Redis cache implementation.
///
/// Uses connection pooling via `ConnectionManager` for efficient connection
/// reuse. Projection reads and writes are fail-open: I/O errors are logged
/// and reported as misses/no-ops so redirects degrade to store lookups.
/// Stats operations propagate errors because their callers (the reconciler,
/// the stats view) have their own skip/fallback handling.
pub struct RedisCache {
    client: ConnectionManager,
    link_ttl: u64,
    stats_ttl: u64,
}

impl RedisCache {
    /// Connects to Redis, validates the connection with a PING, and configures TTLs.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `link_ttl_seconds` - TTL for projections of links without their own expiry
    /// - `stats_ttl_seconds` - TTL applied to stats records on every hit
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(
        redis_url: &str,
        link_ttl_seconds: u64,
        stats_ttl_seconds: u64,
    ) -> CacheResult<Self> {
        info!("Connecting to Redis at {}", redis_url);

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::Connection(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::Connection(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            link_ttl: link_ttl_seconds,
            stats_ttl: stats_ttl_seconds,
        })
    }

    fn link_key(code: &str) -> String {
        format!("link:{}", code)
    }

    fn stats_key(code: &str) -> String {
        format!("stats:{}", code)
    }
}

#[async_trait]
impl LinkCache for RedisCache {
    async fn get_projection(&self, code: &str) -> CacheResult<Option<LinkProjection>> {
        let key = Self::link_key(code);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<LinkProjection>(&raw) {
                Ok(projection) => {
                    debug!("Cache HIT: {}", code);
                    Ok(Some(projection))
                }
                Err(e) => Err(CacheError::Data(format!(
                    "undecodable projection for {}: {}",
                    code, e
                ))),
            },
            Ok(None) => {
                debug!("Cache MISS: {}", code);
                Ok(None)
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", code, e);
                Ok(None)
            }
        }
    }

    async fn set_projection(&self, code: &str, projection: &LinkProjection) -> CacheResult<()> {
        let ttl_seconds = projection.remaining_ttl(self.link_ttl);
        if ttl_seconds == 0 {
            debug!("Not caching {}: already expired", code);
            return Ok(());
        }

        let raw = serde_json::to_string(projection)
            .map_err(|e| CacheError::Data(format!("unserializable projection for {}: {}", code, e)))?;

        let key = Self::link_key(code);
        let mut conn = self.client.clone();

        match conn.set_ex::<_, _, ()>(&key, raw, ttl_seconds).await {
            Ok(_) => {
                debug!("Cache SET: {} (TTL: {}s)", code, ttl_seconds);
                Ok(())
            }
            Err(e) => {
                warn!("Redis SETEX error for {}: {}", code, e);
                Ok(())
            }
        }
    }

    async fn record_hit(&self, code: &str) -> CacheResult<()> {
        let key = Self::stats_key(code);
        let now = Utc::now().to_rfc3339();
        let mut conn = self.client.clone();

        // MULTI/EXEC so the increment, timestamp, and TTL refresh land together.
        redis::pipe()
            .atomic()
            .hincr(&key, "redirect_count", 1)
            .ignore()
            .hset(&key, "last_used", now)
            .ignore()
            .expire(&key, self.stats_ttl as i64)
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| CacheError::Operation(format!("stats increment for {} failed: {}", code, e)))?;

        debug!("Cache stats hit recorded: {}", code);
        Ok(())
    }

    async fn get_stats(&self, code: &str) -> CacheResult<Option<CachedStats>> {
        let key = Self::stats_key(code);
        let mut conn = self.client.clone();

        let map: HashMap<String, String> = conn
            .hgetall(&key)
            .await
            .map_err(|e| CacheError::Operation(format!("stats read for {} failed: {}", code, e)))?;

        parse_stats(code, &map)
    }

    async fn remove(&self, code: &str) -> CacheResult<()> {
        let keys = [Self::link_key(code), Self::stats_key(code)];
        let mut conn = self.client.clone();

        let deleted: i32 = conn
            .del(&keys[..])
            .await
            .map_err(|e| CacheError::Operation(format!("cache delete for {} failed: {}", code, e)))?;

        if deleted > 0 {
            debug!("Cache INVALIDATE: {} ({} keys)", code, deleted);
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}

/// Decodes a raw `stats:<code>` hash into [`CachedStats`].
///
/// An empty hash means the record does not exist (HGETALL returns an empty
/// map for missing keys).
fn parse_stats(code: &str, map: &HashMap<String, String>) -> CacheResult<Option<CachedStats>> {
    if map.is_empty() {
        return Ok(None);
    }

    let mut stats = CachedStats::default();

    if let Some(raw) = map.get("redirect_count") {
        stats.redirect_count = raw.parse().map_err(|e| {
            CacheError::Data(format!("bad redirect_count for {}: {} ({})", code, raw, e))
        })?;
    }

    if let Some(raw) = map.get("last_used") {
        let parsed = DateTime::parse_from_rfc3339(raw).map_err(|e| {
            CacheError::Data(format!("bad last_used for {}: {} ({})", code, raw, e))
        })?;
        stats.last_used = Some(parsed.with_timezone(&Utc));
    }

    Ok(Some(stats))
}
