//! Caching layer for redirect lookups and in-cache usage counters.
//!
//! Provides a [`LinkCache`] trait with two implementations:
//! - [`RedisCache`] - Production Redis-backed cache
//! - [`MemoryCache`] - In-process fallback when Redis is not configured

mod memory_cache;
mod redis_cache;
mod service;

pub use memory_cache::MemoryCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, CachedStats, LinkCache, LinkProjection};

#[cfg(test)]
pub use service::MockLinkCache;
