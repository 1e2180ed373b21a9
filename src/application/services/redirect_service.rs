//! Redirect resolution service.

use std::sync::Arc;

use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::{LinkCache, LinkProjection};
use serde_json::json;
use tracing::{debug, warn};

/// Service resolving short codes to redirect targets.
///
/// Lookups are cache-first with store fallback and write-back. Expiry is
/// enforced on both sources: a cached projection carries its own expiry and
/// is re-checked locally, and an expired store row is rejected without ever
/// re-entering the cache.
pub struct RedirectService {
    repository: Arc<dyn LinkRepository>,
    cache: Arc<dyn LinkCache>,
}

impl RedirectService {
    /// Creates a new redirect service.
    pub fn new(repository: Arc<dyn LinkRepository>, cache: Arc<dyn LinkCache>) -> Self {
        Self { repository, cache }
    }

    /// Resolves a short code to its destination URL and records the visit.
    ///
    /// The visit counter is incremented in the cache fire-and-forget; the
    /// returned URL never waits on it.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if the code is unknown
    /// - [`AppError::Gone`] if the link exists but has expired
    /// - [`AppError::Internal`] on store errors
    pub async fn resolve(&self, code: &str) -> Result<String, AppError> {
        let projection = match self.cache.get_projection(code).await {
            Ok(Some(projection)) => {
                debug!("Resolved {} from cache", code);
                projection
            }
            Ok(None) => self.load_and_cache(code).await?,
            Err(e) => {
                // Undecodable cache entry; the store copy is authoritative.
                warn!("Cache read failed for {}: {}", code, e);
                self.load_and_cache(code).await?
            }
        };

        // A hit can serve a projection whose TTL has not ticked over yet;
        // the embedded expiry is what counts.
        if projection.is_expired() {
            return Err(AppError::gone("Link expired", json!({ "code": code })));
        }

        let cache = Arc::clone(&self.cache);
        let code_owned = code.to_string();
        tokio::spawn(async move {
            if let Err(e) = cache.record_hit(&code_owned).await {
                warn!("Failed to record hit for {}: {}", code_owned, e);
            }
        });

        Ok(projection.original_url)
    }

    /// Loads a link from the store and writes its projection back to cache.
    ///
    /// Expired rows are rejected before the cache write so dead data never
    /// re-enters the cache.
    async fn load_and_cache(&self, code: &str) -> Result<LinkProjection, AppError> {
        let link = self
            .repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "code": code })))?;

        if link.is_expired() {
            return Err(AppError::gone("Link expired", json!({ "code": code })));
        }

        let projection = LinkProjection::from(&link);
        if let Err(e) = self.cache.set_projection(code, &projection).await {
            warn!("Failed to cache {}: {}", code, e);
        }

        Ok(projection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Link;
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::cache::{CacheError, MockLinkCache};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn live_link(code: &str, url: &str) -> Link {
        Link {
            id: 1,
            short_code: code.to_string(),
            original_url: url.to_string(),
            created_at: Utc::now(),
            expires_at: None,
            redirect_count: 0,
            last_used: None,
            owner_id: Some(Uuid::new_v4()),
        }
    }

    fn projection(url: &str, expires_at: Option<chrono::DateTime<Utc>>) -> LinkProjection {
        LinkProjection {
            original_url: url.to_string(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn cache_hit_resolves_without_store() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_find_by_code().times(0);

        let mut mock_cache = MockLinkCache::new();
        mock_cache
            .expect_get_projection()
            .times(1)
            .returning(|_| Ok(Some(projection("https://example.com/a", None))));
        mock_cache.expect_record_hit().returning(|_| Ok(()));

        let service = RedirectService::new(Arc::new(mock_repo), Arc::new(mock_cache));

        let url = service.resolve("abc123").await.unwrap();
        assert_eq!(url, "https://example.com/a");
    }

    #[tokio::test]
    async fn cache_miss_falls_back_to_store_and_writes_back() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_find_by_code()
            .withf(|code| code == "abc123")
            .times(1)
            .returning(|_| Ok(Some(live_link("abc123", "https://example.com/a"))));

        let mut mock_cache = MockLinkCache::new();
        mock_cache
            .expect_get_projection()
            .times(1)
            .returning(|_| Ok(None));
        mock_cache
            .expect_set_projection()
            .withf(|code, p| code == "abc123" && p.original_url == "https://example.com/a")
            .times(1)
            .returning(|_, _| Ok(()));
        mock_cache.expect_record_hit().returning(|_| Ok(()));

        let service = RedirectService::new(Arc::new(mock_repo), Arc::new(mock_cache));

        let url = service.resolve("abc123").await.unwrap();
        assert_eq!(url, "https://example.com/a");
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_find_by_code()
            .times(1)
            .returning(|_| Ok(None));

        let mut mock_cache = MockLinkCache::new();
        mock_cache
            .expect_get_projection()
            .times(1)
            .returning(|_| Ok(None));
        mock_cache.expect_record_hit().times(0);

        let service = RedirectService::new(Arc::new(mock_repo), Arc::new(mock_cache));

        let err = service.resolve("nosuch").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn expired_store_row_is_gone_and_never_cached() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_find_by_code().times(1).returning(|_| {
            let mut link = live_link("abc123", "https://example.com/a");
            link.expires_at = Some(Utc::now() - Duration::seconds(1));
            Ok(Some(link))
        });

        let mut mock_cache = MockLinkCache::new();
        mock_cache
            .expect_get_projection()
            .times(1)
            .returning(|_| Ok(None));
        mock_cache.expect_set_projection().times(0);
        mock_cache.expect_record_hit().times(0);

        let service = RedirectService::new(Arc::new(mock_repo), Arc::new(mock_cache));

        let err = service.resolve("abc123").await.unwrap_err();
        assert!(matches!(err, AppError::Gone { .. }));
    }

    #[tokio::test]
    async fn expired_cached_projection_is_gone() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_find_by_code().times(0);

        let mut mock_cache = MockLinkCache::new();
        mock_cache.expect_get_projection().times(1).returning(|_| {
            Ok(Some(projection(
                "https://example.com/a",
                Some(Utc::now() - Duration::seconds(1)),
            )))
        });
        mock_cache.expect_record_hit().times(0);

        let service = RedirectService::new(Arc::new(mock_repo), Arc::new(mock_cache));

        let err = service.resolve("abc123").await.unwrap_err();
        assert!(matches!(err, AppError::Gone { .. }));
    }

    #[tokio::test]
    async fn undecodable_cache_entry_falls_back_to_store() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_find_by_code()
            .times(1)
            .returning(|_| Ok(Some(live_link("abc123", "https://example.com/a"))));

        let mut mock_cache = MockLinkCache::new();
        mock_cache
            .expect_get_projection()
            .times(1)
            .returning(|_| Err(CacheError::Data("bad json".to_string())));
        mock_cache
            .expect_set_projection()
            .times(1)
            .returning(|_, _| Ok(()));
        mock_cache.expect_record_hit().returning(|_| Ok(()));

        let service = RedirectService::new(Arc::new(mock_repo), Arc::new(mock_cache));

        let url = service.resolve("abc123").await.unwrap();
        assert_eq!(url, "https://example.com/a");
    }
}
