//! Link creation, mutation, and stats-view service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{error, warn};
use url::Url;
use uuid::Uuid;

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::{LinkCache, LinkProjection};
use crate::utils::code_generator::{generate_code, validate_custom_alias};

/// A link's usage statistics with any fresher cache counters folded in.
///
/// The store's counters lag behind the cache between reconciliation passes;
/// this view prefers the cache copy whenever one exists.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkStatsView {
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub redirect_count: i64,
    pub last_used: Option<DateTime<Utc>>,
}

/// Service for creating, mutating, and inspecting shortened links.
///
/// All writes go to the store first; the cache is updated afterwards and
/// best-effort. Ownership is enforced here, not in handlers, so every caller
/// (HTTP or bulk import) gets the same checks.
pub struct LinkService {
    repository: Arc<dyn LinkRepository>,
    cache: Arc<dyn LinkCache>,
}

impl LinkService {
    /// Creates a new link service.
    pub fn new(repository: Arc<dyn LinkRepository>, cache: Arc<dyn LinkCache>) -> Self {
        Self { repository, cache }
    }

    /// Creates a short link.
    ///
    /// This is the single create primitive: the HTTP handler and the bulk
    /// importer both call it, so code allocation, the store write, and the
    /// cache populate never diverge between entry points.
    ///
    /// # Code Allocation
    ///
    /// - With `custom_alias`: validates the alias and rejects a taken one
    ///   with [`AppError::Conflict`] (no retry for explicit aliases).
    /// - Without: generates random 6-character codes, retrying on collision
    ///   up to 10 times before failing.
    ///
    /// The pre-insert existence check gives friendly conflicts; the store's
    /// unique constraint backstops the check-then-insert race, surfacing a
    /// concurrent duplicate as [`AppError::Conflict`] as well.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a non-http(s) destination or a
    /// malformed alias, [`AppError::Conflict`] for a taken alias, and
    /// [`AppError::Internal`] on database errors or generation exhaustion.
    pub async fn create_link(
        &self,
        owner_id: Uuid,
        original_url: String,
        custom_alias: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Link, AppError> {
        validate_destination(&original_url)?;

        let short_code = if let Some(alias) = custom_alias {
            validate_custom_alias(&alias)?;

            if self.repository.find_by_code(&alias).await?.is_some() {
                return Err(AppError::conflict(
                    "Alias already exists",
                    json!({ "alias": alias }),
                ));
            }

            alias
        } else {
            self.generate_unique_code().await?
        };

        let link = self
            .repository
            .create(NewLink {
                short_code,
                original_url,
                expires_at,
                owner_id,
            })
            .await?;

        let projection = LinkProjection::from(&link);
        if let Err(e) = self.cache.set_projection(&link.short_code, &projection).await {
            warn!("Failed to cache new link {}: {}", link.short_code, e);
        }

        Ok(link)
    }

    /// Updates a link's destination URL.
    ///
    /// The store row is committed first, then the cache projection is
    /// overwritten in place (not invalidated) so readers never see a gap.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown code and
    /// [`AppError::Forbidden`] when the caller is not the owner.
    pub async fn update_link(
        &self,
        code: &str,
        owner_id: Uuid,
        original_url: String,
    ) -> Result<Link, AppError> {
        validate_destination(&original_url)?;
        self.find_owned(code, owner_id).await?;

        let updated = self
            .repository
            .update_url(code, &original_url)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "code": code })))?;

        let projection = LinkProjection::from(&updated);
        if let Err(e) = self.cache.set_projection(code, &projection).await {
            warn!("Failed to refresh cache for {}: {}", code, e);
        }

        Ok(updated)
    }

    /// Deletes a link and both of its cache records.
    ///
    /// The store delete commits before the cache delete: a concurrent reader
    /// can at worst see a still-valid cached projection briefly, never a
    /// cache entry whose store row is gone with no fallback.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown code and
    /// [`AppError::Forbidden`] when the caller is not the owner.
    pub async fn delete_link(&self, code: &str, owner_id: Uuid) -> Result<(), AppError> {
        self.find_owned(code, owner_id).await?;

        let deleted = self.repository.delete(code).await?;
        if !deleted {
            return Err(AppError::not_found(
                "Link not found",
                json!({ "code": code }),
            ));
        }

        if let Err(e) = self.cache.remove(code).await {
            // The row is gone; a stale projection can only outlive it until
            // its TTL.
            error!("Failed to remove cache records for {}: {}", code, e);
        }

        Ok(())
    }

    /// Returns a link's usage statistics, preferring cache counters.
    ///
    /// A cache failure falls back to the store's (possibly lagging) values.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown code and
    /// [`AppError::Forbidden`] when the caller is not the owner.
    pub async fn link_stats(&self, code: &str, owner_id: Uuid) -> Result<LinkStatsView, AppError> {
        let link = self.find_owned(code, owner_id).await?;

        let mut view = LinkStatsView {
            original_url: link.original_url,
            created_at: link.created_at,
            redirect_count: link.redirect_count,
            last_used: link.last_used,
        };

        match self.cache.get_stats(code).await {
            Ok(Some(stats)) => {
                view.redirect_count = stats.redirect_count;
                if stats.last_used.is_some() {
                    view.last_used = stats.last_used;
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Stats read failed for {}: {}", code, e);
            }
        }

        Ok(view)
    }

    /// Finds the caller's links pointing at `original_url`.
    ///
    /// Trailing slashes are ignored on both sides: the query is matched with
    /// and without one, so `https://a.com/x` and `https://a.com/x/` find each
    /// other's links.
    pub async fn search_by_original_url(
        &self,
        owner_id: Uuid,
        original_url: &str,
    ) -> Result<Vec<Link>, AppError> {
        let trimmed = original_url.trim_end_matches('/');
        let variants = [trimmed.to_string(), format!("{trimmed}/")];
        self.repository
            .find_by_original_url(&variants, owner_id)
            .await
    }

    /// Reports whether the backing store answers queries.
    ///
    /// Used by the health endpoint.
    pub async fn store_healthy(&self) -> bool {
        self.repository.health_check().await
    }

    /// Loads a link and verifies the caller owns it.
    async fn find_owned(&self, code: &str, owner_id: Uuid) -> Result<Link, AppError> {
        let link = self
            .repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "code": code })))?;

        if !link.is_owned_by(owner_id) {
            return Err(AppError::forbidden(
                "Not your link",
                json!({ "code": code }),
            ));
        }

        Ok(link)
    }

    /// Generates a unique short code with collision retry.
    ///
    /// Attempts up to 10 times before failing.
    async fn generate_unique_code(&self) -> Result<String, AppError> {
        const MAX_ATTEMPTS: usize = 10;

        for _ in 0..MAX_ATTEMPTS {
            let code = generate_code();

            if self.repository.find_by_code(&code).await?.is_none() {
                return Ok(code);
            }
        }

        Err(AppError::internal(
            "Failed to generate unique code",
            json!({ "reason": "Too many collisions" }),
        ))
    }
}

/// Rejects destinations that are not plain web URLs.
///
/// Request DTOs already require a parseable URL; this additionally pins the
/// scheme to http(s) so nobody shortens a `javascript:` or `file:` URL into
/// something that looks safe to click.
fn validate_destination(url: &str) -> Result<(), AppError> {
    let parsed = Url::parse(url)
        .map_err(|_| AppError::bad_request("Invalid URL format", json!({ "url": url })))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::bad_request(
            "Only http and https URLs can be shortened",
            json!({ "scheme": parsed.scheme() }),
        ));
    }

    Ok(())
}
