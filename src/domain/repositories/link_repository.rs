//! Repository trait for short link data access.

use crate::domain::entities::{Link, NewLink};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One link's reconciled counters, ready to be written back to the store.
///
/// Produced by the stats reconciler from cached counters. `redirect_count` is
/// the new absolute total, not a delta: the cache increments a running counter
/// seeded from the store, so the store value is replaced wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsUpdate {
    pub link_id: i64,
    pub redirect_count: i64,
    pub last_used: Option<DateTime<Utc>>,
}

/// Repository interface for managing short links.
///
/// Provides CRUD operations for shortened URLs plus the bulk scan and
/// counter write-back used by the stats reconciler.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Creates a new short link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code already exists.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link by its short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Link))` if found
    /// - `Ok(None)` if not found
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Finds all of a user's links pointing at any of the given URLs.
    ///
    /// Callers pass every spelling that should match (typically the URL as
    /// given plus a trailing-slash variant).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_original_url(
        &self,
        urls: &[String],
        owner_id: Uuid,
    ) -> Result<Vec<Link>, AppError>;

    /// Lists every link in the store.
    ///
    /// Used by the stats reconciler to walk all records in one pass.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_all(&self) -> Result<Vec<Link>, AppError>;

    /// Updates a link's destination URL.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Link))` with the updated row
    /// - `Ok(None)` if no link matches `code`
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn update_url(&self, code: &str, original_url: &str) -> Result<Option<Link>, AppError>;

    /// Deletes a link.
    ///
    /// Returns `Ok(true)` if the link was found and deleted, `Ok(false)` if
    /// not found.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete(&self, code: &str) -> Result<bool, AppError>;

    /// Writes reconciled counters back to the store in a single transaction.
    ///
    /// Either every update in the batch lands or none does. An empty batch is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors; the transaction is
    /// rolled back.
    async fn apply_stats_updates(&self, updates: &[StatsUpdate]) -> Result<(), AppError>;

    /// Reports whether the store answers a trivial query.
    ///
    /// Used by the health endpoint.
    async fn health_check(&self) -> bool;
}
