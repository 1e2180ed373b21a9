//! Repository trait for API token authentication.

use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A stored API token credential.
///
/// `token_hash` is the HMAC-SHA256 of the raw token; the raw value is shown
/// once at issuance and never persisted.
#[derive(Debug, Clone)]
pub struct ApiToken {
    pub id: i64,
    pub name: String,
    pub token_hash: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Repository interface for API token validation.
///
/// Tokens are stored as HMAC-SHA256 hashes; the raw token never reaches the
/// database. Issuance and revocation go through the admin CLI, so this
/// interface only resolves and touches existing credentials.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgTokenRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Resolves a token hash to the owning user.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(user_id))` if the token exists and is not revoked
    /// - `Ok(None)` if the token is unknown or revoked
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_user_by_token_hash(&self, token_hash: &str) -> Result<Option<Uuid>, AppError>;

    /// Updates the last_used timestamp for a token.
    ///
    /// Called after successful authentication to track token usage.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn touch(&self, token_hash: &str) -> Result<(), AppError>;
}
