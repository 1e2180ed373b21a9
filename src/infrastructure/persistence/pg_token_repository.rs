//! PostgreSQL implementation of token repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::repositories::{ApiToken, TokenRepository};
use crate::error::AppError;

/// Raw `api_tokens` row, decoded by sqlx and mapped into the domain record.
#[derive(sqlx::FromRow)]
struct TokenRow {
    id: i64,
    name: String,
    token_hash: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    last_used_at: Option<DateTime<Utc>>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<TokenRow> for ApiToken {
    fn from(row: TokenRow) -> Self {
        ApiToken {
            id: row.id,
            name: row.name,
            token_hash: row.token_hash,
            user_id: row.user_id,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
            revoked_at: row.revoked_at,
        }
    }
}

const TOKEN_COLUMNS: &str =
    "id, name, token_hash, user_id, created_at, last_used_at, revoked_at";

/// PostgreSQL repository for API tokens.
///
/// Stores hashed tokens (HMAC-SHA256) for security. Raw tokens are never persisted.
///
/// The [`TokenRepository`] trait covers what the request path needs; the
/// issuance and revocation methods below are inherent because only the admin
/// CLI uses them, always against Postgres.
pub struct PgTokenRepository {
    pool: Arc<PgPool>,
}

impl PgTokenRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Stores a new token credential.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] when the name or hash is already taken.
    pub async fn create_token(
        &self,
        name: &str,
        token_hash: &str,
        user_id: Uuid,
    ) -> Result<ApiToken, AppError> {
        let sql = format!(
            "INSERT INTO api_tokens (name, token_hash, user_id) \
             VALUES ($1, $2, $3) \
             RETURNING {TOKEN_COLUMNS}"
        );

        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(name)
            .bind(token_hash)
            .bind(user_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(row.into())
    }

    /// Lists every token, newest first, revoked ones included.
    pub async fn list_tokens(&self) -> Result<Vec<ApiToken>, AppError> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM api_tokens ORDER BY created_at DESC");

        let rows = sqlx::query_as::<_, TokenRow>(&sql)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(ApiToken::from).collect())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<ApiToken>, AppError> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM api_tokens WHERE id = $1");

        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(ApiToken::from))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<ApiToken>, AppError> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM api_tokens WHERE name = $1");

        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(name)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(ApiToken::from))
    }

    /// Marks a token as revoked. Revocation is permanent; a second call on
    /// the same token is a no-op.
    pub async fn revoke_token(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE api_tokens SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn find_user_by_token_hash(&self, token_hash: &str) -> Result<Option<Uuid>, AppError> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM api_tokens \
             WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(token_hash)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user_id)
    }

    async fn touch(&self, token_hash: &str) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE api_tokens SET last_used_at = NOW() \
             WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(token_hash)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }
}
