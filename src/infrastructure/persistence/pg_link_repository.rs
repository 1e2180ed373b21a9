//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::{LinkRepository, StatsUpdate};
use crate::error::AppError;

/// Raw `links` row, decoded by sqlx and mapped into the domain entity.
#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    short_code: String,
    original_url: String,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    redirect_count: i64,
    last_used: Option<DateTime<Utc>>,
    owner_id: Option<Uuid>,
}

impl From<LinkRow> for Link {
    fn from(row: LinkRow) -> Self {
        Link {
            id: row.id,
            short_code: row.short_code,
            original_url: row.original_url,
            created_at: row.created_at,
            expires_at: row.expires_at,
            redirect_count: row.redirect_count,
            last_used: row.last_used,
            owner_id: row.owner_id,
        }
    }
}

const LINK_COLUMNS: &str =
    "id, short_code, original_url, created_at, expires_at, redirect_count, last_used, owner_id";

/// PostgreSQL repository for link storage and retrieval.
///
/// Uses SQLx prepared statements for SQL injection protection and type safety.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let sql = format!(
            "INSERT INTO links (short_code, original_url, expires_at, owner_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {LINK_COLUMNS}"
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(&new_link.short_code)
            .bind(&new_link.original_url)
            .bind(new_link.expires_at)
            .bind(new_link.owner_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(row.into())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE short_code = $1");

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(code)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Link::from))
    }

    async fn find_by_original_url(
        &self,
        urls: &[String],
        owner_id: Uuid,
    ) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM links \
             WHERE original_url = ANY($1) AND owner_id = $2 \
             ORDER BY created_at DESC"
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(urls)
            .bind(owner_id)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Link::from).collect())
    }

    async fn list_all(&self) -> Result<Vec<Link>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links ORDER BY id");

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Link::from).collect())
    }

    async fn update_url(&self, code: &str, original_url: &str) -> Result<Option<Link>, AppError> {
        let sql = format!(
            "UPDATE links SET original_url = $2 \
             WHERE short_code = $1 \
             RETURNING {LINK_COLUMNS}"
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(code)
            .bind(original_url)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Link::from))
    }

    async fn delete(&self, code: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM links WHERE short_code = $1")
            .bind(code)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn apply_stats_updates(&self, updates: &[StatsUpdate]) -> Result<(), AppError> {
        if updates.is_empty() {
            return Ok(());
        }

        // One transaction per reconciliation pass: all counter writes land
        // together or not at all.
        let mut tx = self.pool.begin().await?;

        for update in updates {
            sqlx::query("UPDATE links SET redirect_count = $1, last_used = $2 WHERE id = $3")
                .bind(update.redirect_count)
                .bind(update.last_used)
                .bind(update.link_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}
