//! Handler for per-link statistics.

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::api::dto::stats::StatsResponse;
use crate::application::services::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;

/// Returns usage statistics for one short link.
///
/// # Endpoint
///
/// `GET /api/links/{code}/stats`
///
/// # Freshness
///
/// Counters come from the cache when a stats record exists there, so the
/// response can be ahead of the store between reconciliation passes. With no
/// cache record (or an unreachable cache) the store's last persisted values
/// are returned.
///
/// # Errors
///
/// - **403 Forbidden**: link belongs to another user
/// - **404 Not Found**: unknown short code
pub async fn stats_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<StatsResponse>, AppError> {
    let view = state.link_service.link_stats(&code, user.user_id).await?;

    Ok(Json(view.into()))
}
