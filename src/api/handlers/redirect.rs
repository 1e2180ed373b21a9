//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::Redirect,
};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Resolve the code cache-first (store fallback on miss)
/// 2. Record the hit in the cache (fire-and-forget)
/// 3. Return 307 Temporary Redirect
///
/// 307 keeps clients revalidating on every visit, so destination updates and
/// expiry take effect without fighting browser redirect caches.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
/// Returns 410 Gone if the link has expired.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    let url = state.redirect_service.resolve(&code).await?;

    Ok(Redirect::temporary(&url))
}
