//! Handlers for link management endpoints (create, update, delete, search).

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::links::{CreateLinkRequest, LinkResponse, SearchQuery, UpdateLinkRequest};
use crate::application::services::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// {
///   "original_url": "https://example.com/some/long/path",
///   "custom_alias": "my-link",              // optional
///   "expires_at": "2026-12-31T23:59:59Z"    // optional
/// }
/// ```
///
/// # Errors
///
/// - **400 Bad Request**: malformed URL or invalid alias
/// - **409 Conflict**: alias already taken
pub async fn create_link_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .create_link(
            user.user_id,
            payload.original_url,
            payload.custom_alias,
            payload.expires_at,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(link.into())))
}

/// Re-points a short link at a new destination URL.
///
/// # Endpoint
///
/// `PATCH /api/links/{code}`
///
/// The cache projection is overwritten in place, so the next redirect
/// follows the new destination without waiting for TTL expiry.
///
/// # Errors
///
/// - **400 Bad Request**: malformed URL
/// - **403 Forbidden**: link belongs to another user
/// - **404 Not Found**: unknown short code
pub async fn update_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .update_link(&code, user.user_id, payload.original_url)
        .await?;

    Ok(Json(link.into()))
}

/// Deletes a short link.
///
/// # Endpoint
///
/// `DELETE /api/links/{code}`
///
/// Removes the store row and both cache records (projection and stats), so
/// the code immediately resolves to 404 rather than a cached leftover.
///
/// # Errors
///
/// - **403 Forbidden**: link belongs to another user
/// - **404 Not Found**: unknown short code
pub async fn delete_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete_link(&code, user.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Finds the caller's links by destination URL.
///
/// # Endpoint
///
/// `GET /api/links/search?original_url=https://example.com/page`
///
/// Matches with and without a trailing slash. Returns only links owned by
/// the caller; an empty list is a normal result, not an error.
pub async fn search_links_handler(
    Query(query): Query<SearchQuery>,
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<LinkResponse>>, AppError> {
    let links = state
        .link_service
        .search_by_original_url(user.user_id, &query.original_url)
        .await?;

    Ok(Json(links.into_iter().map(LinkResponse::from).collect()))
}
