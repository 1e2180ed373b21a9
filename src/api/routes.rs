//! API route configuration.
//!
//! All API endpoints require Bearer token authentication via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{
    create_link_handler, delete_link_handler, import_links_handler, search_links_handler,
    stats_handler, update_link_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, patch, post},
};

/// All API routes, protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `POST   /links`               - Create a short link
/// - `GET    /links/search`        - Find the caller's links by destination URL
/// - `POST   /links/import`        - Bulk-create links from a JSON batch
/// - `PATCH  /links/{code}`        - Re-point a link at a new URL
/// - `DELETE /links/{code}`        - Delete a link
/// - `GET    /links/{code}/stats`  - Usage statistics for a link
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/links", post(create_link_handler))
        .route("/links/search", get(search_links_handler))
        .route("/links/import", post(import_links_handler))
        .route(
            "/links/{code}",
            patch(update_link_handler).delete(delete_link_handler),
        )
        .route("/links/{code}/stats", get(stats_handler))
}
