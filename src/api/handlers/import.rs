//! Handler for bulk link import.

use axum::{Extension, Json, extract::State};
use validator::Validate;

use crate::api::dto::import::{
    ImportRequest, ImportResponse, ImportRowError, ImportSummary, ImportedLink,
};
use crate::application::services::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;

/// Imports a batch of links in one request.
///
/// # Endpoint
///
/// `POST /api/links/import`
///
/// # Batch Processing
///
/// Rows are processed independently through the same create path as
/// `POST /api/links`: a row that fails validation or collides on its alias
/// lands in `errors` with its 1-based row number, and the rest of the batch
/// continues.
///
/// # Request Body
///
/// ```json
/// {
///   "links": [
///     { "original_url": "https://example.com/a" },
///     { "original_url": "https://example.com/b", "custom_alias": "b-link" }
///   ]
/// }
/// ```
pub async fn import_links_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    let total = payload.links.len();
    let mut created = Vec::new();
    let mut errors = Vec::new();

    for (idx, row) in payload.links.into_iter().enumerate() {
        let row_number = idx + 1;

        if let Err(e) = row.validate() {
            errors.push(ImportRowError {
                row: row_number,
                error: AppError::from(e).to_error_info(),
            });
            continue;
        }

        let original_url = row.original_url.clone();

        match state
            .link_service
            .create_link(user.user_id, row.original_url, row.custom_alias, None)
            .await
        {
            Ok(link) => {
                created.push(ImportedLink {
                    original_url,
                    short_code: link.short_code,
                });
            }
            Err(err) => {
                errors.push(ImportRowError {
                    row: row_number,
                    error: err.to_error_info(),
                });
            }
        }
    }

    Ok(Json(ImportResponse {
        summary: ImportSummary {
            total,
            successful: created.len(),
            failed: errors.len(),
        },
        created,
        errors,
    }))
}
