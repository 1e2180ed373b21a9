//! DTOs for the bulk link import endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Request body for `POST /api/links/import`.
///
/// Rows are processed independently: one bad row is reported in `errors`
/// while the rest of the batch continues.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub links: Vec<ImportRow>,
}

/// One link to import.
#[derive(Debug, Deserialize, Validate)]
pub struct ImportRow {
    /// The destination URL (must be a well-formed absolute URL).
    #[validate(url(message = "Invalid URL format"))]
    pub original_url: String,

    /// Optional custom short code for this row.
    pub custom_alias: Option<String>,
}

/// Response for a processed import batch.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub summary: ImportSummary,
    pub created: Vec<ImportedLink>,
    pub errors: Vec<ImportRowError>,
}

/// Batch totals.
#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// A successfully imported row.
#[derive(Debug, Serialize)]
pub struct ImportedLink {
    pub original_url: String,
    pub short_code: String,
}

/// A rejected row. `row` is the 1-based position in the request.
#[derive(Debug, Serialize)]
pub struct ImportRowError {
    pub row: usize,
    pub error: Value,
}
