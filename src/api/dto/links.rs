//! DTOs for link management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::Link;

/// Request body for `POST /api/links`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// The destination URL (must be a well-formed absolute URL).
    #[validate(url(message = "Invalid URL format"))]
    pub original_url: String,

    /// Optional custom short code. When absent a random code is generated.
    /// Length and character rules are enforced by the link service.
    pub custom_alias: Option<String>,

    /// Optional expiry timestamp. After this time, the link returns 410 Gone.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Request body for `PATCH /api/links/{code}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    /// New destination URL for this link.
    #[validate(url(message = "Invalid URL format"))]
    pub original_url: String,
}

/// Query parameters for `GET /api/links/search`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Destination URL to look up; trailing slashes are ignored.
    pub original_url: String,
}

/// JSON representation of a link returned by create, update, and search.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub short_code: String,
    pub original_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Link> for LinkResponse {
    fn from(link: Link) -> Self {
        Self {
            short_code: link.short_code,
            original_url: link.original_url,
            expires_at: link.expires_at,
        }
    }
}
