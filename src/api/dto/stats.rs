//! DTO for the per-link statistics endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::services::LinkStatsView;

/// Statistics for a specific short link.
///
/// `redirect_count` and `last_used` reflect the freshest counters available,
/// which may be ahead of what the store has persisted.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub redirect_count: i64,
    pub last_used: Option<DateTime<Utc>>,
}

impl From<LinkStatsView> for StatsResponse {
    fn from(view: LinkStatsView) -> Self {
        Self {
            original_url: view.original_url,
            created_at: view.created_at,
            redirect_count: view.redirect_count,
            last_used: view.last_used,
        }
    }
}
