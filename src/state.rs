//! Shared application state injected into handlers.

use std::sync::Arc;

use crate::application::services::{AuthService, LinkService, RedirectService};
use crate::infrastructure::cache::LinkCache;

/// Application state shared across all request handlers.
///
/// Services are constructed once at startup with their repositories and
/// cache injected, then shared via `Arc`. Tests build the same state from
/// in-memory doubles.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub redirect_service: Arc<RedirectService>,
    pub auth_service: Arc<AuthService>,
    pub cache: Arc<dyn LinkCache>,
}

impl AppState {
    /// Creates application state from constructed services.
    pub fn new(
        link_service: Arc<LinkService>,
        redirect_service: Arc<RedirectService>,
        auth_service: Arc<AuthService>,
        cache: Arc<dyn LinkCache>,
    ) -> Self {
        Self {
            link_service,
            redirect_service,
            auth_service,
            cache,
        }
    }
}
