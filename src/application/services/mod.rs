//! Business logic services for the application layer.

pub mod auth_service;
pub mod link_service;
pub mod redirect_service;

pub use auth_service::{AuthService, AuthenticatedUser, hash_token};
pub use link_service::{LinkService, LinkStatsView};
pub use redirect_service::RedirectService;
