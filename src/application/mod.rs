//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and business rules. Services consume repository traits and provide
//! a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Short link creation and mutation
//! - [`services::redirect_service::RedirectService`] - Cache-first code resolution
//! - [`services::auth_service::AuthService`] - API token authentication
//! - [`reconciler::StatsReconciler`] - Periodic cache-to-store counter flush

pub mod reconciler;
pub mod services;
