//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx prepared
//! statements.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Link storage, retrieval, and counter write-back
//! - [`PgTokenRepository`] - API token validation

pub mod pg_link_repository;
pub mod pg_token_repository;

pub use pg_link_repository::PgLinkRepository;
pub use pg_token_repository::PgTokenRepository;
