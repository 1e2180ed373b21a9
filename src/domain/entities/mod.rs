//! Core domain entities representing the business data model.
//!
//! This module contains the fundamental data structures that represent the core
//! concepts of the URL shortening service. Entities are plain data structures
//! without business logic.
//!
//! # Entity Types
//!
//! - [`Link`] - A shortened URL mapping with its usage counters
//!
//! # Design Pattern
//!
//! Entities follow the "New Type" pattern with separate structs for creation:
//! - [`NewLink`] - For creating new records
//!
//! All entities include unit tests demonstrating their construction and usage.

pub mod link;

pub use link::{Link, NewLink};
