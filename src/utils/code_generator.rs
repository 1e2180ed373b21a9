//! Short code generation and validation utilities.

use crate::error::AppError;
use rand::{Rng, distr::Alphanumeric};
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

/// Length of generated short codes.
const CODE_LENGTH: usize = 6;

/// Compiled regex for custom alias validation.
static ALIAS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Reserved codes that cannot be used as short links.
///
/// These codes are reserved for system endpoints to prevent routing conflicts.
const RESERVED_CODES: &[&str] = &["api", "health"];

/// Generates a random alphanumeric short code.
///
/// Six characters over `[a-zA-Z0-9]` give 62^6 (~56.8 billion) possible
/// codes; collisions are handled by the caller's retry loop.
///
/// # Examples
///
/// ```ignore
/// let code = generate_code();
/// assert_eq!(code.len(), 6);
/// assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect()
}

/// Validates a user-provided custom alias.
///
/// # Rules
///
/// - Length: 4-32 characters
/// - Allowed characters: letters, digits, hyphens, underscores
/// - Cannot be a reserved system code
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any validation rule is violated.
pub fn validate_custom_alias(alias: &str) -> Result<(), AppError> {
    if alias.len() < 4 || alias.len() > 32 {
        return Err(AppError::bad_request(
            "Custom alias must be 4-32 characters",
            json!({ "provided_length": alias.len() }),
        ));
    }

    if !ALIAS_REGEX.is_match(alias) {
        return Err(AppError::bad_request(
            "Custom alias can only contain letters, digits, hyphens, and underscores",
            json!({ "alias": alias }),
        ));
    }

    if RESERVED_CODES.contains(&alias) {
        return Err(AppError::bad_request(
            "This alias is reserved",
            json!({ "alias": alias }),
        ));
    }

    Ok(())
}
