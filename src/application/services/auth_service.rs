//! Authentication service for API token validation.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::repositories::TokenRepository;
use crate::error::AppError;
use serde_json::json;

type HmacSha256 = Hmac<Sha256>;

/// Hashes a raw token with HMAC-SHA256 under the given signing secret.
///
/// Returns a 64-character lowercase hex-encoded MAC. Issuance (the admin CLI)
/// and verification must use the same secret, or no token will ever match.
pub fn hash_token(secret: &str, token: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// The identity a validated Bearer token resolves to.
///
/// Inserted into request extensions by the auth middleware so handlers can
/// check link ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Service for authenticating API requests via Bearer tokens.
///
/// Tokens are hashed with HMAC-SHA256 (keyed by `signing_secret`) before storage
/// and comparison. An attacker with read-only access to the database cannot verify
/// or forge tokens without the server-side secret.
pub struct AuthService {
    repository: Arc<dyn TokenRepository>,
    signing_secret: String,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// # Arguments
    ///
    /// - `repository` - token repository for DB operations
    /// - `signing_secret` - HMAC key; must match the value used when tokens were created
    pub fn new(repository: Arc<dyn TokenRepository>, signing_secret: String) -> Self {
        Self {
            repository,
            signing_secret,
        }
    }

    /// Authenticates a raw token and resolves it to a user.
    ///
    /// On successful authentication, updates the token's `last_used_at`
    /// timestamp for monitoring and audit purposes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if:
    /// - Token hash does not match any stored credentials
    /// - Token has been revoked
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let token_hash = hash_token(&self.signing_secret, token);

        let user_id = self
            .repository
            .find_user_by_token_hash(&token_hash)
            .await?
            .ok_or_else(|| {
                AppError::unauthorized(
                    "Unauthorized",
                    json!({"reason": "Invalid or revoked token"}),
                )
            })?;

        let _ = self.repository.touch(&token_hash).await;

        Ok(AuthenticatedUser { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockTokenRepository;

    fn test_secret() -> String {
        "test-signing-secret".to_string()
    }

    fn compute_expected_hash(token: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(test_secret().as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let mut mock_repo = MockTokenRepository::new();

        let token = "valid-token";
        let expected_hash = compute_expected_hash(token);
        let user_id = Uuid::new_v4();

        mock_repo
            .expect_find_user_by_token_hash()
            .withf(move |hash| hash == expected_hash)
            .times(1)
            .returning(move |_| Ok(Some(user_id)));

        mock_repo.expect_touch().times(1).returning(|_| Ok(()));

        let service = AuthService::new(Arc::new(mock_repo), test_secret());

        let user = service.authenticate(token).await.unwrap();

        assert_eq!(user.user_id, user_id);
    }

    #[tokio::test]
    async fn test_authenticate_invalid_token() {
        let mut mock_repo = MockTokenRepository::new();

        mock_repo
            .expect_find_user_by_token_hash()
            .times(1)
            .returning(|_| Ok(None));
        mock_repo.expect_touch().times(0);

        let service = AuthService::new(Arc::new(mock_repo), test_secret());

        let result = service.authenticate("invalid-token").await;

        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AppError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_authenticate_survives_touch_failure() {
        let mut mock_repo = MockTokenRepository::new();

        let user_id = Uuid::new_v4();
        mock_repo
            .expect_find_user_by_token_hash()
            .times(1)
            .returning(move |_| Ok(Some(user_id)));
        mock_repo.expect_touch().times(1).returning(|_| {
            Err(AppError::internal(
                "db down",
                serde_json::Value::Null,
            ))
        });

        let service = AuthService::new(Arc::new(mock_repo), test_secret());

        // The audit timestamp is best-effort; auth still succeeds.
        let user = service.authenticate("valid-token").await.unwrap();
        assert_eq!(user.user_id, user_id);
    }

    #[test]
    fn test_hash_token_consistency() {
        let hash1 = hash_token("secret", "test-token");
        let hash2 = hash_token("secret", "test-token");

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_hash_token_different_inputs() {
        assert_ne!(hash_token("secret", "token1"), hash_token("secret", "token2"));
    }

    #[test]
    fn test_hash_token_secret_matters() {
        // Same token, different secrets produce different hashes
        assert_ne!(hash_token("secret-a", "token"), hash_token("secret-b", "token"));
    }
}
