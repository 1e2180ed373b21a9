//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A shortened URL link with its usage counters.
///
/// `redirect_count` and `last_used` hold the durable store's view of usage.
/// Fresher values may exist in the cache until the next reconciliation pass
/// folds them back.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub redirect_count: i64,
    pub last_used: Option<DateTime<Utc>>,
    pub owner_id: Option<Uuid>,
}

impl Link {
    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|e| Utc::now() >= e)
    }

    /// Returns true if `user_id` owns this link.
    ///
    /// A link without an owner belongs to nobody; ownership checks against it
    /// always fail.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == Some(user_id)
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub short_code: String,
    pub original_url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub owner_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_link() -> Link {
        Link {
            id: 1,
            short_code: "abc123".to_string(),
            original_url: "https://example.com".to_string(),
            created_at: Utc::now(),
            expires_at: None,
            redirect_count: 0,
            last_used: None,
            owner_id: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn test_link_without_expiry_never_expires() {
        let link = sample_link();
        assert!(!link.is_expired());
    }

    #[test]
    fn test_link_is_expired() {
        let link = Link {
            expires_at: Some(Utc::now() - Duration::seconds(1)),
            ..sample_link()
        };
        assert!(link.is_expired());
    }

    #[test]
    fn test_link_with_future_expiry_is_live() {
        let link = Link {
            expires_at: Some(Utc::now() + Duration::hours(1)),
            ..sample_link()
        };
        assert!(!link.is_expired());
    }

    #[test]
    fn test_ownership() {
        let owner = Uuid::new_v4();
        let link = Link {
            owner_id: Some(owner),
            ..sample_link()
        };

        assert!(link.is_owned_by(owner));
        assert!(!link.is_owned_by(Uuid::new_v4()));
    }

    #[test]
    fn test_unowned_link_is_owned_by_nobody() {
        let link = Link {
            owner_id: None,
            ..sample_link()
        };
        assert!(!link.is_owned_by(Uuid::new_v4()));
    }
}
