//! User entity - an account identified by email

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::value_objects::AccessLevel;

/// User account, optionally linked to a Discord identity and a Stripe customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub discord_user_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub access_level: AccessLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new free user with a fresh id
    pub fn new(email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            discord_user_id: None,
            stripe_customer_id: None,
            access_level: AccessLevel::Free,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn is_premium(&self) -> bool {
        self.access_level.is_premium()
    }

    #[inline]
    pub fn has_discord_link(&self) -> bool {
        self.discord_user_id.is_some()
    }
}

/// Normalize an email for lookups and storage
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
