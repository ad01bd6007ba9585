//! Subscription entity - local mirror of a Stripe subscription

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::value_objects::{is_final_status, AccessEffect};

/// One row per provider subscription, owned by a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub stripe_subscription_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub plan: Option<String>,
    /// Raw provider status (`active`, `trialing`, `canceled`, ...)
    pub status: String,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Start a new mirror row for a user with the given status
    pub fn new(user_id: Uuid, status: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            stripe_subscription_id: None,
            stripe_customer_id: None,
            plan: None,
            status: status.into(),
            current_period_start: None,
            current_period_end: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn access_effect(&self) -> AccessEffect {
        AccessEffect::for_status(&self.status)
    }

    /// Canceled or expired for good; later events cannot revive it
    pub fn has_ended(&self) -> bool {
        is_final_status(&self.status)
    }
}
