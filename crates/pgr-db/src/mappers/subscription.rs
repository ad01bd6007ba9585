//! Subscription entity <-> model mapper

use pgr_core::Subscription;

use crate::models::SubscriptionModel;

/// Convert SubscriptionModel to Subscription entity
impl From<SubscriptionModel> for Subscription {
    fn from(model: SubscriptionModel) -> Self {
        Subscription {
            id: model.id,
            user_id: model.user_id,
            stripe_subscription_id: model.stripe_subscription_id,
            stripe_customer_id: model.stripe_customer_id,
            plan: model.plan,
            status: model.status,
            current_period_start: model.current_period_start,
            current_period_end: model.current_period_end,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
