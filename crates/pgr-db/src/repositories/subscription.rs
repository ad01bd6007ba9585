//! PostgreSQL implementation of SubscriptionRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use pgr_core::{DomainError, RepoResult, Subscription, SubscriptionRepository};

use crate::models::SubscriptionModel;

use super::error::map_db_error;

/// PostgreSQL implementation of SubscriptionRepository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    #[instrument(skip(self))]
    async fn find_latest_for_user(&self, user_id: Uuid) -> RepoResult<Option<Subscription>> {
        let result = sqlx::query_as::<_, SubscriptionModel>(
            r"
            SELECT id, user_id, stripe_subscription_id, stripe_customer_id, plan, status,
                   current_period_start, current_period_end, created_at, updated_at
            FROM subscriptions
            WHERE user_id = $1
            ORDER BY updated_at DESC
            LIMIT 1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Subscription::from))
    }

    #[instrument(skip(self))]
    async fn find_by_stripe_id(
        &self,
        stripe_subscription_id: &str,
    ) -> RepoResult<Option<Subscription>> {
        let result = sqlx::query_as::<_, SubscriptionModel>(
            r"
            SELECT id, user_id, stripe_subscription_id, stripe_customer_id, plan, status,
                   current_period_start, current_period_end, created_at, updated_at
            FROM subscriptions
            WHERE stripe_subscription_id = $1
            ",
        )
        .bind(stripe_subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Subscription::from))
    }

    #[instrument(skip(self, subscription), fields(user_id = %subscription.user_id, status = %subscription.status))]
    async fn upsert(&self, subscription: &Subscription) -> RepoResult<Subscription> {
        // The WHERE on the update arm refuses to move a subscription between users;
        // in that case no row comes back.
        let result = sqlx::query_as::<_, SubscriptionModel>(
            r"
            INSERT INTO subscriptions (id, user_id, stripe_subscription_id, stripe_customer_id,
                                       plan, status, current_period_start, current_period_end,
                                       created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            ON CONFLICT (stripe_subscription_id) DO UPDATE
            SET stripe_customer_id = COALESCE(EXCLUDED.stripe_customer_id, subscriptions.stripe_customer_id),
                plan = COALESCE(EXCLUDED.plan, subscriptions.plan),
                status = EXCLUDED.status,
                current_period_start = COALESCE(EXCLUDED.current_period_start, subscriptions.current_period_start),
                current_period_end = COALESCE(EXCLUDED.current_period_end, subscriptions.current_period_end),
                updated_at = NOW()
            WHERE subscriptions.user_id = EXCLUDED.user_id
            RETURNING id, user_id, stripe_subscription_id, stripe_customer_id, plan, status,
                      current_period_start, current_period_end, created_at, updated_at
            ",
        )
        .bind(subscription.id)
        .bind(subscription.user_id)
        .bind(&subscription.stripe_subscription_id)
        .bind(&subscription.stripe_customer_id)
        .bind(&subscription.plan)
        .bind(&subscription.status)
        .bind(subscription.current_period_start)
        .bind(subscription.current_period_end)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result
            .map(Subscription::from)
            .ok_or(DomainError::SubscriptionOwnerMismatch)
    }
}
