//! PostgreSQL implementation of WebhookEventRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use pgr_core::{RepoResult, WebhookEventRepository, WEBHOOK_CLAIM_LEASE_SECS};

use super::error::map_db_error;

/// Idempotency ledger backed by the primary key on `webhook_events.stripe_event_id`
#[derive(Clone)]
pub struct PgWebhookEventRepository {
    pool: PgPool,
}

impl PgWebhookEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookEventRepository for PgWebhookEventRepository {
    #[instrument(skip(self))]
    async fn claim(&self, event_id: &str, event_type: &str) -> RepoResult<bool> {
        let claimed = sqlx::query_scalar::<_, String>(
            r"
            INSERT INTO webhook_events (stripe_event_id, event_type, status, received_at)
            VALUES ($1, $2, 'processing', NOW())
            ON CONFLICT (stripe_event_id) DO UPDATE
                SET received_at = NOW(), event_type = EXCLUDED.event_type
                WHERE webhook_events.status = 'processing'
                  AND webhook_events.received_at < NOW() - $3 * INTERVAL '1 second'
            RETURNING stripe_event_id
            ",
        )
        .bind(event_id)
        .bind(event_type)
        .bind(WEBHOOK_CLAIM_LEASE_SECS)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(claimed.is_some())
    }

    #[instrument(skip(self))]
    async fn complete(&self, event_id: &str, outcome: &str) -> RepoResult<()> {
        sqlx::query(
            r"
            UPDATE webhook_events
            SET status = 'processed', outcome = $2, processed_at = NOW()
            WHERE stripe_event_id = $1
            ",
        )
        .bind(event_id)
        .bind(outcome)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn release(&self, event_id: &str) -> RepoResult<()> {
        sqlx::query(
            r"
            DELETE FROM webhook_events
            WHERE stripe_event_id = $1 AND status = 'processing'
            ",
        )
        .bind(event_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }
}
