//! PostgreSQL implementation of AuditLogRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use pgr_core::{AuditLog, AuditLogRepository, RepoResult};

use crate::models::AuditLogModel;

use super::error::map_db_error;

/// PostgreSQL implementation of AuditLogRepository
#[derive(Clone)]
pub struct PgAuditLogRepository {
    pool: PgPool,
}

impl PgAuditLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for PgAuditLogRepository {
    #[instrument(skip(self, entry), fields(event_type = %entry.event_type))]
    async fn append(&self, entry: &AuditLog) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO audit_logs (id, user_id, event_type, source, request_id, status,
                                    details, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(&entry.event_type)
        .bind(&entry.source)
        .bind(&entry.request_id)
        .bind(&entry.status)
        .bind(&entry.details)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> RepoResult<Vec<AuditLog>> {
        let rows = sqlx::query_as::<_, AuditLogModel>(
            r"
            SELECT id, user_id, event_type, source, request_id, status, details, timestamp
            FROM audit_logs
            WHERE user_id = $1
            ORDER BY timestamp DESC
            LIMIT $2
            ",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(AuditLog::from).collect())
    }
}
