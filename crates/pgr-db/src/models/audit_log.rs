//! Audit log database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for audit_logs table
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogModel {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub event_type: String,
    pub source: String,
    pub request_id: Option<String>,
    pub status: String,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}
