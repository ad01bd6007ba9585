//! Audit log entry - append-only record of notable events

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Outcome recorded on an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Success,
    Failed,
    Ignored,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Ignored => "ignored",
        }
    }
}

/// Audit log entry. Never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub event_type: String,
    pub source: String,
    pub status: String,
    pub request_id: Option<String>,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditLog {
    pub fn new(event_type: impl Into<String>, source: impl Into<String>, status: AuditStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: None,
            event_type: event_type.into(),
            source: source.into(),
            status: status.as_str().to_string(),
            request_id: None,
            details: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_user(mut self, user_id: Option<Uuid>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
