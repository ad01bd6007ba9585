//! Audit trail writer
//!
//! Appends audit entries tagged with the request id. Failures to write are
//! logged and swallowed: the audit log never fails the operation it records.

use tracing::warn;
use uuid::Uuid;

use pgr_core::{AuditLog, AuditStatus};

use super::context::ServiceContext;

pub mod events {
    pub const USER_CREATED: &str = "user_created";
    pub const USER_LOGIN: &str = "user_login";
    pub const DISCORD_LINKED: &str = "discord_linked";
    pub const CHECKOUT_CREATED: &str = "checkout_created";
    pub const PREMIUM_GRANTED: &str = "premium_granted";
    pub const PREMIUM_REVOKED: &str = "premium_revoked";
    pub const DISCORD_ROLE_GRANT: &str = "discord_role_grant";
    pub const DISCORD_ROLE_REVOKE: &str = "discord_role_revoke";
    pub const SUBSCRIPTION_SYNCED: &str = "subscription_synced";
    pub const WEBHOOK_IGNORED: &str = "webhook_ignored";
}

pub mod sources {
    pub const AUTH: &str = "auth";
    pub const DISCORD: &str = "discord";
    pub const STRIPE: &str = "stripe";
}

/// Audit log writer
pub struct AuditService<'a> {
    ctx: &'a ServiceContext,
    request_id: Option<&'a str>,
}

impl<'a> AuditService<'a> {
    pub fn new(ctx: &'a ServiceContext, request_id: Option<&'a str>) -> Self {
        Self { ctx, request_id }
    }

    /// Append an entry; errors are logged, never returned
    pub async fn log(
        &self,
        event_type: &str,
        source: &str,
        status: AuditStatus,
        user_id: Option<Uuid>,
        details: Option<String>,
    ) {
        let mut entry = AuditLog::new(event_type, source, status)
            .with_user(user_id)
            .with_request_id(self.request_id.map(str::to_string));
        if let Some(details) = details {
            entry = entry.with_details(details);
        }

        if let Err(e) = self.ctx.audit_repo().append(&entry).await {
            warn!(error = %e, event_type, source, "Failed to write audit log entry");
        }
    }

    pub async fn success(&self, event_type: &str, source: &str, user_id: Option<Uuid>) {
        self.log(event_type, source, AuditStatus::Success, user_id, None)
            .await;
    }
}
