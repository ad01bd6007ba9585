//! Audit log entity <-> model mapper

use pgr_core::AuditLog;

use crate::models::AuditLogModel;

impl From<AuditLogModel> for AuditLog {
    fn from(model: AuditLogModel) -> Self {
        AuditLog {
            id: model.id,
            user_id: model.user_id,
            event_type: model.event_type,
            source: model.source,
            status: model.status,
            request_id: model.request_id,
            details: model.details,
            timestamp: model.timestamp,
        }
    }
}
