//! Domain entities - core business objects

mod audit_log;
mod subscription;
mod user;

pub use audit_log::{AuditLog, AuditStatus};
pub use subscription::Subscription;
pub use user::{normalize_email, User};
