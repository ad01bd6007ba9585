//! Database models - SQLx-compatible structs for PostgreSQL tables

mod audit_log;
mod subscription;
mod user;

pub use audit_log::AuditLogModel;
pub use subscription::SubscriptionModel;
pub use user::UserModel;
