//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in pgr-core.
//! Each repository handles database operations for a specific domain entity.

mod audit_log;
mod error;
mod health;
mod subscription;
mod user;
mod webhook_event;

pub use audit_log::PgAuditLogRepository;
pub use health::PgHealthProbe;
pub use subscription::PgSubscriptionRepository;
pub use user::PgUserRepository;
pub use webhook_event::PgWebhookEventRepository;
