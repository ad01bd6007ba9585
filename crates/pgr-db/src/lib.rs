//! # pgr-db
//!
//! Database layer implementing repository traits with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! This crate provides PostgreSQL implementations for the repository traits
//! defined in `pgr-core`. It handles:
//!
//! - Connection pool management
//! - Schema bootstrap at startup
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pgr_db::{create_pool, ensure_schema, DatabaseConfig, PgUserRepository};
//! use pgr_core::UserRepository;
//!
//! async fn example(url: String) -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig { url, ..Default::default() }).await?;
//!     ensure_schema(&pool).await?;
//!     let users = PgUserRepository::new(pool);
//!     let (user, created) = users.find_or_create_by_email("a@example.com").await?;
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;
pub mod schema;

// Re-export commonly used types
pub use pool::{create_pool, DatabaseConfig, PgPool};
pub use repositories::{
    PgAuditLogRepository, PgHealthProbe, PgSubscriptionRepository, PgUserRepository,
    PgWebhookEventRepository,
};
pub use schema::ensure_schema;
