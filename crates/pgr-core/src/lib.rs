//! # pgr-core
//!
//! Domain layer containing entities, value objects, repository traits and the
//! ports for the outside providers (payments, Discord).
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{normalize_email, AuditLog, AuditStatus, Subscription, User};
pub use error::DomainError;
pub use traits::{
    AuditLogRepository, BillingGateway, CheckoutSession, CheckoutSessionRequest,
    DiscordOAuthGateway, DiscordProfile, HealthProbe, PortalSession, PremiumRoleGateway,
    ProviderResult, RepoResult, SubscriptionRepository, UserRepository, WebhookEventRepository,
    WEBHOOK_CLAIM_LEASE_SECS,
};
pub use value_objects::{
    is_discord_snowflake, is_final_status, AccessEffect, AccessLevel, ParseAccessLevelError,
};
