//! Ports implemented by the infrastructure crates

mod providers;
mod repositories;

pub use providers::{
    BillingGateway, CheckoutSession, CheckoutSessionRequest, DiscordOAuthGateway,
    DiscordProfile, PortalSession, PremiumRoleGateway, ProviderResult,
};
pub use repositories::{
    AuditLogRepository, HealthProbe, RepoResult, SubscriptionRepository, UserRepository,
    WebhookEventRepository, WEBHOOK_CLAIM_LEASE_SECS,
};
