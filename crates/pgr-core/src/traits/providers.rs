//! Provider traits (ports) for the payment processor and Discord

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Result type for outbound provider calls
pub type ProviderResult<T> = Result<T, DomainError>;

// ============================================================================
// Discord
// ============================================================================

/// Subset of the Discord `/users/@me` profile we rely on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordProfile {
    pub id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

/// OAuth2 authorization-code flow against Discord
#[async_trait]
pub trait DiscordOAuthGateway: Send + Sync {
    /// URL of the consent screen carrying the anti-forgery state
    fn authorize_url(&self, state: &str) -> String;

    /// Exchange an authorization code for an access token
    async fn exchange_code(&self, code: &str) -> ProviderResult<String>;

    /// Fetch the profile of the token owner
    async fn fetch_profile(&self, access_token: &str) -> ProviderResult<DiscordProfile>;
}

/// Grants and revokes the premium role in the configured guild
#[async_trait]
pub trait PremiumRoleGateway: Send + Sync {
    async fn grant_premium_role(&self, discord_user_id: &str) -> ProviderResult<()>;

    async fn revoke_premium_role(&self, discord_user_id: &str) -> ProviderResult<()>;
}

// ============================================================================
// Billing
// ============================================================================

/// Parameters for a hosted subscription checkout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub price_id: String,
    pub plan: String,
    /// Correlation identifier echoed back on the webhook
    pub discord_user_id: String,
    pub customer_id: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalSession {
    pub url: String,
}

/// Hosted checkout and customer portal sessions
#[async_trait]
pub trait BillingGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> ProviderResult<CheckoutSession>;

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> ProviderResult<PortalSession>;
}
