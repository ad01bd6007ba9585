//! Service context - dependency container for services
//!
//! Holds the repositories, provider gateways and signing services needed by
//! the services. Everything is behind an `Arc` so the context is cheap to
//! clone into request handlers.

use std::sync::Arc;

use pgr_common::{JwtService, PlanPrice, StripeConfig};
use pgr_core::{
    AuditLogRepository, BillingGateway, DiscordOAuthGateway, HealthProbe, PremiumRoleGateway,
    SubscriptionRepository, UserRepository, WebhookEventRepository,
};
use pgr_providers::WebhookVerifier;

use super::error::{ServiceError, ServiceResult};

/// Checkout defaults and the plan table
#[derive(Debug, Clone)]
pub struct BillingSettings {
    pub plans: Vec<PlanPrice>,
    pub default_plan: String,
    pub success_url: String,
    pub cancel_url: String,
    pub portal_return_url: String,
}

impl BillingSettings {
    /// Resolve a plan label, or the default plan when none is given
    pub fn plan(&self, label: Option<&str>) -> Option<&PlanPrice> {
        let wanted = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.default_plan);
        self.plans.iter().find(|p| p.label == wanted)
    }
}

impl From<&StripeConfig> for BillingSettings {
    fn from(config: &StripeConfig) -> Self {
        Self {
            plans: config.plans.clone(),
            default_plan: config.default_plan.clone(),
            success_url: config.success_url.clone(),
            cancel_url: config.cancel_url.clone(),
            portal_return_url: config.portal_return_url.clone(),
        }
    }
}

/// Service context containing all dependencies
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    user_repo: Arc<dyn UserRepository>,
    subscription_repo: Arc<dyn SubscriptionRepository>,
    audit_repo: Arc<dyn AuditLogRepository>,
    webhook_event_repo: Arc<dyn WebhookEventRepository>,
    health_probe: Arc<dyn HealthProbe>,

    // Providers
    billing: Arc<dyn BillingGateway>,
    discord_oauth: Arc<dyn DiscordOAuthGateway>,
    premium_roles: Arc<dyn PremiumRoleGateway>,

    // Signing / verification
    jwt_service: Arc<JwtService>,
    webhook_verifier: Arc<WebhookVerifier>,

    billing_settings: Arc<BillingSettings>,
}

impl ServiceContext {
    /// Start building a context
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    // === Repositories ===

    pub fn user_repo(&self) -> &dyn UserRepository {
        self.user_repo.as_ref()
    }

    pub fn subscription_repo(&self) -> &dyn SubscriptionRepository {
        self.subscription_repo.as_ref()
    }

    pub fn audit_repo(&self) -> &dyn AuditLogRepository {
        self.audit_repo.as_ref()
    }

    pub fn webhook_event_repo(&self) -> &dyn WebhookEventRepository {
        self.webhook_event_repo.as_ref()
    }

    pub fn health_probe(&self) -> &dyn HealthProbe {
        self.health_probe.as_ref()
    }

    // === Providers ===

    pub fn billing(&self) -> &dyn BillingGateway {
        self.billing.as_ref()
    }

    pub fn discord_oauth(&self) -> &dyn DiscordOAuthGateway {
        self.discord_oauth.as_ref()
    }

    pub fn premium_roles(&self) -> &dyn PremiumRoleGateway {
        self.premium_roles.as_ref()
    }

    // === Signing ===

    /// Get the JWT service
    pub fn jwt_service(&self) -> &JwtService {
        self.jwt_service.as_ref()
    }

    /// Get the Stripe webhook verifier
    pub fn webhook_verifier(&self) -> &WebhookVerifier {
        self.webhook_verifier.as_ref()
    }

    pub fn billing_settings(&self) -> &BillingSettings {
        self.billing_settings.as_ref()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("providers", &"...")
            .field("billing_settings", &self.billing_settings)
            .finish()
    }
}

/// Builder for creating ServiceContext
#[derive(Default)]
pub struct ServiceContextBuilder {
    user_repo: Option<Arc<dyn UserRepository>>,
    subscription_repo: Option<Arc<dyn SubscriptionRepository>>,
    audit_repo: Option<Arc<dyn AuditLogRepository>>,
    webhook_event_repo: Option<Arc<dyn WebhookEventRepository>>,
    health_probe: Option<Arc<dyn HealthProbe>>,
    billing: Option<Arc<dyn BillingGateway>>,
    discord_oauth: Option<Arc<dyn DiscordOAuthGateway>>,
    premium_roles: Option<Arc<dyn PremiumRoleGateway>>,
    jwt_service: Option<Arc<JwtService>>,
    webhook_verifier: Option<Arc<WebhookVerifier>>,
    billing_settings: Option<Arc<BillingSettings>>,
}

fn required<T>(value: Option<T>, name: &str) -> ServiceResult<T> {
    value.ok_or_else(|| ServiceError::validation(format!("{name} is required")))
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_repo(mut self, repo: Arc<dyn UserRepository>) -> Self {
        self.user_repo = Some(repo);
        self
    }

    pub fn subscription_repo(mut self, repo: Arc<dyn SubscriptionRepository>) -> Self {
        self.subscription_repo = Some(repo);
        self
    }

    pub fn audit_repo(mut self, repo: Arc<dyn AuditLogRepository>) -> Self {
        self.audit_repo = Some(repo);
        self
    }

    pub fn webhook_event_repo(mut self, repo: Arc<dyn WebhookEventRepository>) -> Self {
        self.webhook_event_repo = Some(repo);
        self
    }

    pub fn health_probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.health_probe = Some(probe);
        self
    }

    pub fn billing(mut self, gateway: Arc<dyn BillingGateway>) -> Self {
        self.billing = Some(gateway);
        self
    }

    pub fn discord_oauth(mut self, gateway: Arc<dyn DiscordOAuthGateway>) -> Self {
        self.discord_oauth = Some(gateway);
        self
    }

    pub fn premium_roles(mut self, gateway: Arc<dyn PremiumRoleGateway>) -> Self {
        self.premium_roles = Some(gateway);
        self
    }

    pub fn jwt_service(mut self, service: Arc<JwtService>) -> Self {
        self.jwt_service = Some(service);
        self
    }

    pub fn webhook_verifier(mut self, verifier: Arc<WebhookVerifier>) -> Self {
        self.webhook_verifier = Some(verifier);
        self
    }

    pub fn billing_settings(mut self, settings: BillingSettings) -> Self {
        self.billing_settings = Some(Arc::new(settings));
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext {
            user_repo: required(self.user_repo, "user_repo")?,
            subscription_repo: required(self.subscription_repo, "subscription_repo")?,
            audit_repo: required(self.audit_repo, "audit_repo")?,
            webhook_event_repo: required(self.webhook_event_repo, "webhook_event_repo")?,
            health_probe: required(self.health_probe, "health_probe")?,
            billing: required(self.billing, "billing")?,
            discord_oauth: required(self.discord_oauth, "discord_oauth")?,
            premium_roles: required(self.premium_roles, "premium_roles")?,
            jwt_service: required(self.jwt_service, "jwt_service")?,
            webhook_verifier: required(self.webhook_verifier, "webhook_verifier")?,
            billing_settings: required(self.billing_settings, "billing_settings")?,
        })
    }
}
