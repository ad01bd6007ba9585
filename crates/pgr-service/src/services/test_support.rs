//! In-memory repositories and provider fakes for service tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

use pgr_common::{JwtService, PlanPrice};
use pgr_core::{
    AccessLevel, AuditLog, AuditLogRepository, BillingGateway, CheckoutSession,
    CheckoutSessionRequest, DiscordOAuthGateway, DiscordProfile, DomainError, HealthProbe,
    PortalSession, PremiumRoleGateway, ProviderResult, RepoResult, Subscription,
    SubscriptionRepository, User, UserRepository, WebhookEventRepository,
    WEBHOOK_CLAIM_LEASE_SECS,
};
use pgr_providers::stripe::compute_signature;
use pgr_providers::WebhookVerifier;

use super::context::{BillingSettings, ServiceContext};

pub const JWT_SECRET: &str = "test-secret-key-that-is-long-enough";
pub const WEBHOOK_SECRET: &str = "whsec_service_tests";

fn db_down() -> DomainError {
    DomainError::DatabaseError("connection refused".to_string())
}

// ============================================================================
// Repositories
// ============================================================================

#[derive(Default)]
pub struct MemoryUsers {
    rows: Mutex<Vec<User>>,
    fail: AtomicBool,
}

impl MemoryUsers {
    pub fn all(&self) -> Vec<User> {
        self.rows.lock().unwrap().clone()
    }

    pub fn insert(&self, user: User) -> User {
        self.rows.lock().unwrap().push(user.clone());
        user
    }

    pub fn get(&self, id: Uuid) -> User {
        self.all().into_iter().find(|u| u.id == id).unwrap()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> RepoResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(db_down())
        } else {
            Ok(())
        }
    }

    fn update(&self, id: Uuid, f: impl FnOnce(&mut User)) -> RepoResult<User> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let user = rows
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| DomainError::UserNotFound(id.to_string()))?;
        f(user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.all().into_iter().find(|u| u.id == id))
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self.all().into_iter().find(|u| u.email == email))
    }

    async fn find_by_discord_id(&self, discord_user_id: &str) -> RepoResult<Option<User>> {
        Ok(self
            .all()
            .into_iter()
            .find(|u| u.discord_user_id.as_deref() == Some(discord_user_id)))
    }

    async fn find_by_stripe_customer_id(&self, customer_id: &str) -> RepoResult<Option<User>> {
        Ok(self
            .all()
            .into_iter()
            .find(|u| u.stripe_customer_id.as_deref() == Some(customer_id)))
    }

    async fn find_or_create_by_email(&self, email: &str) -> RepoResult<(User, bool)> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows.iter().find(|u| u.email == email) {
            return Ok((existing.clone(), false));
        }
        let user = User::new(email);
        rows.push(user.clone());
        Ok((user, true))
    }

    async fn link_discord(&self, id: Uuid, discord_user_id: &str) -> RepoResult<User> {
        self.check()?;
        for user in self.rows.lock().unwrap().iter_mut() {
            if user.id != id && user.discord_user_id.as_deref() == Some(discord_user_id) {
                user.discord_user_id = None;
            }
        }
        self.update(id, |u| u.discord_user_id = Some(discord_user_id.to_string()))
    }

    async fn set_access_level(&self, id: Uuid, level: AccessLevel) -> RepoResult<()> {
        self.update(id, |u| u.access_level = level).map(|_| ())
    }

    async fn set_stripe_customer_id(&self, id: Uuid, customer_id: &str) -> RepoResult<()> {
        self.update(id, |u| u.stripe_customer_id = Some(customer_id.to_string()))
            .map(|_| ())
    }
}

#[derive(Default)]
pub struct MemorySubscriptions {
    rows: Mutex<Vec<Subscription>>,
}

impl MemorySubscriptions {
    pub fn all(&self) -> Vec<Subscription> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriptionRepository for MemorySubscriptions {
    async fn find_latest_for_user(&self, user_id: Uuid) -> RepoResult<Option<Subscription>> {
        Ok(self
            .all()
            .into_iter()
            .filter(|s| s.user_id == user_id)
            .max_by_key(|s| s.updated_at))
    }

    async fn find_by_stripe_id(&self, stripe_id: &str) -> RepoResult<Option<Subscription>> {
        Ok(self
            .all()
            .into_iter()
            .find(|s| s.stripe_subscription_id.as_deref() == Some(stripe_id)))
    }

    async fn upsert(&self, subscription: &Subscription) -> RepoResult<Subscription> {
        let mut rows = self.rows.lock().unwrap();
        let existing = rows.iter_mut().find(|s| {
            s.stripe_subscription_id.is_some()
                && s.stripe_subscription_id == subscription.stripe_subscription_id
        });
        match existing {
            Some(row) if row.user_id != subscription.user_id => {
                Err(DomainError::SubscriptionOwnerMismatch)
            }
            Some(row) => {
                row.status.clone_from(&subscription.status);
                if subscription.plan.is_some() {
                    row.plan.clone_from(&subscription.plan);
                }
                if subscription.stripe_customer_id.is_some() {
                    row.stripe_customer_id.clone_from(&subscription.stripe_customer_id);
                }
                row.current_period_start =
                    subscription.current_period_start.or(row.current_period_start);
                row.current_period_end = subscription.current_period_end.or(row.current_period_end);
                row.updated_at = Utc::now();
                Ok(row.clone())
            }
            None => {
                rows.push(subscription.clone());
                Ok(subscription.clone())
            }
        }
    }
}

#[derive(Default)]
pub struct MemoryAudit {
    rows: Mutex<Vec<AuditLog>>,
    fail: AtomicBool,
}

impl MemoryAudit {
    pub fn entries(&self) -> Vec<AuditLog> {
        self.rows.lock().unwrap().clone()
    }

    /// `(event_type, status)` pairs in write order
    pub fn events(&self) -> Vec<(String, String)> {
        self.entries()
            .into_iter()
            .map(|e| (e.event_type, e.status))
            .collect()
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.entries()
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    pub fn fail_writes(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuditLogRepository for MemoryAudit {
    async fn append(&self, entry: &AuditLog) -> RepoResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(db_down());
        }
        self.rows.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> RepoResult<Vec<AuditLog>> {
        let mut entries: Vec<_> = self
            .entries()
            .into_iter()
            .filter(|e| e.user_id == Some(user_id))
            .collect();
        entries.reverse();
        entries.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(entries)
    }
}

#[derive(Default)]
pub struct MemoryWebhookEvents {
    /// event id -> (outcome, None while processing; time of the claim)
    rows: Mutex<HashMap<String, (Option<String>, DateTime<Utc>)>>,
}

impl MemoryWebhookEvents {
    pub fn outcome(&self, event_id: &str) -> Option<Option<String>> {
        self.rows
            .lock()
            .unwrap()
            .get(event_id)
            .map(|(outcome, _)| outcome.clone())
    }

    /// Backdate a claim, as if the attempt holding it died `secs` ago
    pub fn backdate_claim(&self, event_id: &str, secs: i64) {
        if let Some((_, claimed_at)) = self.rows.lock().unwrap().get_mut(event_id) {
            *claimed_at -= Duration::seconds(secs);
        }
    }
}

#[async_trait]
impl WebhookEventRepository for MemoryWebhookEvents {
    async fn claim(&self, event_id: &str, _event_type: &str) -> RepoResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        let now = Utc::now();
        if let Some((outcome, claimed_at)) = rows.get(event_id) {
            let stale = outcome.is_none()
                && *claimed_at < now - Duration::seconds(WEBHOOK_CLAIM_LEASE_SECS);
            if !stale {
                return Ok(false);
            }
        }
        rows.insert(event_id.to_string(), (None, now));
        Ok(true)
    }

    async fn complete(&self, event_id: &str, outcome: &str) -> RepoResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let claimed_at = rows.get(event_id).map_or_else(Utc::now, |(_, at)| *at);
        rows.insert(event_id.to_string(), (Some(outcome.to_string()), claimed_at));
        Ok(())
    }

    async fn release(&self, event_id: &str) -> RepoResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if matches!(rows.get(event_id), Some((None, _))) {
            rows.remove(event_id);
        }
        Ok(())
    }
}

pub struct FakeHealth {
    pub healthy: AtomicBool,
}

#[async_trait]
impl HealthProbe for FakeHealth {
    async fn ping(&self) -> RepoResult<()> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(db_down())
        }
    }
}

// ============================================================================
// Providers
// ============================================================================

#[derive(Default)]
pub struct FakeBilling {
    pub checkouts: Mutex<Vec<CheckoutSessionRequest>>,
    pub portals: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl BillingGateway for FakeBilling {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> ProviderResult<CheckoutSession> {
        let mut checkouts = self.checkouts.lock().unwrap();
        checkouts.push(request.clone());
        let id = format!("cs_test_{}", checkouts.len());
        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.test/{id}"),
            id,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> ProviderResult<PortalSession> {
        self.portals
            .lock()
            .unwrap()
            .push((customer_id.to_string(), return_url.to_string()));
        Ok(PortalSession {
            url: format!("https://billing.stripe.test/{customer_id}"),
        })
    }
}

pub struct FakeDiscordOAuth {
    pub profile: Mutex<DiscordProfile>,
    /// `(status, body)` returned by the token endpoint instead of a token
    pub exchange_failure: Mutex<Option<(u16, String)>>,
}

impl Default for FakeDiscordOAuth {
    fn default() -> Self {
        Self {
            profile: Mutex::new(DiscordProfile {
                id: Some("300000000000000000".to_string()),
                username: Some("player".to_string()),
                email: Some("Player@Example.com".to_string()),
            }),
            exchange_failure: Mutex::new(None),
        }
    }
}

#[async_trait]
impl DiscordOAuthGateway for FakeDiscordOAuth {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://discord.test/oauth2/authorize?state={state}")
    }

    async fn exchange_code(&self, code: &str) -> ProviderResult<String> {
        if let Some((status, body)) = self.exchange_failure.lock().unwrap().clone() {
            return Err(DomainError::provider("discord", Some(status), body));
        }
        Ok(format!("token-for-{code}"))
    }

    async fn fetch_profile(&self, _access_token: &str) -> ProviderResult<DiscordProfile> {
        Ok(self.profile.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct FakeRoles {
    pub grants: Mutex<Vec<String>>,
    pub revokes: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl FakeRoles {
    pub fn fail_calls(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn grants(&self) -> Vec<String> {
        self.grants.lock().unwrap().clone()
    }

    pub fn revokes(&self) -> Vec<String> {
        self.revokes.lock().unwrap().clone()
    }

    fn check(&self) -> ProviderResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(DomainError::provider("discord", Some(403), "Missing Permissions"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PremiumRoleGateway for FakeRoles {
    async fn grant_premium_role(&self, discord_user_id: &str) -> ProviderResult<()> {
        self.check()?;
        self.grants.lock().unwrap().push(discord_user_id.to_string());
        Ok(())
    }

    async fn revoke_premium_role(&self, discord_user_id: &str) -> ProviderResult<()> {
        self.check()?;
        self.revokes.lock().unwrap().push(discord_user_id.to_string());
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct TestHarness {
    pub users: Arc<MemoryUsers>,
    pub subscriptions: Arc<MemorySubscriptions>,
    pub audit: Arc<MemoryAudit>,
    pub webhook_events: Arc<MemoryWebhookEvents>,
    pub health: Arc<FakeHealth>,
    pub billing: Arc<FakeBilling>,
    pub discord: Arc<FakeDiscordOAuth>,
    pub roles: Arc<FakeRoles>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            users: Arc::default(),
            subscriptions: Arc::default(),
            audit: Arc::default(),
            webhook_events: Arc::default(),
            health: Arc::new(FakeHealth {
                healthy: AtomicBool::new(true),
            }),
            billing: Arc::default(),
            discord: Arc::default(),
            roles: Arc::default(),
        }
    }

    pub fn billing_settings() -> BillingSettings {
        BillingSettings {
            plans: vec![PlanPrice {
                label: "premium_399".to_string(),
                price_id: "price_399".to_string(),
            }],
            default_plan: "premium_399".to_string(),
            success_url: "https://app.example.com/success".to_string(),
            cancel_url: "https://app.example.com/cancel".to_string(),
            portal_return_url: "https://app.example.com/account".to_string(),
        }
    }

    pub fn context(&self) -> ServiceContext {
        ServiceContext::builder()
            .user_repo(self.users.clone())
            .subscription_repo(self.subscriptions.clone())
            .audit_repo(self.audit.clone())
            .webhook_event_repo(self.webhook_events.clone())
            .health_probe(self.health.clone())
            .billing(self.billing.clone())
            .discord_oauth(self.discord.clone())
            .premium_roles(self.roles.clone())
            .jwt_service(Arc::new(JwtService::new(JWT_SECRET, 604_800)))
            .webhook_verifier(Arc::new(WebhookVerifier::new(WEBHOOK_SECRET, 300)))
            .billing_settings(Self::billing_settings())
            .build()
            .unwrap()
    }

    /// A stored user with the given email and Discord link
    pub fn user(&self, email: &str, discord_id: Option<&str>) -> User {
        let mut user = User::new(email);
        user.discord_user_id = discord_id.map(str::to_string);
        self.users.insert(user)
    }
}

/// Serialize an event and sign it the way Stripe does
pub fn signed_event(event: &Value) -> (Vec<u8>, String) {
    let payload = serde_json::to_vec(event).unwrap();
    let timestamp = Utc::now().timestamp();
    let signature = compute_signature(WEBHOOK_SECRET, timestamp, &payload).unwrap();
    (payload, format!("t={timestamp},v1={signature}"))
}
