//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation.

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{AuditLog, Subscription, User};
use crate::error::DomainError;
use crate::value_objects::AccessLevel;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;

    /// Find user by (normalized) email
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    /// Find the user currently linked to a Discord account
    async fn find_by_discord_id(&self, discord_user_id: &str) -> RepoResult<Option<User>>;

    /// Find the user owning a Stripe customer
    async fn find_by_stripe_customer_id(&self, customer_id: &str) -> RepoResult<Option<User>>;

    /// Return the user with this email, creating it when absent.
    ///
    /// The boolean is `true` when this call inserted the row. Concurrent
    /// callers with the same email never produce two rows.
    async fn find_or_create_by_email(&self, email: &str) -> RepoResult<(User, bool)>;

    /// Link a Discord account to the user, unlinking it from any other user
    async fn link_discord(&self, id: Uuid, discord_user_id: &str) -> RepoResult<User>;

    /// Set the access level
    async fn set_access_level(&self, id: Uuid, level: AccessLevel) -> RepoResult<()>;

    /// Record the Stripe customer id
    async fn set_stripe_customer_id(&self, id: Uuid, customer_id: &str) -> RepoResult<()>;
}

// ============================================================================
// Subscription Repository
// ============================================================================

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Most recently updated subscription for a user
    async fn find_latest_for_user(&self, user_id: Uuid) -> RepoResult<Option<Subscription>>;

    /// Find by the provider's subscription id
    async fn find_by_stripe_id(&self, stripe_subscription_id: &str)
        -> RepoResult<Option<Subscription>>;

    /// Insert, or update the row with the same provider subscription id
    async fn upsert(&self, subscription: &Subscription) -> RepoResult<Subscription>;
}

// ============================================================================
// Audit Log Repository
// ============================================================================

#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Append an entry
    async fn append(&self, entry: &AuditLog) -> RepoResult<()>;

    /// Latest entries for a user, newest first
    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> RepoResult<Vec<AuditLog>>;
}

// ============================================================================
// Webhook Event Repository
// ============================================================================

/// Seconds a `processing` claim is honored before a redelivery may take it over
pub const WEBHOOK_CLAIM_LEASE_SECS: i64 = 300;

/// Idempotency ledger for provider webhook deliveries
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Claim an event id for processing.
    ///
    /// Returns `false` when the id is already processed, or is being processed
    /// under a claim younger than [`WEBHOOK_CLAIM_LEASE_SECS`]. An older
    /// `processing` claim belongs to an attempt that died and is taken over.
    async fn claim(&self, event_id: &str, event_type: &str) -> RepoResult<bool>;

    /// Mark a claimed event as finished with the given outcome
    async fn complete(&self, event_id: &str, outcome: &str) -> RepoResult<()>;

    /// Drop a claim so a redelivery is processed again
    async fn release(&self, event_id: &str) -> RepoResult<()>;
}

// ============================================================================
// Health
// ============================================================================

/// Liveness check against the backing store
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn ping(&self) -> RepoResult<()>;
}
