//! Stripe webhook processing
//!
//! Every delivery is verified, decoded and then claimed by event id before
//! anything is written, so a redelivered event mutates state at most once.
//!
//! | failure                                      | answer                     |
//! |----------------------------------------------|----------------------------|
//! | bad signature or envelope                    | 400, nothing claimed       |
//! | no correlation id, unknown user, other type  | 200 `ignored`, audited     |
//! | subscription already canceled or expired     | 200 `ignored`, audited     |
//! | Discord role call fails                      | 200 `processed`, audited   |
//! | database failure                             | error, claim released      |

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use pgr_core::{AccessEffect, AccessLevel, AuditStatus, DomainError, Subscription, User};
use pgr_providers::stripe::{InvoiceObject, SubscriptionObject};
use pgr_providers::{StripeEvent, WebhookEvent};

use crate::dto::{WebhookAck, WebhookAckStatus};

use super::audit::{events, sources, AuditService};
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// How an event's user was looked up
enum Resolution {
    Found(User),
    /// Neither a Discord id nor a customer id on the event
    NoCorrelation,
    /// Identifiers present but no local user matches
    Unknown,
}

pub struct WebhookService<'a> {
    ctx: &'a ServiceContext,
    request_id: Option<&'a str>,
}

impl<'a> WebhookService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self {
            ctx,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: Option<&'a str>) -> Self {
        self.request_id = request_id;
        self
    }

    fn audit(&self) -> AuditService<'_> {
        AuditService::new(self.ctx, self.request_id)
    }

    /// Verify, deduplicate and apply one delivery
    #[instrument(skip_all)]
    pub async fn handle(&self, payload: &[u8], signature: Option<&str>) -> ServiceResult<WebhookAck> {
        let envelope = self
            .ctx
            .webhook_verifier()
            .verify(payload, signature)
            .map_err(|e| {
                warn!(error = %e, "Rejected Stripe webhook");
                ServiceError::bad_request(e.to_string())
            })?;
        let event = envelope
            .decode()
            .map_err(|e| ServiceError::bad_request(e.to_string()))?;

        let repo = self.ctx.webhook_event_repo();
        if !repo.claim(&envelope.id, &envelope.event_type).await? {
            info!(event_id = %envelope.id, "Duplicate webhook delivery");
            return Ok(WebhookAck::new(
                WebhookAckStatus::Duplicate,
                &envelope.id,
                &envelope.event_type,
            ));
        }

        let result = match self.dispatch(&envelope, event).await {
            Ok(ack) => repo
                .complete(&envelope.id, &ack.outcome())
                .await
                .map(|()| ack)
                .map_err(ServiceError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(ack) => {
                info!(event_id = %envelope.id, event_type = %envelope.event_type, outcome = %ack.outcome(), "Webhook processed");
                Ok(ack)
            }
            Err(e) => {
                warn!(event_id = %envelope.id, error = %e, "Webhook failed, releasing claim for redelivery");
                if let Err(release_err) = repo.release(&envelope.id).await {
                    warn!(event_id = %envelope.id, error = %release_err, "Failed to release webhook claim");
                }
                Err(e)
            }
        }
    }

    async fn dispatch(&self, envelope: &WebhookEvent, event: StripeEvent) -> ServiceResult<WebhookAck> {
        match event {
            StripeEvent::CheckoutSessionCompleted(session) => {
                self.activate(envelope, session.discord_id(), session.customer.as_deref(), None)
                    .await
            }
            StripeEvent::InvoicePaid(invoice) => {
                let mirror = invoice_mirror(&invoice);
                self.activate(envelope, invoice.discord_id(), invoice.customer.as_deref(), mirror)
                    .await
            }
            StripeEvent::SubscriptionUpserted(sub) => self.sync_subscription(envelope, &sub, false).await,
            StripeEvent::SubscriptionDeleted(sub) => self.sync_subscription(envelope, &sub, true).await,
            StripeEvent::Other(_) => self.ignore(envelope, "unhandled event type").await,
        }
    }

    /// Payment completed or renewed: premium on, role granted
    async fn activate(
        &self,
        envelope: &WebhookEvent,
        discord_id: Option<&str>,
        customer_id: Option<&str>,
        mirror: Option<Subscription>,
    ) -> ServiceResult<WebhookAck> {
        let user = match self.resolve_user(discord_id, customer_id).await? {
            Resolution::Found(user) => user,
            unresolved => return self.ignore_unresolved(envelope, unresolved).await,
        };

        let mirrored_id = mirror
            .as_ref()
            .and_then(|m| m.stripe_subscription_id.as_deref());
        if let Some(stripe_id) = mirrored_id {
            if self.has_ended(stripe_id).await? {
                return self.ignore(envelope, "subscription already ended").await;
            }
        }

        self.capture_customer(&user, customer_id).await?;
        if let Some(mut mirror) = mirror {
            mirror.user_id = user.id;
            self.upsert_mirror(&mirror).await?;
        }
        self.grant(&user, discord_id).await?;

        Ok(WebhookAck::new(WebhookAckStatus::Processed, &envelope.id, &envelope.event_type)
            .with_detail("premium granted"))
    }

    /// Subscription created, updated or deleted: mirror it, then apply its access effect
    async fn sync_subscription(
        &self,
        envelope: &WebhookEvent,
        sub: &SubscriptionObject,
        deleted: bool,
    ) -> ServiceResult<WebhookAck> {
        let customer_id = sub.customer.as_deref();
        let user = match self.resolve_user(sub.discord_id(), customer_id).await? {
            Resolution::Found(user) => user,
            unresolved => return self.ignore_unresolved(envelope, unresolved).await,
        };

        // Deliveries are unordered: an update racing behind the deletion must not revive it
        if !deleted && self.has_ended(&sub.id).await? {
            return self.ignore(envelope, "subscription already ended").await;
        }

        self.capture_customer(&user, customer_id).await?;

        let mut mirror = Subscription::new(user.id, sub.status.clone());
        mirror.stripe_subscription_id = Some(sub.id.clone());
        mirror.stripe_customer_id = sub.customer.clone();
        mirror.plan = sub.plan().map(str::to_string);
        mirror.current_period_start = sub.period_start();
        mirror.current_period_end = sub.period_end();
        self.upsert_mirror(&mirror).await?;

        let effect = if deleted {
            AccessEffect::Revoke
        } else {
            mirror.access_effect()
        };
        let detail = match effect {
            AccessEffect::Grant => {
                self.grant(&user, sub.discord_id()).await?;
                "premium granted".to_string()
            }
            AccessEffect::Revoke => {
                self.revoke(&user, sub.discord_id()).await?;
                "premium revoked".to_string()
            }
            AccessEffect::RecordOnly => format!("status recorded: {}", sub.status),
        };

        Ok(WebhookAck::new(WebhookAckStatus::Processed, &envelope.id, &envelope.event_type)
            .with_detail(detail))
    }

    /// Discord id from the event first, then the Stripe customer id
    async fn resolve_user(
        &self,
        discord_id: Option<&str>,
        customer_id: Option<&str>,
    ) -> ServiceResult<Resolution> {
        let users = self.ctx.user_repo();
        if let Some(discord_id) = discord_id {
            if let Some(user) = users.find_by_discord_id(discord_id).await? {
                return Ok(Resolution::Found(user));
            }
        }
        if let Some(customer_id) = customer_id {
            if let Some(user) = users.find_by_stripe_customer_id(customer_id).await? {
                return Ok(Resolution::Found(user));
            }
        }
        if discord_id.is_none() && customer_id.is_none() {
            Ok(Resolution::NoCorrelation)
        } else {
            Ok(Resolution::Unknown)
        }
    }

    async fn has_ended(&self, stripe_subscription_id: &str) -> ServiceResult<bool> {
        let mirror = self
            .ctx
            .subscription_repo()
            .find_by_stripe_id(stripe_subscription_id)
            .await?;
        Ok(mirror.as_ref().is_some_and(Subscription::has_ended))
    }

    async fn capture_customer(&self, user: &User, customer_id: Option<&str>) -> ServiceResult<()> {
        if let Some(customer_id) = customer_id {
            if user.stripe_customer_id.as_deref() != Some(customer_id) {
                self.ctx
                    .user_repo()
                    .set_stripe_customer_id(user.id, customer_id)
                    .await?;
            }
        }
        Ok(())
    }

    async fn upsert_mirror(&self, mirror: &Subscription) -> ServiceResult<()> {
        match self.ctx.subscription_repo().upsert(mirror).await {
            Ok(_) => Ok(()),
            // Never move a subscription between users; keep processing the access change
            Err(DomainError::SubscriptionOwnerMismatch) => {
                warn!(user_id = %mirror.user_id, stripe_subscription_id = ?mirror.stripe_subscription_id, "Subscription owned by another user");
                self.audit()
                    .log(
                        events::SUBSCRIPTION_SYNCED,
                        sources::STRIPE,
                        AuditStatus::Failed,
                        Some(mirror.user_id),
                        Some("subscription belongs to another user".to_string()),
                    )
                    .await;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn grant(&self, user: &User, event_discord_id: Option<&str>) -> ServiceResult<()> {
        self.ctx
            .user_repo()
            .set_access_level(user.id, AccessLevel::Premium)
            .await?;
        if !user.is_premium() {
            self.audit()
                .success(events::PREMIUM_GRANTED, sources::STRIPE, Some(user.id))
                .await;
        }

        if let Some(discord_id) = role_target(user, event_discord_id) {
            let result = self.ctx.premium_roles().grant_premium_role(discord_id).await;
            self.record_role_call(events::DISCORD_ROLE_GRANT, user.id, discord_id, result)
                .await;
        } else {
            debug!(user_id = %user.id, "No Discord account linked, skipping role grant");
        }
        Ok(())
    }

    async fn revoke(&self, user: &User, event_discord_id: Option<&str>) -> ServiceResult<()> {
        self.ctx
            .user_repo()
            .set_access_level(user.id, AccessLevel::Free)
            .await?;
        if user.is_premium() {
            self.audit()
                .success(events::PREMIUM_REVOKED, sources::STRIPE, Some(user.id))
                .await;
        }

        if let Some(discord_id) = role_target(user, event_discord_id) {
            let result = self.ctx.premium_roles().revoke_premium_role(discord_id).await;
            self.record_role_call(events::DISCORD_ROLE_REVOKE, user.id, discord_id, result)
                .await;
        }
        Ok(())
    }

    /// Role changes are best-effort: failures are audited, not propagated
    async fn record_role_call(
        &self,
        event_type: &str,
        user_id: Uuid,
        discord_id: &str,
        result: Result<(), DomainError>,
    ) {
        let (status, details) = match result {
            Ok(()) => (AuditStatus::Success, format!("discord_id={discord_id}")),
            Err(e) => {
                warn!(%user_id, discord_id, error = %e, event_type, "Discord role update failed");
                (AuditStatus::Failed, format!("discord_id={discord_id} error={e}"))
            }
        };
        self.audit()
            .log(event_type, sources::DISCORD, status, Some(user_id), Some(details))
            .await;
    }

    async fn ignore_unresolved(
        &self,
        envelope: &WebhookEvent,
        resolution: Resolution,
    ) -> ServiceResult<WebhookAck> {
        let reason = match resolution {
            Resolution::NoCorrelation => "no correlation id",
            _ => "unknown user",
        };
        self.ignore(envelope, reason).await
    }

    async fn ignore(&self, envelope: &WebhookEvent, reason: &str) -> ServiceResult<WebhookAck> {
        info!(event_id = %envelope.id, event_type = %envelope.event_type, reason, "Webhook ignored");
        self.audit()
            .log(
                events::WEBHOOK_IGNORED,
                sources::STRIPE,
                AuditStatus::Ignored,
                None,
                Some(format!("{} {}: {}", envelope.event_type, envelope.id, reason)),
            )
            .await;
        Ok(WebhookAck::new(WebhookAckStatus::Ignored, &envelope.id, &envelope.event_type)
            .with_detail(reason))
    }
}

/// The linked account wins over the id carried on the event
fn role_target<'u>(user: &'u User, event_discord_id: Option<&'u str>) -> Option<&'u str> {
    user.discord_user_id.as_deref().or(event_discord_id)
}

/// A paid invoice keeps its subscription marked active
fn invoice_mirror(invoice: &InvoiceObject) -> Option<Subscription> {
    let stripe_id = invoice.subscription_id()?;
    let mut mirror = Subscription::new(Uuid::nil(), "active");
    mirror.stripe_subscription_id = Some(stripe_id.to_string());
    mirror.stripe_customer_id = invoice.customer.clone();
    mirror.plan = invoice.plan().map(str::to_string);
    Some(mirror)
}
