//! Hosted checkout and customer portal sessions

use tracing::{info, instrument};
use validator::Validate;

use pgr_core::{AuditStatus, CheckoutSessionRequest, User};

use crate::dto::{CheckoutRequest, CheckoutResponse, PortalResponse};

use super::audit::{events, sources, AuditService};
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

pub struct CheckoutService<'a> {
    ctx: &'a ServiceContext,
    request_id: Option<&'a str>,
}

impl<'a> CheckoutService<'a> {
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

    /// Open a subscription checkout tagged with the Discord id
    ///
    /// The Discord account must already be linked to a user: the completion
    /// webhook resolves the payer through that link.
    #[instrument(skip(self, request), fields(plan = ?request.plan))]
    pub async fn create_checkout(&self, request: CheckoutRequest) -> ServiceResult<CheckoutResponse> {
        request.validate()?;
        let discord_user_id = request.discord_id.trim().to_string();

        let settings = self.ctx.billing_settings();
        let plan = settings
            .plan(request.plan.as_deref())
            .ok_or_else(|| ServiceError::validation("Unknown plan"))?;

        let user = self
            .ctx
            .user_repo()
            .find_by_discord_id(&discord_user_id)
            .await?
            .ok_or_else(|| {
                ServiceError::bad_request("Discord account is not linked (link Discord first)")
            })?;

        let session = self
            .ctx
            .billing()
            .create_checkout_session(&CheckoutSessionRequest {
                price_id: plan.price_id.clone(),
                plan: plan.label.clone(),
                discord_user_id: discord_user_id.clone(),
                customer_id: user.stripe_customer_id.clone(),
                success_url: request
                    .success_url
                    .unwrap_or_else(|| settings.success_url.clone()),
                cancel_url: request
                    .cancel_url
                    .unwrap_or_else(|| settings.cancel_url.clone()),
            })
            .await?;

        AuditService::new(self.ctx, self.request_id)
            .log(
                events::CHECKOUT_CREATED,
                sources::STRIPE,
                AuditStatus::Success,
                Some(user.id),
                Some(format!("session={} plan={}", session.id, plan.label)),
            )
            .await;
        info!(session_id = %session.id, user_id = %user.id, %discord_user_id, "Checkout session created");

        Ok(CheckoutResponse {
            checkout_url: session.url,
            id: session.id,
        })
    }

    /// Billing portal for the caller's Stripe customer
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn create_portal(&self, user: &User) -> ServiceResult<PortalResponse> {
        let customer_id = user
            .stripe_customer_id
            .as_deref()
            .ok_or_else(|| ServiceError::bad_request("No Stripe customer on file"))?;

        let session = self
            .ctx
            .billing()
            .create_portal_session(customer_id, &self.ctx.billing_settings().portal_return_url)
            .await?;

        Ok(PortalResponse { url: session.url })
    }
}
