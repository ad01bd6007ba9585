//! Stripe REST client (form-encoded v1 API)

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use pgr_core::{BillingGateway, CheckoutSession, CheckoutSessionRequest, PortalSession, ProviderResult};

use crate::error::ProviderError;

const PROVIDER: &str = "stripe";

/// Stripe client holding the secret key
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeClient {
    pub fn new(
        http: reqwest::Client,
        secret_key: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            http,
            secret_key: secret_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post_form<T>(&self, path: &str, form: &[(&str, String)]) -> Result<T, ProviderError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http
            .post(format!("{}{}", self.api_base, path))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await
            .map_err(ProviderError::transport(PROVIDER))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(ProviderError::transport(PROVIDER))?;

        if !status.is_success() {
            let message = stripe_error_message(&body);
            warn!(status = status.as_u16(), path, message = %message, "Stripe request rejected");
            return Err(ProviderError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::Decode {
            provider: PROVIDER,
            message: e.to_string(),
        })
    }
}

/// Form body for `POST /checkout/sessions`.
///
/// The Discord id travels as `client_reference_id` and in both the session
/// and subscription metadata, so every later event can be correlated.
#[must_use]
pub fn checkout_form(request: &CheckoutSessionRequest) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("mode", "subscription".to_string()),
        ("line_items[0][price]", request.price_id.clone()),
        ("line_items[0][quantity]", "1".to_string()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
        ("client_reference_id", request.discord_user_id.clone()),
        ("metadata[discord_id]", request.discord_user_id.clone()),
        ("metadata[plan]", request.plan.clone()),
        ("subscription_data[metadata][discord_id]", request.discord_user_id.clone()),
        ("subscription_data[metadata][plan]", request.plan.clone()),
        ("allow_promotion_codes", "true".to_string()),
    ];
    if let Some(customer) = &request.customer_id {
        form.push(("customer", customer.clone()));
    }
    form
}

fn stripe_error_message(body: &str) -> String {
    serde_json::from_str::<StripeErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl BillingGateway for StripeClient {
    #[instrument(skip(self, request), fields(plan = %request.plan))]
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> ProviderResult<CheckoutSession> {
        let session: CheckoutSession = self
            .post_form("/checkout/sessions", &checkout_form(request))
            .await?;
        debug!(session_id = %session.id, "Checkout session created");
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> ProviderResult<PortalSession> {
        let form = [
            ("customer", customer_id.to_string()),
            ("return_url", return_url.to_string()),
        ];
        Ok(self.post_form("/billing_portal/sessions", &form).await?)
    }
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}
