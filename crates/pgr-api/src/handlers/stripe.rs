//! Stripe handlers
//!
//! Hosted checkout, billing portal and the webhook endpoint.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::HeaderMap,
    response::Redirect,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use pgr_providers::SIGNATURE_HEADER;
use pgr_service::dto::{CheckoutRequest, CheckoutResponse, PortalResponse, WebhookAck};
use pgr_service::{CheckoutService, WebhookService};
use serde::Deserialize;

use crate::cookies::DISCORD_ID;
use crate::extractors::{AuthUser, RequestId, ValidatedJson};
use crate::response::{ApiError, ApiResult};
use crate::state::AppState;

/// Query accepted by the browser checkout link
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutQuery {
    pub discord_id: Option<String>,
    pub plan: Option<String>,
}

/// Create a checkout session
///
/// POST /stripe/checkout (also POST /stripe/create-checkout-session)
pub async fn create_checkout(
    State(state): State<AppState>,
    request_id: RequestId,
    ValidatedJson(request): ValidatedJson<CheckoutRequest>,
) -> ApiResult<Json<CheckoutResponse>> {
    let response = CheckoutService::new(state.service_context())
        .with_request_id(request_id.as_deref())
        .create_checkout(request)
        .await?;
    Ok(Json(response))
}

/// Create a checkout session and send the browser to it
///
/// GET /stripe/checkout
///
/// The Discord id comes from the query, or from the cookie left by the
/// Discord callback.
pub async fn checkout_redirect(
    State(state): State<AppState>,
    request_id: RequestId,
    jar: CookieJar,
    query: Result<Query<CheckoutQuery>, QueryRejection>,
) -> ApiResult<Redirect> {
    let Query(query) = query.map_err(|e| ApiError::invalid_query(e.body_text()))?;

    let discord_id = query
        .discord_id
        .filter(|id| !id.trim().is_empty())
        .or_else(|| jar.get(DISCORD_ID).map(|c| c.value().to_string()))
        .ok_or_else(|| ApiError::invalid_query("discord_id is required (link Discord first)"))?;

    let request = CheckoutRequest {
        discord_id,
        plan: query.plan,
        ..CheckoutRequest::default()
    };
    let response = CheckoutService::new(state.service_context())
        .with_request_id(request_id.as_deref())
        .create_checkout(request)
        .await?;

    Ok(Redirect::to(&response.checkout_url))
}

/// Open the billing portal for the caller
///
/// POST /stripe/portal
pub async fn create_portal(
    State(state): State<AppState>,
    request_id: RequestId,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<PortalResponse>> {
    let response = CheckoutService::new(state.service_context())
        .with_request_id(request_id.as_deref())
        .create_portal(&user)
        .await?;
    Ok(Json(response))
}

/// Receive a Stripe event
///
/// POST /stripe/webhook
///
/// The raw body is needed for signature verification, so it is not parsed
/// by an extractor.
pub async fn webhook(
    State(state): State<AppState>,
    request_id: RequestId,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let ack = WebhookService::new(state.service_context())
        .with_request_id(request_id.as_deref())
        .handle(&body, signature)
        .await?;
    Ok(Json(ack))
}
