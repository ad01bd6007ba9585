//! Stripe webhook signature verification
//!
//! `Stripe-Signature: t=<unix timestamp>,v1=<hex hmac>[,v1=...]`
//!
//! The signed message is `"{t}.{raw body}"`, keyed with the endpoint secret
//! using HMAC-SHA256.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::event::WebhookEvent;

type HmacSha256 = Hmac<Sha256>;

/// Request header carrying the signature
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Why a signature header was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing Stripe-Signature header")]
    MissingHeader,

    #[error("malformed Stripe-Signature header")]
    Malformed,

    #[error("signature timestamp outside the tolerance window")]
    TimestampOutOfTolerance,

    #[error("no signature matches the payload")]
    Mismatch,
}

/// Webhook rejection: either the signature or the envelope is bad
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Webhook signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("Invalid webhook payload: {0}")]
    Payload(String),
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`
pub fn compute_signature(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Mismatch)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a signature header against the raw request body.
///
/// `now` is the current unix time; the header timestamp must be within
/// `tolerance_secs` of it in either direction.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = Some(value.parse().map_err(|_| SignatureError::Malformed)?),
            "v1" => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if candidates.is_empty() {
        return Err(SignatureError::Malformed);
    }
    if now.abs_diff(timestamp) > tolerance_secs.unsigned_abs() {
        return Err(SignatureError::TimestampOutOfTolerance);
    }

    let expected = compute_signature(secret, timestamp, payload)?;
    let matched = candidates
        .iter()
        .any(|candidate| bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())));

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Verifies and decodes incoming webhook deliveries for one endpoint secret
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>, tolerance_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs,
        }
    }

    /// Check the signature, then decode the event envelope
    pub fn verify(&self, payload: &[u8], header: Option<&str>) -> Result<WebhookEvent, WebhookError> {
        let header = header.ok_or(SignatureError::MissingHeader)?;
        verify_signature(
            payload,
            header,
            &self.secret,
            self.tolerance_secs,
            Utc::now().timestamp(),
        )?;
        serde_json::from_slice(payload).map_err(|e| WebhookError::Payload(e.to_string()))
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish_non_exhaustive()
    }
}
