//! Response DTOs for API endpoints

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use pgr_core::{AccessLevel, Subscription, User};

/// `POST /auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
    pub email: String,
}

/// `GET /auth/me`
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUserResponse {
    pub id: Uuid,
    pub email: String,
    pub access_level: AccessLevel,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for CurrentUserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            access_level: user.access_level,
            created_at: user.created_at,
        }
    }
}

/// `GET /access/status`
#[derive(Debug, Clone, Serialize)]
pub struct AccessStatusResponse {
    pub user_id: Uuid,
    pub access_level: AccessLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_plan: Option<String>,
}

impl AccessStatusResponse {
    pub fn new(user: &User, subscription: Option<&Subscription>) -> Self {
        Self {
            user_id: user.id,
            access_level: user.access_level,
            subscription_status: subscription.map(|s| s.status.clone()),
            subscription_plan: subscription.and_then(|s| s.plan.clone()),
        }
    }
}

/// Where to send the browser for Discord consent, and the state to pin in a cookie
#[derive(Debug, Clone)]
pub struct DiscordAuthorization {
    pub url: String,
    pub state: String,
}

/// Result of a completed Discord link
#[derive(Debug, Clone, Serialize)]
pub struct DiscordLinkResponse {
    pub user_id: Uuid,
    pub discord_user_id: String,
}

/// `POST /stripe/checkout`
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub id: String,
}

/// `POST /stripe/portal`
#[derive(Debug, Clone, Serialize)]
pub struct PortalResponse {
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookAckStatus {
    Processed,
    Duplicate,
    Ignored,
}

/// Body returned to Stripe once an event is acknowledged
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub status: WebhookAckStatus,
    pub event_id: String,
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl WebhookAck {
    pub fn new(status: WebhookAckStatus, event_id: &str, event_type: &str) -> Self {
        Self {
            received: true,
            status,
            event_id: event_id.to_string(),
            event_type: event_type.to_string(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Outcome string stored on the webhook event row
    pub fn outcome(&self) -> String {
        match (&self.status, &self.detail) {
            (WebhookAckStatus::Processed, _) => "processed".to_string(),
            (WebhookAckStatus::Duplicate, _) => "duplicate".to_string(),
            (WebhookAckStatus::Ignored, Some(detail)) => format!("ignored: {detail}"),
            (WebhookAckStatus::Ignored, None) => "ignored".to_string(),
        }
    }
}

/// `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub db: String,
}

impl HealthResponse {
    pub fn from_db(db_healthy: bool) -> Self {
        if db_healthy {
            Self {
                status: "ok".to_string(),
                db: "ok".to_string(),
            }
        } else {
            Self {
                status: "degraded".to_string(),
                db: "error".to_string(),
            }
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.db == "ok"
    }
}

/// `GET /version`
#[derive(Debug, Clone, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub environment: String,
    pub app_name: String,
}
