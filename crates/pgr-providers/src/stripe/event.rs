//! Stripe webhook event envelope and the object shapes the backend reads

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::signature::WebhookError;

/// Metadata key holding the Discord user id
pub const DISCORD_ID_KEY: &str = "discord_id";
/// Metadata key holding the plan label
pub const PLAN_KEY: &str = "plan";

type Metadata = HashMap<String, String>;

/// Raw event as delivered: `{ id, type, data: { object } }`
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: Option<i64>,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: Value,
}

/// Events the backend acts on
#[derive(Debug, Clone)]
pub enum StripeEvent {
    CheckoutSessionCompleted(CheckoutSessionObject),
    InvoicePaid(InvoiceObject),
    /// `customer.subscription.created` and `customer.subscription.updated`
    SubscriptionUpserted(SubscriptionObject),
    SubscriptionDeleted(SubscriptionObject),
    Other(String),
}

impl WebhookEvent {
    /// Decode `data.object` according to the event type
    pub fn decode(&self) -> Result<StripeEvent, WebhookError> {
        let event = match self.event_type.as_str() {
            "checkout.session.completed" => StripeEvent::CheckoutSessionCompleted(self.object()?),
            "invoice.paid" => StripeEvent::InvoicePaid(self.object()?),
            "customer.subscription.created" | "customer.subscription.updated" => {
                StripeEvent::SubscriptionUpserted(self.object()?)
            }
            "customer.subscription.deleted" => StripeEvent::SubscriptionDeleted(self.object()?),
            other => StripeEvent::Other(other.to_string()),
        };
        Ok(event)
    }

    fn object<T: DeserializeOwned>(&self) -> Result<T, WebhookError> {
        T::deserialize(&self.data.object).map_err(|e| {
            WebhookError::Payload(format!("{} object: {}", self.event_type, e))
        })
    }
}

/// `checkout.session`
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    #[serde(default)]
    pub client_reference_id: Option<String>,
    #[serde(default, deserialize_with = "expandable_id")]
    pub customer: Option<String>,
    #[serde(default, deserialize_with = "expandable_id")]
    pub subscription: Option<String>,
    #[serde(default, deserialize_with = "nullable_metadata")]
    pub metadata: Metadata,
}

impl CheckoutSessionObject {
    /// `client_reference_id` first, then `metadata.discord_id`
    #[must_use]
    pub fn discord_id(&self) -> Option<&str> {
        non_empty(self.client_reference_id.as_deref())
            .or_else(|| non_empty(self.metadata.get(DISCORD_ID_KEY).map(String::as_str)))
    }

    #[must_use]
    pub fn plan(&self) -> Option<&str> {
        non_empty(self.metadata.get(PLAN_KEY).map(String::as_str))
    }
}

/// `subscription`
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    #[serde(default, deserialize_with = "expandable_id")]
    pub customer: Option<String>,
    pub status: String,
    #[serde(default, deserialize_with = "nullable_metadata")]
    pub metadata: Metadata,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

impl SubscriptionObject {
    #[must_use]
    pub fn discord_id(&self) -> Option<&str> {
        non_empty(self.metadata.get(DISCORD_ID_KEY).map(String::as_str))
    }

    #[must_use]
    pub fn plan(&self) -> Option<&str> {
        non_empty(self.metadata.get(PLAN_KEY).map(String::as_str))
    }

    #[must_use]
    pub fn period_start(&self) -> Option<DateTime<Utc>> {
        self.current_period_start.and_then(|t| DateTime::from_timestamp(t, 0))
    }

    #[must_use]
    pub fn period_end(&self) -> Option<DateTime<Utc>> {
        self.current_period_end.and_then(|t| DateTime::from_timestamp(t, 0))
    }
}

/// `invoice`
///
/// Subscription metadata is copied onto the invoice under
/// `subscription_details` (older API versions) or
/// `parent.subscription_details` (newer ones).
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    pub id: String,
    #[serde(default, deserialize_with = "expandable_id")]
    pub customer: Option<String>,
    #[serde(default, deserialize_with = "expandable_id")]
    pub subscription: Option<String>,
    #[serde(default, deserialize_with = "nullable_metadata")]
    pub metadata: Metadata,
    #[serde(default)]
    pub subscription_details: Option<SubscriptionDetails>,
    #[serde(default)]
    pub parent: Option<InvoiceParent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionDetails {
    #[serde(default, deserialize_with = "expandable_id")]
    pub subscription: Option<String>,
    #[serde(default, deserialize_with = "nullable_metadata")]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceParent {
    #[serde(default)]
    pub subscription_details: Option<SubscriptionDetails>,
}

impl InvoiceObject {
    fn metadata_value(&self, key: &str) -> Option<&str> {
        let nested = self
            .parent
            .as_ref()
            .and_then(|p| p.subscription_details.as_ref());
        [nested, self.subscription_details.as_ref()]
            .into_iter()
            .flatten()
            .map(|details| &details.metadata)
            .chain(std::iter::once(&self.metadata))
            .find_map(|metadata| non_empty(metadata.get(key).map(String::as_str)))
    }

    #[must_use]
    pub fn discord_id(&self) -> Option<&str> {
        self.metadata_value(DISCORD_ID_KEY)
    }

    #[must_use]
    pub fn plan(&self) -> Option<&str> {
        self.metadata_value(PLAN_KEY)
    }

    /// Subscription id from the top-level field or the parent details
    #[must_use]
    pub fn subscription_id(&self) -> Option<&str> {
        let nested = self
            .parent
            .as_ref()
            .and_then(|p| p.subscription_details.as_ref())
            .and_then(|d| d.subscription.as_deref());
        non_empty(self.subscription.as_deref()).or_else(|| non_empty(nested))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Stripe sends either an id string or, when expanded, the full object
fn expandable_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(id)) => Some(id),
        Some(Value::Object(map)) => map.get("id").and_then(Value::as_str).map(str::to_string),
        _ => None,
    })
}

/// `metadata` may be `null`; non-string values are dropped
fn nullable_metadata<'de, D>(deserializer: D) -> Result<Metadata, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<HashMap<String, Value>>::deserialize(deserializer)?;
    Ok(value
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| match v {
            Value::String(s) => Some((k, s)),
            _ => None,
        })
        .collect())
}
