//! Business logic services
//!
//! Services borrow a [`ServiceContext`] and are cheap to construct per request.

pub mod access;
pub mod audit;
pub mod auth;
pub mod checkout;
pub mod context;
pub mod discord;
pub mod error;
pub mod health;
pub mod webhook;

#[cfg(test)]
pub(crate) mod test_support;

pub use access::AccessService;
pub use audit::AuditService;
pub use auth::AuthService;
pub use checkout::CheckoutService;
pub use context::{BillingSettings, ServiceContext, ServiceContextBuilder};
pub use discord::DiscordLinkService;
pub use error::{ServiceError, ServiceResult};
pub use health::HealthService;
pub use webhook::WebhookService;
