//! # pgr-providers
//!
//! HTTP clients for the two outside services the backend talks to:
//!
//! - **Stripe**: hosted checkout and billing portal sessions, plus webhook
//!   signature verification and event decoding.
//! - **Discord**: the OAuth2 authorization-code flow and the bot endpoint
//!   that adds or removes the premium role.
//!
//! The clients implement the gateway traits from `pgr-core`, so services can
//! be exercised with in-memory fakes.

pub mod discord;
pub mod error;
pub mod http;
pub mod stripe;

pub use discord::{DiscordOAuthClient, DiscordRoleClient};
pub use error::ProviderError;
pub use http::build_http_client;
pub use stripe::{
    StripeClient, StripeEvent, WebhookError, WebhookEvent, WebhookVerifier, SIGNATURE_HEADER,
};
