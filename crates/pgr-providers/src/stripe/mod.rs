//! Stripe integration

mod client;
mod event;
mod signature;

pub use client::{checkout_form, StripeClient};
pub use event::{
    CheckoutSessionObject, InvoiceObject, StripeEvent, SubscriptionObject, WebhookEvent,
    DISCORD_ID_KEY, PLAN_KEY,
};
pub use signature::{
    compute_signature, verify_signature, SignatureError, WebhookError, WebhookVerifier,
    SIGNATURE_HEADER,
};
