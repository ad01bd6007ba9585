//! # pgr-service
//!
//! Application layer containing business logic, services, and DTOs.

pub mod dto;
pub mod services;

pub use services::{
    AccessService, AuthService, BillingSettings, CheckoutService, DiscordLinkService, HealthService,
    ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult, WebhookService,
};
