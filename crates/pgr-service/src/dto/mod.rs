//! Data transfer objects for API requests and responses
//!
//! - Request DTOs with validation for API inputs
//! - Response DTOs for serializing API outputs, with `From` conversions
//!   from the domain entities

pub mod requests;
pub mod responses;

pub use requests::{CheckoutRequest, DiscordCallbackQuery, LoginRequest};
pub use responses::{
    AccessStatusResponse, CheckoutResponse, CurrentUserResponse, DiscordAuthorization,
    DiscordLinkResponse, HealthResponse, LoginResponse, PortalResponse, VersionResponse,
    WebhookAck, WebhookAckStatus,
};
