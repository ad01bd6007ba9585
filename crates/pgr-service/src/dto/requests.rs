//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use serde::Deserialize;
use validator::{Validate, ValidationError};

use pgr_core::is_discord_snowflake;

fn discord_snowflake(value: &str) -> Result<(), ValidationError> {
    if is_discord_snowflake(value.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new("discord_id")
            .with_message("discord_id must be a numeric Discord user id".into()))
    }
}

/// Email login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Hosted checkout request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(custom(function = "discord_snowflake"))]
    pub discord_id: String,

    /// Plan label; the default plan when absent
    pub plan: Option<String>,

    #[validate(url(message = "success_url must be an absolute URL"))]
    pub success_url: Option<String>,

    #[validate(url(message = "cancel_url must be an absolute URL"))]
    pub cancel_url: Option<String>,
}

/// Query string Discord appends to the OAuth redirect
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscordCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set when the user denied consent
    pub error: Option<String>,
}
