//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Invalid access level: {0}")]
    InvalidAccessLevel(String),

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Email already in use")]
    EmailAlreadyExists,

    #[error("Stripe subscription already belongs to another user")]
    SubscriptionOwnerMismatch,

    // =========================================================================
    // Outside providers
    // =========================================================================
    #[error("{provider} error: {message}")]
    ProviderError {
        provider: &'static str,
        status: Option<u16>,
        message: String,
    },

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Build a provider failure
    pub fn provider(provider: &'static str, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::ProviderError {
            provider,
            status,
            message: message.into(),
        }
    }

    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "UNKNOWN_USER",
            Self::SubscriptionNotFound(_) => "UNKNOWN_SUBSCRIPTION",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InvalidAccessLevel(_) => "INVALID_ACCESS_LEVEL",
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::SubscriptionOwnerMismatch => "SUBSCRIPTION_OWNER_MISMATCH",
            Self::ProviderError { .. } => "PROVIDER_ERROR",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound(_) | Self::SubscriptionNotFound(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_) | Self::InvalidEmail | Self::InvalidAccessLevel(_)
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::EmailAlreadyExists | Self::SubscriptionOwnerMismatch)
    }

    /// Check if this came from an outside provider
    pub fn is_provider(&self) -> bool {
        matches!(self, Self::ProviderError { .. })
    }
}
