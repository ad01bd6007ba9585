//! Provider error types

use pgr_core::DomainError;

/// Errors from outbound provider calls
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status; `message` is the provider's own explanation
    #[error("{provider} returned {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("{provider} response could not be decoded: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },

    #[error("Invalid {0}")]
    InvalidInput(String),
}

impl ProviderError {
    pub(crate) fn transport(provider: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Transport { provider, source }
    }
}

impl From<ProviderError> for DomainError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Transport { provider, source } => {
                DomainError::provider(provider, None, source.to_string())
            }
            ProviderError::Api {
                provider,
                status,
                message,
            } => DomainError::provider(provider, Some(status), message),
            ProviderError::Decode { provider, message } => {
                DomainError::provider(provider, None, message)
            }
            ProviderError::InvalidInput(what) => DomainError::ValidationError(format!("Invalid {what}")),
        }
    }
}
