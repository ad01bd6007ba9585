//! Shared outbound HTTP client

use std::time::Duration;

use crate::error::ProviderError;

/// Build the client used for every provider call.
///
/// Redirects are not followed; provider APIs answer directly.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(concat!("pgr-backend/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ProviderError::transport("http"))
}
