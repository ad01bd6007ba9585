//! Discord OAuth2 authorization-code flow

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{instrument, warn};

use pgr_common::DiscordConfig;
use pgr_core::{DiscordOAuthGateway, DiscordProfile, ProviderResult};

use super::PROVIDER;
use crate::error::ProviderError;

const SCOPES: &str = "identify email";

/// OAuth client for the "link your Discord account" flow
#[derive(Clone)]
pub struct DiscordOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    authorize_endpoint: Url,
    token_endpoint: String,
    profile_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl DiscordOAuthClient {
    /// Fails when the configured API base is not a valid URL
    pub fn new(http: reqwest::Client, config: &DiscordConfig) -> Result<Self, ProviderError> {
        let base = config.api_base.trim_end_matches('/');
        let authorize_endpoint = Url::parse(&format!("{base}/oauth2/authorize"))
            .map_err(|e| ProviderError::InvalidInput(format!("Discord API base: {e}")))?;

        Ok(Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            authorize_endpoint,
            token_endpoint: format!("{base}/oauth2/token"),
            profile_endpoint: format!("{base}/users/@me"),
        })
    }

    async fn read_body(
        response: reqwest::Response,
        step: &'static str,
    ) -> Result<String, ProviderError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(ProviderError::transport(PROVIDER))?;

        if status != reqwest::StatusCode::OK {
            warn!(status = status.as_u16(), step, "Discord OAuth call failed");
            return Err(ProviderError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                message: format!("{step} failed: {body}"),
            });
        }
        Ok(body)
    }
}

fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::Decode {
        provider: PROVIDER,
        message: e.to_string(),
    })
}

#[async_trait]
impl DiscordOAuthGateway for DiscordOAuthClient {
    fn authorize_url(&self, state: &str) -> String {
        let mut url = self.authorize_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", SCOPES)
            .append_pair("state", state)
            .append_pair("prompt", "consent");
        url.into()
    }

    #[instrument(skip_all)]
    async fn exchange_code(&self, code: &str) -> ProviderResult<String> {
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(ProviderError::transport(PROVIDER))?;

        let body = Self::read_body(response, "Discord token exchange").await?;
        let token: TokenResponse = decode(&body)?;
        Ok(token.access_token)
    }

    #[instrument(skip_all)]
    async fn fetch_profile(&self, access_token: &str) -> ProviderResult<DiscordProfile> {
        let response = self
            .http
            .get(&self.profile_endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(ProviderError::transport(PROVIDER))?;

        let body = Self::read_body(response, "Discord /users/@me").await?;
        Ok(decode(&body)?)
    }
}

impl std::fmt::Debug for DiscordOAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordOAuthClient")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}
