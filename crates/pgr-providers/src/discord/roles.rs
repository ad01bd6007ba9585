//! Discord bot API: premium role membership

use async_trait::async_trait;
use reqwest::Method;
use tracing::{info, instrument, warn};

use pgr_common::DiscordConfig;
use pgr_core::{is_discord_snowflake, PremiumRoleGateway, ProviderResult};

use super::PROVIDER;
use crate::error::ProviderError;

const AUDIT_REASON_HEADER: &str = "X-Audit-Log-Reason";

/// Adds or removes the premium role with the bot token
#[derive(Clone)]
pub struct DiscordRoleClient {
    http: reqwest::Client,
    bot_token: String,
    guild_id: String,
    role_id: String,
    api_base: String,
}

impl DiscordRoleClient {
    pub fn new(http: reqwest::Client, config: &DiscordConfig) -> Self {
        Self {
            http,
            bot_token: config.bot_token.clone(),
            guild_id: config.guild_id.clone(),
            role_id: config.premium_role_id.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    fn member_role_url(&self, discord_user_id: &str) -> String {
        format!(
            "{}/v10/guilds/{}/members/{}/roles/{}",
            self.api_base, self.guild_id, discord_user_id, self.role_id
        )
    }

    async fn send(&self, method: Method, discord_user_id: &str, reason: &str) -> Result<(), ProviderError> {
        if !is_discord_snowflake(discord_user_id) {
            return Err(ProviderError::InvalidInput(format!(
                "Discord user id: {discord_user_id:?}"
            )));
        }

        let response = self
            .http
            .request(method.clone(), self.member_role_url(discord_user_id))
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.bot_token))
            .header(AUDIT_REASON_HEADER, reason)
            .send()
            .await
            .map_err(ProviderError::transport(PROVIDER))?;

        let status = response.status();
        if status.is_success() {
            info!(%method, discord_user_id, "Premium role updated");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(%method, discord_user_id, status = status.as_u16(), "Premium role update failed");
        Err(ProviderError::Api {
            provider: PROVIDER,
            status: status.as_u16(),
            message: body,
        })
    }
}

#[async_trait]
impl PremiumRoleGateway for DiscordRoleClient {
    #[instrument(skip(self))]
    async fn grant_premium_role(&self, discord_user_id: &str) -> ProviderResult<()> {
        Ok(self
            .send(Method::PUT, discord_user_id, "Premium subscription active")
            .await?)
    }

    #[instrument(skip(self))]
    async fn revoke_premium_role(&self, discord_user_id: &str) -> ProviderResult<()> {
        Ok(self
            .send(Method::DELETE, discord_user_id, "Premium subscription ended")
            .await?)
    }
}

impl std::fmt::Debug for DiscordRoleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordRoleClient")
            .field("guild_id", &self.guild_id)
            .field("role_id", &self.role_id)
            .finish_non_exhaustive()
    }
}
