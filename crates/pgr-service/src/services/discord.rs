//! Discord account linking (OAuth2 authorization-code flow)

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use tracing::{info, instrument, warn};

use pgr_core::{is_discord_snowflake, normalize_email, DomainError};

use crate::dto::{DiscordAuthorization, DiscordCallbackQuery, DiscordLinkResponse};

use super::audit::{events, sources, AuditService};
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

const STATE_BYTES: usize = 24;

/// Random URL-safe anti-forgery token
fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Provider refusals during the OAuth dance are the caller's problem (400);
/// transport failures stay provider errors (502).
fn oauth_failure(err: DomainError) -> ServiceError {
    match err {
        DomainError::ProviderError {
            status: Some(_),
            message,
            ..
        } => ServiceError::bad_request(message),
        other => ServiceError::Domain(other),
    }
}

pub struct DiscordLinkService<'a> {
    ctx: &'a ServiceContext,
    request_id: Option<&'a str>,
}

impl<'a> DiscordLinkService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self {
            ctx,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: Option<&'a str>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Fresh state and the consent URL carrying it
    pub fn start(&self) -> DiscordAuthorization {
        let state = generate_state();
        DiscordAuthorization {
            url: self.ctx.discord_oauth().authorize_url(&state),
            state,
        }
    }

    /// Finish the flow: check state, exchange the code, link the profile
    #[instrument(skip_all)]
    pub async fn callback(
        &self,
        query: DiscordCallbackQuery,
        cookie_state: Option<&str>,
    ) -> ServiceResult<DiscordLinkResponse> {
        if let Some(error) = query.error {
            return Err(ServiceError::bad_request(format!(
                "Discord authorization failed: {error}"
            )));
        }

        let state = query.state.unwrap_or_default();
        match cookie_state {
            Some(expected) if !expected.is_empty() && expected == state => {}
            _ => {
                warn!("Discord callback state mismatch");
                return Err(ServiceError::unauthorized("Invalid state"));
            }
        }

        let code = query
            .code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ServiceError::bad_request("Missing authorization code"))?;

        let oauth = self.ctx.discord_oauth();
        let access_token = oauth.exchange_code(&code).await.map_err(oauth_failure)?;
        let profile = oauth
            .fetch_profile(&access_token)
            .await
            .map_err(oauth_failure)?;

        let discord_user_id = profile
            .id
            .filter(|id| is_discord_snowflake(id))
            .ok_or_else(|| ServiceError::bad_request("Discord user id missing"))?;
        let email = profile
            .email
            .map(|e| normalize_email(&e))
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                ServiceError::bad_request("Discord email missing (ensure scope includes email)")
            })?;

        let (user, created) = self.ctx.user_repo().find_or_create_by_email(&email).await?;
        let user = self
            .ctx
            .user_repo()
            .link_discord(user.id, &discord_user_id)
            .await?;

        let audit = AuditService::new(self.ctx, self.request_id);
        if created {
            audit
                .success(events::USER_CREATED, sources::DISCORD, Some(user.id))
                .await;
        }
        audit
            .success(events::DISCORD_LINKED, sources::DISCORD, Some(user.id))
            .await;
        info!(user_id = %user.id, %discord_user_id, "Discord account linked");

        Ok(DiscordLinkResponse {
            user_id: user.id,
            discord_user_id,
        })
    }
}
