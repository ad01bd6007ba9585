//! Authentication service
//!
//! Passwordless email login issuing bearer tokens, and token resolution.

use tracing::{info, instrument, warn};
use validator::Validate;

use pgr_common::AppError;
use pgr_core::{normalize_email, User};

use crate::dto::{LoginRequest, LoginResponse};

use super::audit::{events, sources, AuditService};
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
    request_id: Option<&'a str>,
}

impl<'a> AuthService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self {
            ctx,
            request_id: None,
        }
    }

    /// Tag audit entries with the HTTP request id
    pub fn with_request_id(mut self, request_id: Option<&'a str>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Log in by email, creating the user on first sight
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<LoginResponse> {
        let request = LoginRequest {
            email: normalize_email(&request.email),
        };
        request.validate()?;
        let email = request.email;

        let (user, created) = self.ctx.user_repo().find_or_create_by_email(&email).await?;
        let audit = AuditService::new(self.ctx, self.request_id);
        if created {
            info!(user_id = %user.id, "User created");
            audit.success(events::USER_CREATED, sources::AUTH, Some(user.id)).await;
        }

        let token = self
            .ctx
            .jwt_service()
            .issue_token(user.id, &user.email)?;

        audit.success(events::USER_LOGIN, sources::AUTH, Some(user.id)).await;
        info!(user_id = %user.id, "User logged in");

        Ok(LoginResponse {
            token,
            user_id: user.id,
            email: user.email,
        })
    }

    /// Resolve a bearer token to its user
    ///
    /// Missing, malformed, expired and orphaned tokens are all unauthorized.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, token: &str) -> ServiceResult<User> {
        let claims = self.ctx.jwt_service().decode_token(token)?;
        let user_id = claims.user_id()?;

        self.ctx
            .user_repo()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| {
                warn!(%user_id, "Token subject no longer exists");
                ServiceError::App(AppError::InvalidToken)
            })
    }
}
