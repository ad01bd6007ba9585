//! Authentication extractor
//!
//! Resolves the bearer token in the `Authorization` header to a user row.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use pgr_common::extract_bearer_token;
use pgr_core::User;
use pgr_service::AuthService;

use crate::response::ApiError;
use crate::state::AppState;

use super::RequestId;

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or(ApiError::MissingAuth)?;

        let request_id = RequestId::from_parts(parts);
        let app_state = AppState::from_ref(state);
        let user = AuthService::new(app_state.service_context())
            .with_request_id(request_id.as_deref())
            .authenticate(token)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejected bearer token");
                ApiError::from(e)
            })?;

        Ok(AuthUser(user))
    }
}
