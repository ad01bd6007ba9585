//! Authentication handlers
//!
//! Passwordless email login and the current-user lookup.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use pgr_service::dto::{CurrentUserResponse, LoginRequest, LoginResponse};
use pgr_service::AuthService;

use crate::extractors::{json_rejection, AuthUser, RequestId};
use crate::response::ApiResult;
use crate::state::AppState;

/// Log in (or sign up) with an email address
///
/// POST /auth/login
///
/// The body is validated by the service after the email is normalized, so
/// surrounding whitespace or capitals do not fail validation here.
pub async fn login(
    State(state): State<AppState>,
    request_id: RequestId,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(request) = body.map_err(json_rejection)?;
    let response = AuthService::new(state.service_context())
        .with_request_id(request_id.as_deref())
        .login(request)
        .await?;
    Ok(Json(response))
}

/// Get the authenticated user
///
/// GET /auth/me
pub async fn me(AuthUser(user): AuthUser) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse::from(&user))
}
