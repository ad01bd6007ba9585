//! Access level handlers

use axum::{extract::State, Json};
use pgr_service::dto::AccessStatusResponse;
use pgr_service::AccessService;

use crate::extractors::AuthUser;
use crate::response::ApiResult;
use crate::state::AppState;

/// Access level and latest subscription of the caller
///
/// GET /access/status
pub async fn status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<AccessStatusResponse>> {
    let response = AccessService::new(state.service_context())
        .status(&user)
        .await?;
    Ok(Json(response))
}
