//! Discord account linking handlers
//!
//! Browser-facing: both endpoints answer with redirects and carry state in
//! cookies.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use pgr_service::dto::DiscordCallbackQuery;
use pgr_service::DiscordLinkService;

use crate::cookies::{self, DISCORD_STATE};
use crate::extractors::RequestId;
use crate::response::{ApiError, ApiResult};
use crate::state::AppState;

/// 302 Found
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Start the OAuth flow
///
/// GET /discord/start
pub async fn start(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Response) {
    let authorization = DiscordLinkService::new(state.service_context()).start();
    let jar = jar.add(cookies::state_cookie(
        authorization.state,
        state.secure_cookies(),
    ));
    (jar, found(&authorization.url))
}

/// Finish the OAuth flow and send the browser back to the frontend
///
/// GET /discord/callback
pub async fn callback(
    State(state): State<AppState>,
    request_id: RequestId,
    jar: CookieJar,
    query: Result<Query<DiscordCallbackQuery>, QueryRejection>,
) -> ApiResult<(CookieJar, Response)> {
    let Query(query) = query.map_err(|e| ApiError::invalid_query(e.body_text()))?;
    let expected_state = jar.get(DISCORD_STATE).map(|c| c.value().to_string());

    let linked = DiscordLinkService::new(state.service_context())
        .with_request_id(request_id.as_deref())
        .callback(query, expected_state.as_deref())
        .await?;

    let jar = jar
        .add(cookies::discord_id_cookie(
            linked.discord_user_id,
            state.secure_cookies(),
        ))
        .remove(cookies::expired_state_cookie());

    Ok((jar, found(&state.config().frontend.discord_linked_url())))
}
