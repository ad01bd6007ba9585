//! Cookies used by the Discord link flow
//!
//! `discord_state` carries the OAuth anti-forgery token between `/discord/start`
//! and the callback. `pgr_discord_id` remembers the linked account so the
//! browser checkout can be opened without a query parameter.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

pub const DISCORD_STATE: &str = "discord_state";
pub const DISCORD_ID: &str = "pgr_discord_id";

const STATE_MAX_AGE: Duration = Duration::minutes(10);
const DISCORD_ID_MAX_AGE: Duration = Duration::days(30);

fn session_cookie(name: &'static str, value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

pub fn state_cookie(state: String, secure: bool) -> Cookie<'static> {
    session_cookie(DISCORD_STATE, state, STATE_MAX_AGE, secure)
}

pub fn discord_id_cookie(discord_user_id: String, secure: bool) -> Cookie<'static> {
    session_cookie(DISCORD_ID, discord_user_id, DISCORD_ID_MAX_AGE, secure)
}

/// Removal cookie for the state; path must match the one it was set with
pub fn expired_state_cookie() -> Cookie<'static> {
    Cookie::build(DISCORD_STATE).path("/").build()
}
