//! Route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{access, auth, discord, health, stripe};
use crate::state::AppState;

/// Rate-limited routes
pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(discord_routes())
        .merge(stripe_routes())
}

/// Routes kept outside the rate limiter: probes and Stripe deliveries
pub fn unlimited_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/version", get(health::version))
        .route("/stripe/webhook", post(stripe::webhook))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/access/status", get(access::status))
}

fn discord_routes() -> Router<AppState> {
    Router::new()
        .route("/discord/start", get(discord::start))
        .route("/discord/callback", get(discord::callback))
}

fn stripe_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/stripe/checkout",
            post(stripe::create_checkout).get(stripe::checkout_redirect),
        )
        .route(
            "/stripe/create-checkout-session",
            post(stripe::create_checkout),
        )
        .route("/stripe/portal", post(stripe::create_portal))
}
