//! Local stand-in for the Stripe and Discord HTTP APIs
//!
//! Records what the backend sent so tests can assert on outbound calls.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Form, Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Authorization code the mock token endpoint refuses
pub const REJECTED_CODE: &str = "bad-code";

type FormFields = HashMap<String, String>;

#[derive(Default)]
struct Recorded {
    profile: Mutex<Value>,
    checkouts: Mutex<Vec<FormFields>>,
    portals: Mutex<Vec<FormFields>>,
    role_grants: Mutex<Vec<String>>,
    role_revokes: Mutex<Vec<String>>,
}

#[derive(Clone)]
pub struct MockProviders {
    recorded: Arc<Recorded>,
    addr: SocketAddr,
}

impl MockProviders {
    /// Bind on an ephemeral port and serve in the background
    pub async fn start() -> Result<Self> {
        let recorded = Arc::new(Recorded::default());
        let app = Router::new()
            .route("/stripe/v1/checkout/sessions", post(checkout_session))
            .route("/stripe/v1/billing_portal/sessions", post(portal_session))
            .route("/discord/oauth2/token", post(token))
            .route("/discord/users/@me", get(profile))
            .route(
                "/discord/v10/guilds/:guild_id/members/:user_id/roles/:role_id",
                put(grant_role).delete(revoke_role),
            )
            .with_state(recorded.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self { recorded, addr })
    }

    pub fn stripe_api_base(&self) -> String {
        format!("http://{}/stripe/v1", self.addr)
    }

    pub fn discord_api_base(&self) -> String {
        format!("http://{}/discord", self.addr)
    }

    /// Profile returned by `GET /users/@me`
    pub fn set_profile(&self, discord_user_id: &str, email: Option<&str>) {
        *self.recorded.profile.lock().unwrap() = json!({
            "id": discord_user_id,
            "username": "player",
            "email": email,
        });
    }

    pub fn checkouts(&self) -> Vec<FormFields> {
        self.recorded.checkouts.lock().unwrap().clone()
    }

    pub fn portals(&self) -> Vec<FormFields> {
        self.recorded.portals.lock().unwrap().clone()
    }

    pub fn role_grants(&self) -> Vec<String> {
        self.recorded.role_grants.lock().unwrap().clone()
    }

    pub fn role_revokes(&self) -> Vec<String> {
        self.recorded.role_revokes.lock().unwrap().clone()
    }
}

async fn checkout_session(
    State(recorded): State<Arc<Recorded>>,
    Form(form): Form<FormFields>,
) -> Json<Value> {
    let mut checkouts = recorded.checkouts.lock().unwrap();
    checkouts.push(form);
    let id = format!("cs_test_{}", checkouts.len());
    Json(json!({
        "id": id,
        "url": format!("https://checkout.stripe.test/c/{id}"),
    }))
}

async fn portal_session(
    State(recorded): State<Arc<Recorded>>,
    Form(form): Form<FormFields>,
) -> Json<Value> {
    recorded.portals.lock().unwrap().push(form);
    Json(json!({ "id": "bps_test", "url": "https://billing.stripe.test/p/session" }))
}

async fn token(Form(form): Form<FormFields>) -> impl IntoResponse {
    if form.get("code").map(String::as_str) == Some(REJECTED_CODE) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "access_token": "discord-access-token", "token_type": "Bearer" })),
    )
}

async fn profile(State(recorded): State<Arc<Recorded>>) -> Json<Value> {
    Json(recorded.profile.lock().unwrap().clone())
}

async fn grant_role(
    State(recorded): State<Arc<Recorded>>,
    Path((_guild_id, user_id, _role_id)): Path<(String, String, String)>,
) -> StatusCode {
    recorded.role_grants.lock().unwrap().push(user_id);
    StatusCode::NO_CONTENT
}

async fn revoke_role(
    State(recorded): State<Arc<Recorded>>,
    Path((_guild_id, user_id, _role_id)): Path<(String, String, String)>,
) -> StatusCode {
    recorded.role_revokes.lock().unwrap().push(user_id);
    StatusCode::NO_CONTENT
}
