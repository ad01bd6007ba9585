//! Test helpers for integration tests
//!
//! Spawns the API with a provider mock, makes HTTP requests and reads
//! cookies back out of responses.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use pgr_api::{create_app, create_app_state};
use pgr_common::AppConfig;
use reqwest::{header, redirect, Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpListener;

use crate::mock_providers::MockProviders;

pub const WEBHOOK_SECRET: &str = "whsec_integration";
pub const FRONTEND_URL: &str = "http://localhost:3000";

/// Running API plus the provider mock it talks to
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    pub providers: MockProviders,
}

impl TestServer {
    /// Start a new test server
    pub async fn start() -> Result<Self> {
        let providers = MockProviders::start().await?;
        let config = test_config(&providers)?;

        let state = create_app_state(config).await?;
        let app = create_app(state)?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        // Redirects are asserted on, never followed
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            base_url: format!("http://{addr}"),
            client,
            providers,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> Result<Response> {
        Ok(self
            .client
            .get(self.url(path))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await?)
    }

    /// GET with a `Cookie` header built from name/value pairs
    pub async fn get_with_cookies(&self, path: &str, cookies: &[(&str, &str)]) -> Result<Response> {
        let cookie = cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        Ok(self
            .client
            .get(self.url(path))
            .header(header::COOKIE, cookie)
            .send()
            .await?)
    }

    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        Ok(self.client.post(self.url(path)).json(body).send().await?)
    }

    pub async fn post_auth<T: Serialize>(&self, path: &str, token: &str, body: &T) -> Result<Response> {
        Ok(self
            .client
            .post(self.url(path))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .json(body)
            .send()
            .await?)
    }

    /// POST a raw Stripe delivery
    pub async fn post_webhook(&self, payload: Vec<u8>, signature: Option<&str>) -> Result<Response> {
        let mut request = self
            .client
            .post(self.url("/stripe/webhook"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(payload);
        if let Some(signature) = signature {
            request = request.header("stripe-signature", signature);
        }
        Ok(request.send().await?)
    }
}

/// Configuration pointing the providers at the mock
pub fn test_config(providers: &MockProviders) -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")?;
    let stripe_api_base = providers.stripe_api_base();
    let discord_api_base = providers.discord_api_base();

    let vars: HashMap<&str, &str> = HashMap::from([
        ("APP_ENV", "development"),
        ("DATABASE_URL", database_url.as_str()),
        ("JWT_SECRET", "integration-secret-key-that-is-long-enough"),
        ("STRIPE_SECRET_KEY", "sk_test_integration"),
        ("STRIPE_WEBHOOK_SECRET", WEBHOOK_SECRET),
        ("STRIPE_PLANS", "premium_399=price_399,premium_999=price_999"),
        ("STRIPE_API_BASE", stripe_api_base.as_str()),
        ("DISCORD_CLIENT_ID", "client-id"),
        ("DISCORD_CLIENT_SECRET", "client-secret"),
        ("DISCORD_REDIRECT_URI", "http://localhost:5000/discord/callback"),
        ("DISCORD_BOT_TOKEN", "bot-token"),
        ("DISCORD_GUILD_ID", "100000000000000001"),
        ("DISCORD_PREMIUM_ROLE_ID", "100000000000000002"),
        ("DISCORD_API_BASE", discord_api_base.as_str()),
        ("FRONTEND_URL", FRONTEND_URL),
        ("RATE_LIMIT_BURST", "500"),
    ]);

    let config = AppConfig::from_lookup(&|key: &str| vars.get(key).map(ToString::to_string))
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;
    Ok(config)
}

/// Helper to check if test environment is available
pub fn check_test_env() -> bool {
    dotenvy::dotenv().ok();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("Skipping test: DATABASE_URL not set");
        return false;
    }
    true
}

/// Value of a cookie set by the response, if any
pub fn set_cookie(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
}

/// Full `Set-Cookie` header for a cookie, attributes included
pub fn set_cookie_header(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{name}=")))
        .map(String::from)
}

pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(response: Response, expected_status: StatusCode) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(())
}
