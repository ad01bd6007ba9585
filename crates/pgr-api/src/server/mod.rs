//! Server setup and initialization
//!
//! Wires configuration into repositories, provider clients and the service
//! context, then serves the router.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use pgr_common::{AppConfig, AppError, JwtService};
use pgr_db::{
    create_pool, ensure_schema, DatabaseConfig, PgAuditLogRepository, PgHealthProbe,
    PgSubscriptionRepository, PgUserRepository, PgWebhookEventRepository,
};
use pgr_providers::{
    build_http_client, DiscordOAuthClient, DiscordRoleClient, StripeClient, WebhookVerifier,
};
use pgr_service::{BillingSettings, ServiceContext};
use tokio::net::TcpListener;
use tracing::info;

use crate::middleware::{apply_middleware, apply_rate_limit};
use crate::routes::{create_router, unlimited_routes};
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware.
///
/// Health checks and Stripe deliveries sit outside the rate limiter.
pub fn create_app(state: AppState) -> Result<Router, AppError> {
    let config = state.config();
    let router = apply_rate_limit(create_router(), &config.rate_limit)?;
    let router = apply_middleware(router.merge(unlimited_routes()), &config.cors);
    Ok(router.with_state(state))
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&DatabaseConfig::from(&config.database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    ensure_schema(&pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    let http = build_http_client(Duration::from_secs(config.http.timeout_secs))
        .map_err(|e| AppError::Config(e.to_string()))?;

    let stripe = StripeClient::new(
        http.clone(),
        config.stripe.secret_key.clone(),
        config.stripe.api_base.clone(),
    );
    let discord_oauth = DiscordOAuthClient::new(http.clone(), &config.discord)
        .map_err(|e| AppError::Config(e.to_string()))?;
    let discord_roles = DiscordRoleClient::new(http, &config.discord);

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.token_expiry);
    let verifier = WebhookVerifier::new(
        config.stripe.webhook_secret.clone(),
        config.stripe.webhook_tolerance_secs,
    );

    let service_context = ServiceContext::builder()
        .user_repo(Arc::new(PgUserRepository::new(pool.clone())))
        .subscription_repo(Arc::new(PgSubscriptionRepository::new(pool.clone())))
        .audit_repo(Arc::new(PgAuditLogRepository::new(pool.clone())))
        .webhook_event_repo(Arc::new(PgWebhookEventRepository::new(pool.clone())))
        .health_probe(Arc::new(PgHealthProbe::new(pool)))
        .billing(Arc::new(stripe))
        .discord_oauth(Arc::new(discord_oauth))
        .premium_roles(Arc::new(discord_roles))
        .jwt_service(Arc::new(jwt_service))
        .webhook_verifier(Arc::new(verifier))
        .billing_settings(BillingSettings::from(&config.stripe))
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(AppState::new(service_context, config))
}

/// Serve the application on an already bound listener
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), AppError> {
    if let Ok(addr) = listener.local_addr() {
        info!("Server listening on http://{}", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.api.address();

    let state = create_app_state(config).await?;
    let app = create_app(state)?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    serve(listener, app).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
