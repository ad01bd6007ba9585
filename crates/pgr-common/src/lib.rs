//! # pgr-common
//!
//! Shared utilities including configuration, error handling, authentication, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{extract_bearer_token, Claims, JwtService};
pub use config::{
    AppConfig, AppSettings, ConfigError, CookieConfig, CorsConfig, DatabaseConfig, DiscordConfig,
    Environment, FrontendConfig, HttpClientConfig, JwtConfig, PlanPrice, RateLimitConfig,
    ServerConfig, StripeConfig,
};
pub use error::{domain_status, AppError};
pub use telemetry::{init_tracing, TracingConfig, TracingError};
