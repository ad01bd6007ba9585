//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, ConfigError, CookieConfig, CorsConfig, DatabaseConfig, DiscordConfig,
    Environment, FrontendConfig, HttpClientConfig, JwtConfig, PlanPrice, RateLimitConfig,
    ServerConfig, StripeConfig,
};
