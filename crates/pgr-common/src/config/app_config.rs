//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when
//! present). The result is validated once at startup; a missing secret or a
//! malformed value stops the process before it binds a socket.

use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub stripe: StripeConfig,
    pub discord: DiscordConfig,
    pub frontend: FrontendConfig,
    pub cookies: CookieConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub http: HttpClientConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" | "dev" | "local" => Some(Self::Development),
            _ => None,
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// Token lifetime in seconds
    #[serde(default = "default_token_expiry")]
    pub token_expiry: i64,
}

/// A purchasable plan and the Stripe price backing it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlanPrice {
    pub label: String,
    pub price_id: String,
}

/// Stripe configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub plans: Vec<PlanPrice>,
    #[serde(default = "default_plan")]
    pub default_plan: String,
    pub success_url: String,
    pub cancel_url: String,
    pub portal_return_url: String,
    #[serde(default = "default_stripe_api_base")]
    pub api_base: String,
    /// Maximum accepted age of a webhook signature timestamp, in seconds
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_secs: i64,
}

impl StripeConfig {
    /// Resolve a plan label (or the default plan) to its price
    #[must_use]
    pub fn plan(&self, label: Option<&str>) -> Option<&PlanPrice> {
        let wanted = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.default_plan);
        self.plans.iter().find(|p| p.label == wanted)
    }
}

/// Discord OAuth application and bot configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub bot_token: String,
    pub guild_id: String,
    pub premium_role_id: String,
    #[serde(default = "default_discord_api_base")]
    pub api_base: String,
}

/// Frontend the backend redirects browsers back to
#[derive(Debug, Clone, Deserialize)]
pub struct FrontendConfig {
    pub base_url: String,
}

impl FrontendConfig {
    /// Landing page after a successful Discord link
    #[must_use]
    pub fn discord_linked_url(&self) -> String {
        format!("{}/discord/linked?success=1", self.base_url)
    }
}

/// Cookie attributes
#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    #[serde(default)]
    pub secure: bool,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Outbound HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpClientConfig {
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

// Default value functions
fn default_app_name() -> String {
    "PGR Backend".to_string()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_token_expiry() -> i64 {
    604_800 // 7 days
}

fn default_plan() -> String {
    "premium_399".to_string()
}

fn default_stripe_api_base() -> String {
    "https://api.stripe.com/v1".to_string()
}

fn default_webhook_tolerance() -> i64 {
    300
}

fn default_discord_api_base() -> String {
    "https://discord.com/api".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_burst() -> u32 {
    50
}

fn default_http_timeout() -> u64 {
    15
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn optional(lookup: Lookup<'_>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(lookup: Lookup<'_>, key: &'static str) -> Result<String, ConfigError> {
    optional(lookup, key).ok_or(ConfigError::MissingVar(key))
}

fn parsed<T: FromStr>(
    lookup: Lookup<'_>,
    key: &'static str,
    default: impl FnOnce() -> T,
) -> Result<T, ConfigError> {
    match optional(lookup, key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default()),
    }
}

fn flag(lookup: Lookup<'_>, key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match optional(lookup, key) {
        Some(raw) => match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue(key, raw)),
        },
        None => Ok(default),
    }
}

/// Parse `label=price_id` pairs separated by commas
fn parse_plans(raw: &str) -> Result<Vec<PlanPrice>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (label, price_id) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidValue("STRIPE_PLANS", entry.to_string()))?;
            let (label, price_id) = (label.trim(), price_id.trim());
            if label.is_empty() || price_id.is_empty() {
                return Err(ConfigError::InvalidValue("STRIPE_PLANS", entry.to_string()));
            }
            Ok(PlanPrice {
                label: label.to_string(),
                price_id: price_id.to_string(),
            })
        })
        .collect()
}

impl AppConfig {
    /// Load and validate configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self::from_lookup(&|key: &str| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let env = optional(lookup, "APP_ENV")
            .or_else(|| optional(lookup, "ENVIRONMENT"))
            .map(|raw| Environment::parse(&raw).ok_or(ConfigError::InvalidValue("APP_ENV", raw)))
            .transpose()?
            .unwrap_or_default();

        let frontend_url = optional(lookup, "FRONTEND_URL")
            .or_else(|| optional(lookup, "FRONTEND_BASE_URL"))
            .unwrap_or_else(default_frontend_url)
            .trim_end_matches('/')
            .to_string();

        let default_plan = optional(lookup, "STRIPE_DEFAULT_PLAN").unwrap_or_else(default_plan);
        let plans = match optional(lookup, "STRIPE_PLANS") {
            Some(raw) => parse_plans(&raw)?,
            None => {
                let price_id = optional(lookup, "STRIPE_PRICE_ID")
                    .or_else(|| optional(lookup, "STRIPE_PAYMENT_399"))
                    .ok_or(ConfigError::MissingVar("STRIPE_PRICE_ID"))?;
                vec![PlanPrice {
                    label: default_plan.clone(),
                    price_id,
                }]
            }
        };

        let port = match optional(lookup, "API_PORT") {
            Some(_) => parsed(lookup, "API_PORT", default_port)?,
            None => parsed(lookup, "PORT", default_port)?,
        };

        Ok(Self {
            app: AppSettings {
                name: optional(lookup, "APP_NAME").unwrap_or_else(default_app_name),
                version: optional(lookup, "APP_VERSION").unwrap_or_else(default_version),
                env,
            },
            api: ServerConfig {
                host: optional(lookup, "API_HOST").unwrap_or_else(default_host),
                port,
            },
            database: DatabaseConfig {
                url: required(lookup, "DATABASE_URL")?,
                max_connections: parsed(
                    lookup,
                    "DATABASE_MAX_CONNECTIONS",
                    default_max_connections,
                )?,
                min_connections: parsed(
                    lookup,
                    "DATABASE_MIN_CONNECTIONS",
                    default_min_connections,
                )?,
            },
            jwt: JwtConfig {
                secret: required(lookup, "JWT_SECRET")?,
                token_expiry: parsed(lookup, "JWT_TOKEN_EXPIRY", default_token_expiry)?,
            },
            stripe: StripeConfig {
                secret_key: required(lookup, "STRIPE_SECRET_KEY")?,
                webhook_secret: required(lookup, "STRIPE_WEBHOOK_SECRET")?,
                plans,
                default_plan,
                success_url: optional(lookup, "STRIPE_SUCCESS_URL")
                    .unwrap_or_else(|| format!("{frontend_url}/success")),
                cancel_url: optional(lookup, "STRIPE_CANCEL_URL")
                    .unwrap_or_else(|| format!("{frontend_url}/cancel")),
                portal_return_url: optional(lookup, "STRIPE_PORTAL_RETURN_URL")
                    .unwrap_or_else(|| format!("{frontend_url}/account")),
                api_base: optional(lookup, "STRIPE_API_BASE")
                    .unwrap_or_else(default_stripe_api_base),
                webhook_tolerance_secs: parsed(
                    lookup,
                    "STRIPE_WEBHOOK_TOLERANCE_SECS",
                    default_webhook_tolerance,
                )?,
            },
            discord: DiscordConfig {
                client_id: required(lookup, "DISCORD_CLIENT_ID")?,
                client_secret: required(lookup, "DISCORD_CLIENT_SECRET")?,
                redirect_uri: required(lookup, "DISCORD_REDIRECT_URI")?,
                bot_token: required(lookup, "DISCORD_BOT_TOKEN")?,
                guild_id: required(lookup, "DISCORD_GUILD_ID")?,
                premium_role_id: required(lookup, "DISCORD_PREMIUM_ROLE_ID")?,
                api_base: optional(lookup, "DISCORD_API_BASE")
                    .unwrap_or_else(default_discord_api_base),
            },
            cookies: CookieConfig {
                secure: flag(lookup, "COOKIE_SECURE", env.is_production())?,
            },
            cors: CorsConfig {
                allowed_origins: optional(lookup, "CORS_ALLOWED_ORIGINS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|o| !o.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_else(|| vec![frontend_url.clone()]),
            },
            frontend: FrontendConfig {
                base_url: frontend_url,
            },
            rate_limit: RateLimitConfig {
                requests_per_second: parsed(
                    lookup,
                    "RATE_LIMIT_REQUESTS_PER_SECOND",
                    default_requests_per_second,
                )?,
                burst: parsed(lookup, "RATE_LIMIT_BURST", default_burst)?,
            },
            http: HttpClientConfig {
                timeout_secs: parsed(lookup, "HTTP_CLIENT_TIMEOUT_SECS", default_http_timeout)?,
            },
        })
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    /// Returns the first violated constraint
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "JWT_TOKEN_EXPIRY",
                self.jwt.token_expiry.to_string(),
            ));
        }
        if self.stripe.plan(None).is_none() {
            return Err(ConfigError::InvalidValue(
                "STRIPE_DEFAULT_PLAN",
                self.stripe.default_plan.clone(),
            ));
        }
        if self.stripe.webhook_tolerance_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "STRIPE_WEBHOOK_TOLERANCE_SECS",
                self.stripe.webhook_tolerance_secs.to_string(),
            ));
        }
        if self.rate_limit.requests_per_second == 0 {
            return Err(ConfigError::InvalidValue(
                "RATE_LIMIT_REQUESTS_PER_SECOND",
                "0".to_string(),
            ));
        }
        if self.rate_limit.burst == 0 {
            return Err(ConfigError::InvalidValue("RATE_LIMIT_BURST", "0".to_string()));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::InvalidValue(
                "DATABASE_MIN_CONNECTIONS",
                self.database.min_connections.to_string(),
            ));
        }
        for (key, url) in [
            ("FRONTEND_URL", &self.frontend.base_url),
            ("DISCORD_REDIRECT_URI", &self.discord.redirect_uri),
            ("STRIPE_SUCCESS_URL", &self.stripe.success_url),
            ("STRIPE_CANCEL_URL", &self.stripe.cancel_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(key, url.clone()));
            }
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
