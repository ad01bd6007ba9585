//! PGR API server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p pgr-api
//! ```
//!
//! Configuration is read from environment variables (and `.env`).

use pgr_common::{init_tracing, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Configuration comes first: it decides the log format
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_tracing(&TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = config.app.env.as_str(),
        address = %config.api.address(),
        version = %config.app.version,
        "Starting PGR API server"
    );

    if let Err(e) = pgr_api::run(config).await {
        error!(error = %e, "Server failed");
        std::process::exit(1);
    }
}
