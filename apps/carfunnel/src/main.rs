//! # Carfunnel
//!
//! Command-line driver for the cascading vehicle filter.
//!
//! ## Usage
//!
//! ```bash
//! # Interactive funnel against a local backend
//! carfunnel --backend http://localhost:8000 browse
//!
//! # Non-interactive walk down the funnel
//! carfunnel walk honda civic 2022 Hatchback Petrol Dublin
//!
//! # One lookup
//! carfunnel fetch --stage model --param honda
//! ```

use carfunnel::{Config, cli, config::LogConfig, logging};
use clap::Parser;

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Resolve configuration before logging so the log format can come from it.
    let config = match Config::resolve(cli.config.as_deref(), cli.backend.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init(&LogConfig::default(), cli.verbose);
            tracing::error!("Error: {}", e);
            std::process::exit(1);
        }
    };
    logging::init(&config.log, cli.verbose);

    tracing::debug!("Backend: {}", config.backend.base_url);

    // Execute command
    if let Err(e) = cli::execute(cli, config).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
