//! # Carfunnel CLI Module
//!
//! This module implements the CLI interface for the filter funnel.
//!
//! ## Available Commands
//!
//! - `browse` - Interactive funnel over stdin (default)
//! - `walk` - Select a value per stage in order, then print the funnel
//! - `fetch` - Run one stage lookup and print the options
//! - `stages` - Show the stage registry

mod browse;
mod commands;

use crate::config::Config;
use carfunnel_core::FunnelError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use browse::{BROWSE_HELP, BrowseCommand};
pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Carfunnel - cascading vehicle filter
///
/// Drives the six-stage search funnel (manufacturer, model, year, body
/// type, fuel type, location) against a rental site backend.
#[derive(Parser, Debug)]
#[command(name = "carfunnel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL (overrides config and environment)
    #[arg(short = 'b', long, global = true)]
    pub backend: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive funnel (type `help` once running)
    Browse,

    /// Select one value per stage, in funnel order, then print the result
    Walk {
        /// Values for make, model, year, car type, fuel type, location
        #[arg(num_args = 1..=6)]
        values: Vec<String>,
    },

    /// Run a single stage lookup
    Fetch {
        /// Stage name, position (1-6) or control id
        #[arg(short, long)]
        stage: String,

        /// Parent stage value sent with the lookup
        #[arg(short, long)]
        param: Option<String>,
    },

    /// Show the stage registry
    Stages,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments and resolved configuration.
pub async fn execute(cli: Cli, config: Config) -> Result<(), FunnelError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Stages) => cmd_stages(json_mode),
        Some(Commands::Fetch { stage, param }) => {
            cmd_fetch(&config, &stage, param, json_mode).await
        }
        Some(Commands::Walk { values }) => cmd_walk(&config, &values, json_mode).await,
        Some(Commands::Browse) | None => cmd_browse(&config).await,
    }
}
