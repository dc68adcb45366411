//! # Logging
//!
//! tracing subscriber setup. Logs go to stderr; stdout is reserved for
//! command output and the interactive funnel.

use crate::config::{LogConfig, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter; `verbose`
/// raises the fallback filter to `debug`.
pub fn init(log: &LogConfig, verbose: bool) {
    let fallback = if verbose {
        "carfunnel=debug".to_string()
    } else {
        log.filter.clone()
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| fallback.into());

    match log.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
