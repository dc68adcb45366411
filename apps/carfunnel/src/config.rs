//! # Configuration
//!
//! Resolution order (later wins):
//!
//! 1. Built-in defaults
//! 2. TOML file: `--config <path>`, or `carfunnel.toml` in the working
//!    directory if present
//! 3. Environment:
//!    - `CARFUNNEL_BACKEND_URL`: backend base URL
//!    - `CARFUNNEL_TIMEOUT_MS`: lookup timeout in milliseconds
//!    - `CARFUNNEL_LOG_FORMAT`: `text` or `json`
//! 4. `--backend` flag
//!
//! ```toml
//! [backend]
//! base_url = "http://localhost:8000"
//! timeout_ms = 10000
//!
//! [log]
//! format = "json"
//! filter = "carfunnel=debug"
//! ```

use carfunnel_core::FunnelError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "carfunnel.toml";

// =============================================================================
// CONFIG STRUCTURE
// =============================================================================

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub backend: BackendConfig,
    pub log: LogConfig,
}

/// Where lookups go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL the stage endpoints are appended to.
    pub base_url: String,
    /// Per-lookup transport timeout.
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "carfunnel=info".to_string(),
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = FunnelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(FunnelError::Config(format!(
                "Unknown log format '{}' (expected text or json)",
                other
            ))),
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl Config {
    /// Full resolution: file, environment, then the `--backend` flag.
    pub fn resolve(path: Option<&Path>, backend: Option<&str>) -> Result<Self, FunnelError> {
        let mut config = Self::load(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        if let Some(url) = backend {
            config.backend.base_url = url.to_string();
        }
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from `carfunnel.toml` if it exists, or defaults.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file is not.
    pub fn load(path: Option<&Path>) -> Result<Self, FunnelError> {
        let path = match path {
            Some(p) => p,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let text = std::fs::read_to_string(path).map_err(|e| {
            FunnelError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse a TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, FunnelError> {
        toml::from_str(text).map_err(|e| FunnelError::Config(e.to_string()))
    }

    /// Apply `CARFUNNEL_*` variables fetched through `var`.
    pub fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), FunnelError> {
        if let Some(url) = var("CARFUNNEL_BACKEND_URL").filter(|v| !v.is_empty()) {
            self.backend.base_url = url;
        }
        if let Some(ms) = var("CARFUNNEL_TIMEOUT_MS").filter(|v| !v.is_empty()) {
            self.backend.timeout_ms = ms.trim().parse().map_err(|_| {
                FunnelError::Config(format!("CARFUNNEL_TIMEOUT_MS is not a number: '{}'", ms))
            })?;
        }
        if let Some(format) = var("CARFUNNEL_LOG_FORMAT").filter(|v| !v.is_empty()) {
            self.log.format = format.parse()?;
        }
        Ok(())
    }

    /// Reject values no lookup could work with.
    pub fn validate(&self) -> Result<(), FunnelError> {
        let url = self.backend.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(FunnelError::Config(format!(
                "backend.base_url must be an http(s) URL, got '{}'",
                self.backend.base_url
            )));
        }
        if self.backend.timeout_ms == 0 {
            return Err(FunnelError::Config(
                "backend.timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Lookup timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.backend.timeout_ms)
    }
}
