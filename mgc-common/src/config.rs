//! Bootstrap configuration loading
//!
//! Services resolve each setting with the following priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Steps 1 and 2 are handled by clap (`#[arg(env = ...)]`); this module
//! provides the TOML file lookup and the logging section shared by all
//! services.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Logging configuration (`[logging]` TOML section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or full filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default TOML path for a service: `<config_dir>/mgc/<module>.toml`
///
/// Returns `None` when the platform has no user configuration directory.
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mgc").join(format!("{}.toml", module_name)))
}

/// Parse a TOML document into `T`
pub fn parse_toml_config<T: DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load a TOML config file
///
/// A missing file is not an error: a warning is logged and `Ok(None)` is
/// returned so the caller falls back to defaults. A file that exists but
/// cannot be read or parsed is an error.
pub fn load_toml_config<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        warn!(
            "Config file not found: {} (using defaults)",
            path.display()
        );
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)?;
    let config = parse_toml_config(&content)?;

    info!("Loaded configuration from {}", path.display());
    Ok(Some(config))
}

/// Pick the first present value in priority order, falling back to `default`
pub fn resolve_setting<T>(cli_or_env: Option<T>, toml_value: Option<T>, default: T) -> T {
    cli_or_env.or(toml_value).unwrap_or(default)
}
