//! Service configuration for mgc-predict
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--port`, `--mlp-model`, ...)
//! 2. Environment variables (`MGC_PORT`, `MGC_MLP_MODEL`, ...)
//! 3. TOML bootstrap file (`--config`, or `<config_dir>/mgc/mgc-predict.toml`)
//! 4. Built-in defaults
//!
//! Everything here is read once at startup; nothing is reloaded.

use clap::Parser;
use mgc_common::config::{default_config_path, load_toml_config, resolve_setting, LoggingConfig};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const MODULE_NAME: &str = "mgc-predict";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MLP_MODEL: &str = "./models/mlp_model.json";
pub const DEFAULT_CNN_MODEL: &str = "./models/cnn_model.json";
pub const DEFAULT_SCALER: &str = "./preprocess/feature_scaler.json";

/// 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Command-line arguments for mgc-predict
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "mgc-predict")]
#[command(about = "Music genre classification service")]
#[command(version)]
pub struct Args {
    /// Address to bind
    #[arg(long, env = "MGC_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "MGC_PORT")]
    pub port: Option<u16>,

    /// TOML bootstrap file
    #[arg(short, long, env = "MGC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Shallow classifier artifact (.json or .onnx)
    #[arg(long, env = "MGC_MLP_MODEL")]
    pub mlp_model: Option<PathBuf>,

    /// Deep classifier artifact (.json or .onnx)
    #[arg(long, env = "MGC_CNN_MODEL")]
    pub cnn_model: Option<PathBuf>,

    /// Feature scaler artifact (.json)
    #[arg(long, env = "MGC_SCALER")]
    pub scaler: Option<PathBuf>,

    /// Largest accepted upload, in bytes
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,

    /// Abort a prediction that runs longer than this
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,
}

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub models: TomlModels,

    #[serde(default)]
    pub limits: TomlLimits,
}

/// `[models]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlModels {
    pub mlp: Option<PathBuf>,
    pub cnn: Option<PathBuf>,
    pub scaler: Option<PathBuf>,
}

/// `[limits]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlLimits {
    pub max_upload_bytes: Option<usize>,
    pub request_timeout_secs: Option<u64>,
}

/// Artifact locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub mlp: PathBuf,
    pub cnn: PathBuf,
    pub scaler: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            mlp: PathBuf::from(DEFAULT_MLP_MODEL),
            cnn: PathBuf::from(DEFAULT_CNN_MODEL),
            scaler: PathBuf::from(DEFAULT_SCALER),
        }
    }
}

/// Per-request resource limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceLimits {
    pub max_upload_bytes: usize,
    /// `None` waits for the prediction however long it takes
    pub request_timeout: Option<Duration>,
}

impl Default for ServiceLimits {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            request_timeout: None,
        }
    }
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// TOML file the settings were read from, if any
    pub config_file: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub logging: LoggingConfig,
    pub models: ModelPaths,
    pub limits: ServiceLimits,
}

impl ServiceConfig {
    /// Resolve from parsed arguments, reading the TOML file if one is found
    pub fn load(args: &Args) -> mgc_common::Result<Self> {
        let path = args
            .config
            .clone()
            .or_else(|| default_config_path(MODULE_NAME));
        let (toml, config_file) = match path {
            Some(path) => match load_toml_config::<TomlConfig>(&path)? {
                Some(toml) => (toml, Some(path)),
                None => (TomlConfig::default(), None),
            },
            None => (TomlConfig::default(), None),
        };
        Ok(Self {
            config_file,
            ..Self::resolve(args, toml)
        })
    }

    /// Merge arguments (CLI/ENV) over TOML over defaults
    pub fn resolve(args: &Args, toml: TomlConfig) -> Self {
        let models = ModelPaths {
            mlp: resolve_setting(
                args.mlp_model.clone(),
                toml.models.mlp,
                PathBuf::from(DEFAULT_MLP_MODEL),
            ),
            cnn: resolve_setting(
                args.cnn_model.clone(),
                toml.models.cnn,
                PathBuf::from(DEFAULT_CNN_MODEL),
            ),
            scaler: resolve_setting(
                args.scaler.clone(),
                toml.models.scaler,
                PathBuf::from(DEFAULT_SCALER),
            ),
        };

        let limits = ServiceLimits {
            max_upload_bytes: resolve_setting(
                args.max_upload_bytes,
                toml.limits.max_upload_bytes,
                DEFAULT_MAX_UPLOAD_BYTES,
            ),
            request_timeout: args
                .request_timeout_secs
                .or(toml.limits.request_timeout_secs)
                .filter(|&secs| secs > 0)
                .map(Duration::from_secs),
        };

        Self {
            config_file: None,
            host: resolve_setting(args.host.clone(), toml.host, DEFAULT_HOST.to_string()),
            port: resolve_setting(args.port, toml.port, DEFAULT_PORT),
            logging: toml.logging,
            models,
            limits,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
