//! Configuration management for policysign
//!
//! Settings are layered, later sources winning:
//! - Built-in defaults
//! - Config file (`--config`, else `policysign.toml` or `/etc/policysign/config`)
//! - Environment variables (`POLICYSIGN__SIGNER__CHAIN_ID`, ...)
//!
//! Command line flags override the result. The merged settings are built once
//! at startup and never change afterwards.

use crate::errors::{Result, SignerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Signing defaults
    pub signer: SignerConfig,

    /// Security configuration
    pub security: SecurityConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Raw transaction as lowercase hex
    Hex,
    /// JSON report
    Json,
}

/// Signing defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Chain id used when `--chain` is not given (1 = Ethereum mainnet)
    pub chain_id: u64,

    /// Policy file used when `--policy` is not given
    pub policy_path: PathBuf,

    /// Output format used when `--format` is not given
    pub output_format: OutputFormat,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            policy_path: PathBuf::from("policy.json"),
            output_format: OutputFormat::Hex,
        }
    }
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Disable core dumps at startup
    pub disable_core_dumps: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            disable_core_dumps: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Settings {
    /// Load configuration from defaults, file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Settings::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = config_path {
            // An explicit file must exist
            builder = builder.add_source(config::File::from(path).required(true));
        } else {
            builder = builder
                .add_source(config::File::with_name("policysign").required(false))
                .add_source(config::File::with_name("/etc/policysign/config").required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("POLICYSIGN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.signer.chain_id == 0 {
            return Err(SignerError::Config(
                "chain_id must be at least 1".to_string(),
            ));
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(SignerError::Config(format!(
                    "unknown log format {:?} (expected pretty or json)",
                    other
                )))
            }
        }

        EnvFilter::try_new(&self.logging.level).map_err(|e| {
            SignerError::Config(format!("invalid log level {:?}: {}", self.logging.level, e))
        })?;

        Ok(())
    }
}
