//! CLI configuration management
//!
//! Handles loading configuration from a TOML file, environment variables and
//! command-line flags.
//!
//! Priority (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (`CASHOPT_*`)
//! 3. Config file (`--config`, or `cashopt.toml` in the working directory)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::str::FromStr;

use cashopt_engine::config::{EngineConfig, ImpliedVolMethod};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file picked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "cashopt.toml";

/// Environment variable overriding the risk-free rate.
pub const ENV_RISK_FREE_RATE: &str = "CASHOPT_RISK_FREE_RATE";
/// Environment variable overriding the default volatility.
pub const ENV_VOLATILITY: &str = "CASHOPT_VOLATILITY";
/// Environment variable overriding the log level.
pub const ENV_LOG_LEVEL: &str = "CASHOPT_LOG_LEVEL";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid value for {var}: {value}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("Configuration file error: {0}")]
    FileError(String),

    #[error(transparent)]
    Engine(#[from] cashopt_engine::config::ConfigError),
}

/// Log levels accepted by `--log-level` and the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

/// Effective configuration of one CLI invocation
///
/// The engine sections sit at the top level of the TOML file:
///
/// ```toml
/// log_level = "debug"
/// underlying = "APT"
///
/// [market]
/// risk_free_rate = 0.05
///
/// [implied_vol]
/// method = "bisection"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Log level
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    /// Engine settings
    #[serde(flatten)]
    pub engine: EngineConfig,
}

impl CliConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `CASHOPT_*` overrides found through `lookup`
    pub fn merge_with_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rate) = lookup(ENV_RISK_FREE_RATE) {
            self.engine.market.risk_free_rate = parse_number(ENV_RISK_FREE_RATE, &rate)?;
        }
        if let Some(vol) = lookup(ENV_VOLATILITY) {
            self.engine.market.default_volatility = parse_number(ENV_VOLATILITY, &vol)?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = LogLevel::from_str(&level)?;
        }
        Ok(())
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) {
        if let Some(rate) = cli.risk_free_rate {
            self.engine.market.risk_free_rate = rate;
        }
        if let Some(vol) = cli.volatility {
            self.engine.market.default_volatility = vol;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        if let Some(method) = cli.method {
            self.engine.implied_vol.method = method;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        Ok(())
    }
}

fn parse_number(var: &'static str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: value.to_string(),
    })
}

/// Configuration-related command-line flags
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Risk-free rate override
    pub risk_free_rate: Option<f64>,
    /// Default volatility override
    pub volatility: Option<f64>,
    /// Log level override
    pub log_level: Option<LogLevel>,
    /// Implied volatility method override
    pub method: Option<ImpliedVolMethod>,
}

/// Layer file, environment and CLI values over the defaults
pub fn resolve<F>(file: Option<CliConfig>, env: F, cli: &CliArgs) -> Result<CliConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = file.unwrap_or_default();
    config.merge_with_env(env)?;
    config.merge_with_cli(cli);
    config.validate()?;
    Ok(config)
}

/// Build configuration from all sources
pub fn build_config(cli: &CliArgs) -> Result<CliConfig, ConfigError> {
    let default_file = Path::new(DEFAULT_CONFIG_FILE);
    let file = match &cli.config_file {
        Some(path) => Some(CliConfig::from_file(path)?),
        None if default_file.exists() => Some(CliConfig::from_file(default_file)?),
        None => None,
    };
    resolve(file, |var| std::env::var(var).ok(), cli)
}
