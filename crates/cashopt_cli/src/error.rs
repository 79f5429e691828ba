//! CLI error types

use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced by the `cashopt` binary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed records in {path}: {source}")]
    Records {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error(transparent)]
    ImpliedVol(#[from] cashopt_engine::pricing::ImpliedVolError),

    #[error(transparent)]
    Lifecycle(#[from] cashopt_engine::LifecycleError),

    #[error(transparent)]
    Match(#[from] cashopt_engine::matching::MatchError),
}

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
