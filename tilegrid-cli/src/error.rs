//! CLI error type.

use std::path::PathBuf;

use thiserror::Error;
use tilegrid::{ConfigError, CoordError};

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid viewport: {0}")]
    Viewport(#[from] CoordError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid viewport script {path}: {source}")]
    Script {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("failed to start async runtime: {0}")]
    Runtime(String),

    #[error("{0}")]
    Usage(String),
}
