//! Configuration error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors detected while building or loading a grid configuration.
///
/// All of these are fatal to construction: a grid never starts with a
/// configuration that would fail on first use.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No shard labels were configured.
    #[error("subdomain list is empty")]
    EmptySubdomains,

    /// A shard label is empty or whitespace.
    #[error("subdomain at index {0} is blank")]
    BlankSubdomain(usize),

    /// The URL template lacks a required placeholder.
    #[error("URL template '{template}' is missing the {placeholder} placeholder")]
    MissingPlaceholder {
        template: String,
        placeholder: &'static str,
    },

    /// The URL template names a placeholder we do not substitute.
    #[error("URL template '{template}' has unknown placeholder {{{name}}}")]
    UnknownPlaceholder { template: String, name: String },

    /// A `{` in the URL template is never closed.
    #[error("URL template '{template}' has an unterminated placeholder at byte {position}")]
    UnterminatedPlaceholder { template: String, position: usize },

    /// Tile size must be at least one pixel.
    #[error("tile size must be greater than zero")]
    ZeroTileSize,

    /// `min_zoom` is greater than `max_zoom`.
    #[error("invalid zoom range: min {min} > max {max}")]
    InvalidZoomRange { min: u8, max: u8 },

    /// A zoom limit exceeds what the grid supports.
    #[error("zoom level {zoom} exceeds supported maximum {max}")]
    ZoomTooLarge { zoom: u8, max: u8 },

    /// Failed to read a configuration file.
    #[error("failed to read config file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    /// The configuration file is not valid INI.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// A required key is absent.
    #[error("missing required setting '{0}'")]
    MissingKey(String),

    /// A key holds a value that cannot be interpreted.
    #[error("invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}
