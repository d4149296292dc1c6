//! Error types for configuration validation and loading.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    // Config parsing/loading errors
    #[error("config not found")]
    NotFound,

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    // Schema validation errors (no filesystem checks)
    #[error("no bundles declared")]
    NoBundles,

    #[error("duplicate bundle name: {0}")]
    DuplicateBundle(String),

    #[error("config target '{0}' does not name a declared bundle")]
    UnknownConfigTarget(String),

    #[error("invalid glob '{pattern}' in bundle '{bundle}': {message}")]
    InvalidGlob {
        bundle: String,
        pattern: String,
        message: String,
    },

    // Filesystem validation errors (for CLI use)
    #[error("source root not found: {0}")]
    RootNotFound(PathBuf),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
