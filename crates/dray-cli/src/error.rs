//! CLI error types and miette conversion.

use std::path::PathBuf;

use miette::Report;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// No config file was found where one was expected.
    #[error(
        "no dray.toml found in '{}'\n\nHint: create a dray.toml or pass --config <path>",
        .0.display()
    )]
    ConfigMissing(PathBuf),

    /// The layered configuration could not be assembled.
    #[error("invalid configuration: {0}\n\nHint: check dray.toml syntax and field types")]
    ConfigInvalid(String),

    /// Configuration-level errors (schema, filesystem checks).
    #[error("configuration error: {0}")]
    Config(#[from] dray_config::ConfigError),

    /// Errors from the core bundler.
    #[error(transparent)]
    Bundler(#[from] dray_bundler::Error),

    /// Source scan failed below the configured root.
    #[error("scan failed under '{}': {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// I/O errors from file system operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors (trace export).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convert a CLI error into a miette report for terminal rendering.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        // The bundler error carries its own diagnostic codes and help text.
        CliError::Bundler(inner) => Report::new(inner),
        other => miette::miette!("{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_missing_mentions_the_directory_and_a_hint() {
        let message = CliError::ConfigMissing(PathBuf::from("/proj")).to_string();
        assert!(message.contains("/proj"));
        assert!(message.contains("--config"));
    }

    #[test]
    fn bundler_errors_keep_their_message() {
        let report = cli_error_to_miette(CliError::Bundler(dray_bundler::Error::NoTargets));
        assert_eq!(report.to_string(), "no build targets configured");
    }
}
