#![cfg_attr(docsrs, feature(doc_cfg))]

//! # dray-bundler
//!
//! The dray bundling orchestrator: a path-keyed item registry, first-match
//! bundle assignment, module-loader config assembly from dependency
//! analysis, and a two-phase build pipeline that always writes the
//! config-bearing bundle last.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use dray_bundler::{Bundler, FileBundleFactory, FsPackageAnalyzer, SourceFile};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = dray_bundler::load_file("dray.toml")?;
//! let analyzer = Arc::new(FsPackageAnalyzer::new(".", "lib"));
//! let mut bundler = Bundler::create(config, analyzer, &FileBundleFactory).await?;
//!
//! bundler.add_file(
//!     SourceFile::new("src/app.js").with_contents("define('app', [], {});"),
//!     None,
//! )?;
//! bundler.configure_dependency("when").await?;
//!
//! bundler.build().await?;
//! bundler.write().await?;
//! # Ok(()) }
//! ```
//!
//! The orchestrator never parses source code and never decides bundle
//! composition itself; bundles accept items through their own predicates,
//! and dependency resolution goes through the [`PackageAnalyzer`] seam.

// Re-export everything from the configuration crate
pub use dray_config::*;

// Orchestrator modules
pub mod analyze;
pub mod bundle;
pub mod bundler;
pub mod item;
pub mod loader;
pub mod trace;

mod pipeline;
mod writer;

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{LogLevel, init_logging, init_logging_from_env};

pub use analyze::{DependencyConfigurator, FsPackageAnalyzer, PackageAnalyzer};
pub use bundle::{
    Bundle, BundleContext, BundleFactory, BundleSet, FileBundle, FileBundleFactory,
};
pub use bundler::Bundler;
pub use item::{Item, ItemRegistry, SharedItem, SourceFile, normalize_key};
pub use loader::{LoaderConfigBuilder, LoaderEntry};
pub use trace::TraceEntry;

/// Error types for dray-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Dependency analysis or reverse-engineering rejected.
    #[error("dependency analysis failed for '{dependency}'")]
    AnalysisFailed {
        dependency: String,
        #[source]
        source: Box<Error>,
    },

    /// A bundle's transform step rejected.
    #[error("transform failed for bundle '{bundle}'")]
    TransformFailed {
        bundle: String,
        #[source]
        source: Box<Error>,
    },

    /// The configured config target names no declared bundle.
    #[error("config target '{0}' matches no bundle")]
    ConfigTargetNotFound(String),

    /// An explicit inclusion named a bundle that does not exist.
    #[error("unknown bundle: {0}")]
    UnknownBundle(String),

    /// A write was requested with no build targets configured.
    #[error("no build targets configured")]
    NoTargets,

    /// A bundle declaration could not be turned into a bundle.
    #[error("invalid bundle declaration: {0}")]
    InvalidBundle(String),

    /// A dependency could not be resolved on disk.
    #[error("cannot resolve package '{name}': {reason}")]
    PackageResolve { name: String, reason: String },

    /// Output path escapes the build target (e.g. traversal attempt).
    #[error("invalid output path: {0}")]
    InvalidOutputPath(String),

    /// File write operation failed.
    #[error("write failure: {0}")]
    WriteFailure(String),

    /// Loader config could not be serialized.
    #[error("loader config serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the configuration crate.
    #[error("configuration error: {0}")]
    Config(#[from] dray_config::ConfigError),
}

/// Result type alias for dray-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::AnalysisFailed { .. } => "ANALYSIS_FAILED",
            Error::TransformFailed { .. } => "TRANSFORM_FAILED",
            Error::ConfigTargetNotFound(_) => "CONFIG_TARGET_NOT_FOUND",
            Error::UnknownBundle(_) => "UNKNOWN_BUNDLE",
            Error::NoTargets => "NO_TARGETS",
            Error::InvalidBundle(_) => "INVALID_BUNDLE",
            Error::PackageResolve { .. } => "PACKAGE_RESOLVE",
            Error::InvalidOutputPath(_) => "INVALID_OUTPUT_PATH",
            Error::WriteFailure(_) => "WRITE_FAILURE",
            Error::Serialize(_) => "SERIALIZE_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::ConfigTargetNotFound(name) => Some(Box::new(format!(
                "Declare a bundle named '{name}', or point configTarget at one of the declared bundles."
            ))),
            Error::UnknownBundle(name) => Some(Box::new(format!(
                "No bundle named '{name}' is declared in the build configuration."
            ))),
            Error::NoTargets => Some(Box::new(
                "Add at least one entry to `targets` in the build configuration.",
            )),
            Error::PackageResolve { name, .. } => Some(Box::new(format!(
                "Check that '{name}' exists under the packages directory, as either '{name}.js' or a '{name}/' directory."
            ))),
            Error::InvalidOutputPath(path) => Some(Box::new(format!(
                "The output path '{path}' must stay inside the build target directory."
            ))),
            Error::WriteFailure(_) => Some(Box::new(
                "Check disk space and permissions on the build target directory.",
            )),
            _ => None,
        }
    }
}
