//! # dray-config
//!
//! Configuration surface shared across dray crates: the build config a
//! bundler run is driven by, the module-loader configuration shapes the
//! config-target bundle embeds, config file discovery, and validation.

pub mod discovery;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod spec;
pub mod validation;

pub use discovery::{CONFIG_FILE, ConfigDiscovery, load_file};
pub use error::{ConfigError, Result};
pub use loader::{DependencyDescriptor, LoaderConfig, PackageEntry, ShimConfig};
pub use normalize::{PathRewrite, relativize_named_paths};
pub use spec::{BundleSpec, DependencyRef, DependencySpec, DrayConfig, PluginSpec};
pub use validation::{ConfigValidator, FsValidator, SchemaValidator, validate_schema};
