//! Pluggable config validation strategies.
//!
//! Schema validation works on in-memory configs; the filesystem validator
//! layers on checks that only make sense when a CLI is about to run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::Glob;

use crate::error::{ConfigError, Result};
use crate::spec::{BundleSpec, DrayConfig};

/// Trait for pluggable config validation strategies.
pub trait ConfigValidator {
    fn validate(&self, config: &DrayConfig) -> Result<()>;
}

/// Schema-only validation (no filesystem checks).
///
/// # Example
///
/// ```
/// use dray_config::{BundleSpec, ConfigValidator, DrayConfig, SchemaValidator};
///
/// let config = DrayConfig::default().with_bundle(BundleSpec::new("main"));
/// SchemaValidator.validate(&config).unwrap();
/// ```
pub struct SchemaValidator;

impl ConfigValidator for SchemaValidator {
    fn validate(&self, config: &DrayConfig) -> Result<()> {
        if config.bundles.is_empty() {
            return Err(ConfigError::NoBundles);
        }

        let mut seen = HashSet::new();
        for bundle in &config.bundles {
            if !seen.insert(bundle.name.as_str()) {
                return Err(ConfigError::DuplicateBundle(bundle.name.clone()));
            }
            check_globs(bundle)?;
        }

        // The reorder phase requires exactly one matching bundle.
        if !seen.contains(config.config_target.as_str()) {
            return Err(ConfigError::UnknownConfigTarget(
                config.config_target.clone(),
            ));
        }

        Ok(())
    }
}

fn check_globs(bundle: &BundleSpec) -> Result<()> {
    for pattern in bundle.include.iter().chain(&bundle.exclude) {
        Glob::new(pattern).map_err(|e| ConfigError::InvalidGlob {
            bundle: bundle.name.clone(),
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
    }
    Ok(())
}

/// Filesystem validator (for CLI use).
///
/// Runs schema validation first, then checks that the source root exists.
pub struct FsValidator {
    base: PathBuf,
}

impl FsValidator {
    pub fn new(base: impl AsRef<Path>) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
        }
    }
}

impl ConfigValidator for FsValidator {
    fn validate(&self, config: &DrayConfig) -> Result<()> {
        SchemaValidator.validate(config)?;

        let root = if config.root.is_absolute() {
            config.root.clone()
        } else {
            self.base.join(&config.root)
        };
        if !root.is_dir() {
            return Err(ConfigError::RootNotFound(root));
        }

        Ok(())
    }
}

/// Convenience function for schema-only validation.
pub fn validate_schema(config: &DrayConfig) -> Result<()> {
    SchemaValidator.validate(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> DrayConfig {
        DrayConfig::default()
            .with_bundle(BundleSpec::new("vendor").include("lib/**"))
            .with_bundle(BundleSpec::new("main"))
    }

    #[test]
    fn accepts_valid_config() {
        assert!(validate_schema(&valid_config()).is_ok());
    }

    #[test]
    fn rejects_empty_bundle_list() {
        let result = validate_schema(&DrayConfig::default());
        assert!(matches!(result.unwrap_err(), ConfigError::NoBundles));
    }

    #[test]
    fn rejects_duplicate_bundle_names() {
        let config = valid_config().with_bundle(BundleSpec::new("vendor"));
        let result = validate_schema(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::DuplicateBundle(name) if name == "vendor"
        ));
    }

    #[test]
    fn rejects_unknown_config_target() {
        let mut config = valid_config();
        config.config_target = "missing".into();
        let result = validate_schema(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::UnknownConfigTarget(name) if name == "missing"
        ));
    }

    #[test]
    fn rejects_malformed_glob() {
        let config = DrayConfig::default()
            .with_bundle(BundleSpec::new("main").include("src/[unterminated"));
        let result = validate_schema(&config);
        assert!(matches!(result.unwrap_err(), ConfigError::InvalidGlob { .. }));
    }
}
