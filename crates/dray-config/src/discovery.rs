//! File-based config discovery for CLI use.
//!
//! Finds and loads `dray.toml`. Library users construct [`DrayConfig`]
//! directly or go through [`DrayConfig::from_value`].

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::spec::DrayConfig;

/// The conventional config file name.
pub const CONFIG_FILE: &str = "dray.toml";

/// File-based configuration discovery rooted at a directory.
///
/// # Example
///
/// ```no_run
/// use dray_config::ConfigDiscovery;
///
/// let config = ConfigDiscovery::new(".").load().unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find the config file under the root directory, if present.
    pub fn find(&self) -> Option<PathBuf> {
        let path = self.root.join(CONFIG_FILE);
        path.exists().then_some(path)
    }

    /// Load config from the discovered file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] when no config file exists.
    pub fn load(&self) -> Result<DrayConfig> {
        let path = self.find().ok_or(ConfigError::NotFound)?;
        load_file(&path)
    }
}

/// Load config from a specific TOML file.
pub fn load_file(path: impl AsRef<Path>) -> Result<DrayConfig> {
    let content = fs::read_to_string(path.as_ref())?;

    let toml_val: toml::Value = toml::from_str(&content)
        .map_err(|e| ConfigError::InvalidValue(format!("invalid TOML syntax: {e}")))?;

    let value = serde_json::to_value(toml_val)
        .map_err(|e| ConfigError::InvalidValue(format!("TOML to JSON conversion failed: {e}")))?;

    DrayConfig::from_value(value)
}
