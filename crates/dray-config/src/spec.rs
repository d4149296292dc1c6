//! Build configuration for a bundler run.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

/// Top-level dray configuration.
///
/// One of these drives one bundler instance: where the sources live, which
/// environment the build is for, which bundles exist, and which loader
/// plugins and dependencies to register up front.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrayConfig {
    /// Source root; becomes the loader's `baseUrl`.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Current build environment, matched against item `env` tags.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Name of the bundle that embeds the final loader configuration.
    ///
    /// The build pipeline moves this bundle to the end of the write order.
    #[serde(default = "default_config_target")]
    pub config_target: String,

    /// Build output targets; the first entry is the primary target every
    /// bundle is written against.
    #[serde(default)]
    pub targets: Vec<PathBuf>,

    /// Named path mappings seeded into the loader configuration.
    ///
    /// Absolute entries nested under `root` are rewritten relative to it at
    /// bundler construction (see [`crate::relativize_named_paths`]).
    #[serde(default)]
    pub paths: BTreeMap<String, String>,

    /// Declared output bundles, in subsumption order.
    #[serde(default)]
    pub bundles: Vec<BundleSpec>,

    /// Loader plugins to register at construction.
    #[serde(default)]
    pub plugins: Vec<PluginSpec>,

    /// Dependencies configured right after construction, before any build.
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_config_target() -> String {
    "main".to_string()
}

impl Default for DrayConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            environment: default_environment(),
            config_target: default_config_target(),
            targets: Vec::new(),
            paths: BTreeMap::new(),
            bundles: Vec::new(),
            plugins: Vec::new(),
            dependencies: Vec::new(),
        }
    }
}

impl DrayConfig {
    /// Create from `serde_json::Value` (for programmatic config).
    ///
    /// # Example
    ///
    /// ```
    /// use dray_config::DrayConfig;
    /// use serde_json::json;
    ///
    /// let config = DrayConfig::from_value(json!({
    ///     "root": "/proj",
    ///     "bundles": [{ "name": "main" }]
    /// })).unwrap();
    /// assert_eq!(config.bundles[0].name, "main");
    /// ```
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue(e.to_string()))
    }

    /// Convert to `serde_json::Value`.
    pub fn to_value(&self) -> Result<Value, ConfigError> {
        serde_json::to_value(self).map_err(|e| ConfigError::InvalidValue(e.to_string()))
    }

    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.targets.push(target.into());
        self
    }

    pub fn with_bundle(mut self, bundle: BundleSpec) -> Self {
        self.bundles.push(bundle);
        self
    }

    pub fn with_plugin(mut self, plugin: PluginSpec) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn with_path(mut self, name: impl Into<String>, location: impl Into<String>) -> Self {
        self.paths.insert(name.into(), location.into());
        self
    }

    /// Look up a declared bundle spec by name.
    pub fn bundle(&self, name: &str) -> Option<&BundleSpec> {
        self.bundles.iter().find(|b| b.name == name)
    }
}

/// Declaration of one output bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleSpec {
    /// Bundle name; also the config-target match key and the output stem.
    pub name: String,

    /// Glob patterns an item path must match to be accepted.
    ///
    /// Empty means the bundle accepts everything not excluded.
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns that reject an item even when included.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Dependencies this bundle configures during its transform.
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
}

impl BundleSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include.push(pattern.into());
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    pub fn dependency(mut self, dep: impl Into<DependencyRef>) -> Self {
        self.dependencies.push(dep.into());
        self
    }
}

/// A loader plugin registration.
///
/// Plugins only matter to the orchestrator through their name and whether
/// they are stubbed out of the build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginSpec {
    pub name: String,

    /// Stub plugins resolve to a no-op stand-in and are never trace-cached.
    #[serde(default)]
    pub stub: bool,
}

impl PluginSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stub: false,
        }
    }

    pub fn stubbed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stub: true,
        }
    }
}

/// A dependency reference, as written in config or passed by callers.
///
/// Either a bare name handed to package analysis, or an already-shaped spec
/// handed to reverse-engineering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyRef {
    ByName(String),
    Resolved(DependencySpec),
}

impl DependencyRef {
    /// The dependency identifier, for logging and error reporting.
    pub fn name(&self) -> &str {
        match self {
            DependencyRef::ByName(name) => name,
            DependencyRef::Resolved(spec) => &spec.name,
        }
    }
}

impl From<&str> for DependencyRef {
    fn from(name: &str) -> Self {
        DependencyRef::ByName(name.to_string())
    }
}

impl From<DependencySpec> for DependencyRef {
    fn from(spec: DependencySpec) -> Self {
        DependencyRef::Resolved(spec)
    }
}

/// A user-supplied dependency shape for reverse-engineering.
///
/// Any field beyond the name may be omitted; the analyzer fills gaps from
/// the package's own manifest when it can.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deps: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<String>,
}

impl DependencySpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_ref_deserializes_both_shapes() {
        let refs: Vec<DependencyRef> = serde_json::from_str(
            r#"["underscore", {"name": "backbone", "exports": "Backbone"}]"#,
        )
        .unwrap();

        assert_eq!(refs[0], DependencyRef::ByName("underscore".into()));
        match &refs[1] {
            DependencyRef::Resolved(spec) => {
                assert_eq!(spec.name, "backbone");
                assert_eq!(spec.exports.as_deref(), Some("Backbone"));
            }
            other => panic!("expected resolved spec, got {other:?}"),
        }
    }

    #[test]
    fn config_defaults_are_sensible() {
        let config = DrayConfig::default();
        assert_eq!(config.root, PathBuf::from("."));
        assert_eq!(config.environment, "dev");
        assert_eq!(config.config_target, "main");
        assert!(config.bundles.is_empty());
    }

    #[test]
    fn toml_config_parses() {
        let toml = r#"
            root = "/proj"
            environment = "stage"
            config_target = "app"
            targets = ["build/out"]

            [paths]
            plugins = "/proj/plugins"

            [[bundles]]
            name = "vendor"
            include = ["lib/**"]
            dependencies = ["underscore", { name = "backbone", exports = "Backbone" }]

            [[bundles]]
            name = "app"

            [[plugins]]
            name = "css"
            stub = true
        "#;

        let value: toml::Value = toml::from_str(toml).unwrap();
        let json = serde_json::to_value(value).unwrap();
        let config = DrayConfig::from_value(json).unwrap();

        assert_eq!(config.config_target, "app");
        assert_eq!(config.bundles.len(), 2);
        assert_eq!(config.bundles[0].dependencies.len(), 2);
        assert!(config.plugins[0].stub);
        assert_eq!(config.bundle("app").unwrap().name, "app");
    }
}
