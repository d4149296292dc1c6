//! Module-loader configuration shapes.
//!
//! These are the wire shapes the config-bearing bundle embeds at write time,
//! and the shapes package analysis produces. Field names are pinned to the
//! loader's expected spelling (`baseUrl`, `stubModules`), so everything here
//! serializes with camelCase renames.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Assembled module-loader configuration.
///
/// One instance exists per bundler run. It is grown incrementally by plugin
/// registration and by each successful dependency analysis, and is never
/// reset mid-build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderConfig {
    /// Root path all relative locations resolve against.
    pub base_url: String,

    /// Raw path mappings: module name to location relative to `base_url`.
    ///
    /// A name present here is never also present in `packages`.
    #[serde(default)]
    pub paths: BTreeMap<String, String>,

    /// Package descriptors for dependencies that declare an entry point.
    #[serde(default)]
    pub packages: Vec<PackageEntry>,

    /// Shim metadata for dependencies that are not module-aware.
    #[serde(default)]
    pub shim: BTreeMap<String, ShimConfig>,

    /// Module names resolved to a no-op stand-in instead of real code.
    ///
    /// Insertion-ordered and duplicate-free; stubbed names are excluded
    /// from the trace-cache export.
    #[serde(default)]
    pub stub_modules: Vec<String>,
}

impl LoaderConfig {
    /// Create an empty config rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// True when nothing beyond the root has been configured.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
            && self.packages.is_empty()
            && self.shim.is_empty()
            && self.stub_modules.is_empty()
    }
}

/// A `packages` entry: a dependency with an explicit entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntry {
    pub name: String,
    pub location: String,
    pub main: String,
}

/// Shim metadata for one module name.
///
/// Entries may be partial: only the fields the descriptor carried are
/// written, and a later descriptor for the same name fills in the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShimConfig {
    /// Implicit dependencies that must load first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deps: Option<Vec<String>>,

    /// Global symbol the shimmed script exports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<String>,
}

/// Result of analyzing one dependency.
///
/// `main` decides how the descriptor lands in [`LoaderConfig`]: present
/// means a package entry, absent means a raw `paths` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDescriptor {
    pub name: String,
    /// Location of the dependency, relative to the loader's `base_url`.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deps: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<String>,
}

impl DependencyDescriptor {
    /// Descriptor with only a name and a location.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            main: None,
            deps: None,
            exports: None,
        }
    }

    pub fn with_main(mut self, main: impl Into<String>) -> Self {
        self.main = Some(main.into());
        self
    }

    pub fn with_deps(mut self, deps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.deps = Some(deps.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_exports(mut self, exports: impl Into<String>) -> Self {
        self.exports = Some(exports.into());
        self
    }

    /// True when the descriptor carries shim metadata.
    pub fn has_shim(&self) -> bool {
        self.deps.is_some() || self.exports.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_config_serializes_with_loader_spelling() {
        let mut config = LoaderConfig::new("/proj");
        config.paths.insert("underscore".into(), "lib/underscore".into());
        config.packages.push(PackageEntry {
            name: "when".into(),
            location: "lib/when".into(),
            main: "when".into(),
        });
        config.stub_modules.push("css".into());

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["baseUrl"], "/proj");
        assert_eq!(value["paths"]["underscore"], "lib/underscore");
        assert_eq!(value["packages"][0]["location"], "lib/when");
        assert_eq!(value["stubModules"][0], "css");
    }

    #[test]
    fn partial_shim_omits_absent_fields() {
        let shim = ShimConfig {
            deps: Some(vec!["jquery".into()]),
            exports: None,
        };
        let value = serde_json::to_value(&shim).unwrap();
        assert_eq!(value["deps"][0], "jquery");
        assert!(value.get("exports").is_none());
    }

    #[test]
    fn descriptor_builder_round_trips() {
        let desc = DependencyDescriptor::new("backbone", "lib/backbone")
            .with_deps(["underscore", "jquery"])
            .with_exports("Backbone");

        assert!(desc.has_shim());
        assert!(desc.main.is_none());

        let json = serde_json::to_string(&desc).unwrap();
        let back: DependencyDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, desc);
    }
}
