//! Module-loader configuration assembly.
//!
//! A [`LoaderConfigBuilder`] is a cloneable handle over the loader config
//! being assembled for one build. The bundler, the dependency configurator,
//! and every bundle hold clones of the same handle, so entries added while
//! one bundle transforms are visible when a later bundle serializes.

use std::sync::Arc;

use parking_lot::RwLock;

use dray_config::{DependencyDescriptor, LoaderConfig, PackageEntry, PluginSpec};

/// Where a dependency descriptor lands in the loader config.
///
/// Presence of `main` is the discriminator: a descriptor with a main module
/// becomes a package record, one without becomes a plain path mapping. The
/// two are mutually exclusive for a single descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderEntry {
    Package {
        name: String,
        location: String,
        main: String,
    },
    Path {
        name: String,
        location: String,
    },
}

impl LoaderEntry {
    pub fn from_descriptor(descriptor: &DependencyDescriptor) -> Self {
        match &descriptor.main {
            Some(main) => LoaderEntry::Package {
                name: descriptor.name.clone(),
                location: descriptor.path.clone(),
                main: main.clone(),
            },
            None => LoaderEntry::Path {
                name: descriptor.name.clone(),
                location: descriptor.path.clone(),
            },
        }
    }
}

/// Cloneable handle over the loader configuration under assembly.
#[derive(Debug, Clone, Default)]
pub struct LoaderConfigBuilder {
    inner: Arc<RwLock<LoaderConfig>>,
}

impl LoaderConfigBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(LoaderConfig::new(base_url))),
        }
    }

    /// Seed named path mappings, typically from the build configuration.
    pub fn seed_paths(&self, paths: impl IntoIterator<Item = (String, String)>) {
        let mut config = self.inner.write();
        for (name, location) in paths {
            config.paths.insert(name, location);
        }
    }

    /// Record a loader plugin. Stub plugins land in `stubModules` exactly
    /// once; non-stub plugins leave the config untouched.
    pub fn register_plugin(&self, plugin: &PluginSpec) {
        if !plugin.stub {
            return;
        }
        let mut config = self.inner.write();
        if !config.stub_modules.iter().any(|name| name == &plugin.name) {
            config.stub_modules.push(plugin.name.clone());
        }
    }

    /// Fold an analyzed dependency into the config: a packages record or a
    /// paths mapping depending on `main`, plus a partial shim entry when the
    /// descriptor carries shim metadata.
    pub fn apply_descriptor(&self, descriptor: &DependencyDescriptor) {
        let mut config = self.inner.write();
        match LoaderEntry::from_descriptor(descriptor) {
            LoaderEntry::Package {
                name,
                location,
                main,
            } => {
                config.packages.push(PackageEntry {
                    name,
                    location,
                    main,
                });
            }
            LoaderEntry::Path { name, location } => {
                config.paths.insert(name, location);
            }
        }
        if descriptor.has_shim() {
            let shim = config.shim.entry(descriptor.name.clone()).or_default();
            if let Some(deps) = &descriptor.deps {
                shim.deps = Some(deps.clone());
            }
            if let Some(exports) = &descriptor.exports {
                shim.exports = Some(exports.clone());
            }
        }
    }

    /// Whether `module_id` is registered as a stubbed-out module.
    pub fn is_stub(&self, module_id: &str) -> bool {
        self.inner
            .read()
            .stub_modules
            .iter()
            .any(|name| name == module_id)
    }

    pub fn base_url(&self) -> String {
        self.inner.read().base_url.clone()
    }

    /// Copy of the config as assembled so far.
    pub fn snapshot(&self) -> LoaderConfig {
        self.inner.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_with_main_becomes_a_package() {
        let builder = LoaderConfigBuilder::new("src");
        builder.apply_descriptor(
            &DependencyDescriptor::new("when", "lib/when").with_main("when"),
        );

        let config = builder.snapshot();
        assert_eq!(
            config.packages,
            vec![PackageEntry {
                name: "when".into(),
                location: "lib/when".into(),
                main: "when".into(),
            }]
        );
        assert!(!config.paths.contains_key("when"));
    }

    #[test]
    fn descriptor_without_main_becomes_a_path() {
        let builder = LoaderConfigBuilder::new("src");
        builder.apply_descriptor(&DependencyDescriptor::new("underscore", "lib/underscore"));

        let config = builder.snapshot();
        assert_eq!(
            config.paths.get("underscore").map(String::as_str),
            Some("lib/underscore")
        );
        assert!(config.packages.is_empty());
    }

    #[test]
    fn shim_metadata_merges_into_one_entry() {
        let builder = LoaderConfigBuilder::new("src");
        builder.apply_descriptor(
            &DependencyDescriptor::new("backbone", "lib/backbone").with_deps(["underscore"]),
        );
        builder.apply_descriptor(
            &DependencyDescriptor::new("backbone", "lib/backbone").with_exports("Backbone"),
        );

        let config = builder.snapshot();
        let shim = config.shim.get("backbone").expect("shim entry");
        assert_eq!(shim.deps.as_deref(), Some(&["underscore".to_string()][..]));
        assert_eq!(shim.exports.as_deref(), Some("Backbone"));
    }

    #[test]
    fn stub_plugins_register_once() {
        let builder = LoaderConfigBuilder::new("src");
        let css = PluginSpec::stubbed("css");
        builder.register_plugin(&css);
        builder.register_plugin(&css);
        builder.register_plugin(&PluginSpec::new("text"));

        let config = builder.snapshot();
        assert_eq!(config.stub_modules, vec!["css".to_string()]);
        assert!(builder.is_stub("css"));
        assert!(!builder.is_stub("text"));
    }

    #[test]
    fn clones_share_state() {
        let builder = LoaderConfigBuilder::new("src");
        let clone = builder.clone();
        clone.apply_descriptor(&DependencyDescriptor::new("jquery", "lib/jquery"));
        assert!(builder.snapshot().paths.contains_key("jquery"));
    }

    #[test]
    fn seeded_paths_survive_snapshot() {
        let builder = LoaderConfigBuilder::new("app");
        builder.seed_paths([("templates".to_string(), "app/templates".to_string())]);
        assert_eq!(
            builder.snapshot().paths.get("templates").map(String::as_str),
            Some("app/templates")
        );
    }
}
