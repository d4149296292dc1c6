//! Dependency analysis.
//!
//! [`PackageAnalyzer`] is the seam between the bundler and whatever knows how
//! to resolve a dependency name to a location on disk. The shipped
//! [`FsPackageAnalyzer`] probes a packages directory and reads `package.json`
//! manifests; tests substitute their own implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};

use dray_config::{DependencyDescriptor, DependencyRef, DependencySpec};

use crate::loader::LoaderConfigBuilder;
use crate::{Error, Result};

/// Resolves dependencies to loader descriptors.
#[async_trait]
pub trait PackageAnalyzer: Send + Sync {
    /// Resolve a bare dependency name.
    async fn analyze(&self, name: &str) -> Result<DependencyDescriptor>;

    /// Derive a descriptor from an already-shaped dependency declaration,
    /// filling in only what the declaration leaves out.
    async fn reverse_engineer(&self, spec: &DependencySpec) -> Result<DependencyDescriptor>;
}

/// Runs analysis and folds each result into the shared loader config.
#[derive(Clone)]
pub struct DependencyConfigurator {
    analyzer: Arc<dyn PackageAnalyzer>,
    loader: LoaderConfigBuilder,
}

impl DependencyConfigurator {
    pub fn new(analyzer: Arc<dyn PackageAnalyzer>, loader: LoaderConfigBuilder) -> Self {
        Self { analyzer, loader }
    }

    /// Analyze one dependency and apply the outcome to the loader config.
    ///
    /// A failed analysis is logged and re-raised; the loader config is left
    /// exactly as it was.
    pub async fn configure(&self, dependency: &DependencyRef) -> Result<DependencyDescriptor> {
        let name = dependency.name().to_string();
        let analyzed = match dependency {
            DependencyRef::ByName(name) => self.analyzer.analyze(name).await,
            DependencyRef::Resolved(spec) => self.analyzer.reverse_engineer(spec).await,
        };
        match analyzed {
            Ok(descriptor) => {
                debug!(
                    dependency = %name,
                    location = %descriptor.path,
                    "dependency configured"
                );
                self.loader.apply_descriptor(&descriptor);
                Ok(descriptor)
            }
            Err(source) => {
                error!(dependency = %name, error = %source, "dependency analysis failed");
                Err(Error::AnalysisFailed {
                    dependency: name,
                    source: Box::new(source),
                })
            }
        }
    }
}

/// Manifests larger than this are rejected outright.
const MAX_MANIFEST_BYTES: u64 = 1024 * 1024;

/// Subset of `package.json` the analyzer reads.
#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    main: Option<String>,
    #[serde(default)]
    dray: ManifestExtras,
}

/// Tool-specific manifest section carrying shim metadata.
#[derive(Debug, Default, Deserialize)]
struct ManifestExtras {
    deps: Option<Vec<String>>,
    exports: Option<String>,
}

/// Analyzer that probes a packages directory on disk.
///
/// A dependency named `when` resolves to either `<packages>/when.js` (a bare
/// script, mapped through `paths`) or `<packages>/when/` (a package
/// directory whose `package.json` may declare a main module and shim
/// metadata). Emitted locations are relative to the project root.
pub struct FsPackageAnalyzer {
    root: PathBuf,
    packages_dir: PathBuf,
}

impl FsPackageAnalyzer {
    pub fn new(root: impl Into<PathBuf>, packages_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            packages_dir: packages_dir.into(),
        }
    }

    /// Project-relative location string, with `/` separators and no `.js`
    /// extension, as the loader expects.
    fn location_of(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let location = relative.to_string_lossy().replace('\\', "/");
        location
            .strip_suffix(".js")
            .map(str::to_owned)
            .unwrap_or(location)
    }

    async fn read_manifest(&self, dir: &Path, name: &str) -> Result<PackageManifest> {
        let path = dir.join("package.json");
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(_) => return Ok(PackageManifest::default()),
        };
        if metadata.len() > MAX_MANIFEST_BYTES {
            return Err(Error::PackageResolve {
                name: name.to_string(),
                reason: format!("manifest exceeds {MAX_MANIFEST_BYTES} bytes"),
            });
        }
        let raw = tokio::fs::read_to_string(&path).await?;
        serde_json::from_str(&raw).map_err(|err| Error::PackageResolve {
            name: name.to_string(),
            reason: format!("malformed package.json: {err}"),
        })
    }

    /// Find the on-disk form of a dependency: bare script or directory.
    async fn locate(&self, name: &str) -> Result<Located> {
        let script = self.packages_dir.join(format!("{name}.js"));
        if tokio::fs::metadata(&script)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            return Ok(Located::Script(script));
        }
        let dir = self.packages_dir.join(name);
        if tokio::fs::metadata(&dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            return Ok(Located::Directory(dir));
        }
        Err(Error::PackageResolve {
            name: name.to_string(),
            reason: format!("not found under {}", self.packages_dir.display()),
        })
    }
}

enum Located {
    Script(PathBuf),
    Directory(PathBuf),
}

/// Strip the `./` prefix and `.js` suffix a manifest main often carries.
fn normalize_main(main: &str) -> String {
    let main = main.strip_prefix("./").unwrap_or(main);
    main.strip_suffix(".js").unwrap_or(main).to_string()
}

#[async_trait]
impl PackageAnalyzer for FsPackageAnalyzer {
    async fn analyze(&self, name: &str) -> Result<DependencyDescriptor> {
        match self.locate(name).await? {
            Located::Script(path) => Ok(DependencyDescriptor::new(name, self.location_of(&path))),
            Located::Directory(dir) => {
                let manifest = self.read_manifest(&dir, name).await?;
                let mut descriptor = DependencyDescriptor::new(name, self.location_of(&dir));
                if let Some(main) = &manifest.main {
                    descriptor = descriptor.with_main(normalize_main(main));
                }
                if let Some(deps) = manifest.dray.deps {
                    descriptor.deps = Some(deps);
                }
                if let Some(exports) = manifest.dray.exports {
                    descriptor.exports = Some(exports);
                }
                Ok(descriptor)
            }
        }
    }

    async fn reverse_engineer(&self, spec: &DependencySpec) -> Result<DependencyDescriptor> {
        let path = match &spec.path {
            Some(path) => path.clone(),
            None => match self.locate(&spec.name).await? {
                Located::Script(path) | Located::Directory(path) => self.location_of(&path),
            },
        };
        let mut descriptor = DependencyDescriptor::new(&spec.name, path);
        descriptor.main = spec.main.clone();
        descriptor.deps = spec.deps.clone();
        descriptor.exports = spec.exports.clone();
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct StaticAnalyzer;

    #[async_trait]
    impl PackageAnalyzer for StaticAnalyzer {
        async fn analyze(&self, name: &str) -> Result<DependencyDescriptor> {
            match name {
                "when" => Ok(DependencyDescriptor::new("when", "lib/when").with_main("when")),
                other => Err(Error::PackageResolve {
                    name: other.to_string(),
                    reason: "unknown".into(),
                }),
            }
        }

        async fn reverse_engineer(&self, spec: &DependencySpec) -> Result<DependencyDescriptor> {
            Ok(DependencyDescriptor::new(
                &spec.name,
                spec.path.clone().unwrap_or_default(),
            ))
        }
    }

    #[tokio::test]
    async fn configure_applies_successful_analysis() {
        let loader = LoaderConfigBuilder::new("src");
        let configurator = DependencyConfigurator::new(Arc::new(StaticAnalyzer), loader.clone());

        let descriptor = configurator
            .configure(&DependencyRef::from("when"))
            .await
            .unwrap();

        assert_eq!(descriptor.path, "lib/when");
        assert_eq!(loader.snapshot().packages.len(), 1);
    }

    #[tokio::test]
    async fn configure_leaves_config_untouched_on_failure() {
        let loader = LoaderConfigBuilder::new("src");
        let configurator = DependencyConfigurator::new(Arc::new(StaticAnalyzer), loader.clone());

        let err = configurator
            .configure(&DependencyRef::from("zombie"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::AnalysisFailed { ref dependency, .. } if dependency == "zombie"
        ));
        assert!(loader.snapshot().is_empty());
    }

    #[test]
    fn main_normalization_strips_prefix_and_extension() {
        assert_eq!(normalize_main("./when.js"), "when");
        assert_eq!(normalize_main("lib/main.js"), "lib/main");
        assert_eq!(normalize_main("when"), "when");
    }

    #[tokio::test]
    async fn fs_analyzer_resolves_bare_scripts_to_paths() {
        let dir = TempDir::new().unwrap();
        let lib = dir.path().join("lib");
        fs::create_dir_all(&lib).unwrap();
        fs::write(lib.join("underscore.js"), "// underscore").unwrap();

        let analyzer = FsPackageAnalyzer::new(dir.path(), &lib);
        let descriptor = analyzer.analyze("underscore").await.unwrap();

        assert_eq!(descriptor.name, "underscore");
        assert_eq!(descriptor.path, "lib/underscore");
        assert!(descriptor.main.is_none());
    }

    #[tokio::test]
    async fn fs_analyzer_reads_package_manifests() {
        let dir = TempDir::new().unwrap();
        let pkg = dir.path().join("lib").join("when");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(
            pkg.join("package.json"),
            r#"{ "name": "when", "main": "./when.js" }"#,
        )
        .unwrap();

        let analyzer = FsPackageAnalyzer::new(dir.path(), dir.path().join("lib"));
        let descriptor = analyzer.analyze("when").await.unwrap();

        assert_eq!(descriptor.path, "lib/when");
        assert_eq!(descriptor.main.as_deref(), Some("when"));
    }

    #[tokio::test]
    async fn fs_analyzer_picks_up_shim_metadata() {
        let dir = TempDir::new().unwrap();
        let pkg = dir.path().join("lib").join("backbone");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(
            pkg.join("package.json"),
            r#"{ "dray": { "deps": ["underscore", "jquery"], "exports": "Backbone" } }"#,
        )
        .unwrap();

        let analyzer = FsPackageAnalyzer::new(dir.path(), dir.path().join("lib"));
        let descriptor = analyzer.analyze("backbone").await.unwrap();

        assert!(descriptor.main.is_none());
        assert_eq!(
            descriptor.deps.as_deref(),
            Some(&["underscore".to_string(), "jquery".to_string()][..])
        );
        assert_eq!(descriptor.exports.as_deref(), Some("Backbone"));
    }

    #[tokio::test]
    async fn fs_analyzer_rejects_missing_dependencies() {
        let dir = TempDir::new().unwrap();
        let analyzer = FsPackageAnalyzer::new(dir.path(), dir.path().join("lib"));
        let err = analyzer.analyze("phantom").await.unwrap_err();
        assert!(matches!(err, Error::PackageResolve { ref name, .. } if name == "phantom"));
    }

    #[tokio::test]
    async fn reverse_engineering_respects_declared_fields() {
        let dir = TempDir::new().unwrap();
        let analyzer = FsPackageAnalyzer::new(dir.path(), dir.path().join("lib"));

        let mut spec = DependencySpec::new("handlebars");
        spec.path = Some("vendor/handlebars".into());
        spec.exports = Some("Handlebars".into());

        let descriptor = analyzer.reverse_engineer(&spec).await.unwrap();
        assert_eq!(descriptor.path, "vendor/handlebars");
        assert_eq!(descriptor.exports.as_deref(), Some("Handlebars"));
        assert!(descriptor.main.is_none());
    }
}
