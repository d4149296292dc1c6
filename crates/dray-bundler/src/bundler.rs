//! The bundling orchestrator.
//!
//! A [`Bundler`] owns the canonical item registry for one build, the bundle
//! set items are assigned into, and the loader config being assembled. All
//! mutation of that shared state goes through the operations here; nothing
//! is process-global.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future;
use tracing::{debug, warn};

use dray_config::{
    DependencyDescriptor, DependencyRef, DrayConfig, LoaderConfig, relativize_named_paths,
};

use crate::analyze::{DependencyConfigurator, PackageAnalyzer};
use crate::bundle::{BundleContext, BundleFactory, BundleSet};
use crate::item::{ItemRegistry, SharedItem, SourceFile};
use crate::loader::LoaderConfigBuilder;
use crate::trace::{self, TraceEntry};
use crate::{Error, Result, pipeline};

/// Orchestrates one build: item registration, bundle assignment, dependency
/// configuration, the transform pipeline, and output.
pub struct Bundler {
    config: DrayConfig,
    registry: ItemRegistry,
    bundles: BundleSet,
    loader: LoaderConfigBuilder,
    configurator: DependencyConfigurator,
}

impl Bundler {
    /// Construct a bundler from a build configuration.
    ///
    /// Configured named paths are relativized against the root first (each
    /// rewrite is reported as a warning, never an error), the loader config
    /// is seeded from them, plugins are registered, and every declared
    /// bundle is created. Creation runs concurrently; there is no ordering
    /// dependency between bundles at this stage, and any single failure
    /// fails construction as a whole.
    pub async fn create(
        mut config: DrayConfig,
        analyzer: Arc<dyn PackageAnalyzer>,
        factory: &dyn BundleFactory,
    ) -> Result<Self> {
        let rewrites = relativize_named_paths(&config.root, &mut config.paths);
        if !rewrites.is_empty() {
            debug!(count = rewrites.len(), "relativized configured paths");
        }

        let loader = LoaderConfigBuilder::new(config.root.to_string_lossy());
        loader.seed_paths(config.paths.clone());
        for plugin in &config.plugins {
            loader.register_plugin(plugin);
        }

        let configurator = DependencyConfigurator::new(analyzer, loader.clone());
        let context = BundleContext {
            loader: loader.clone(),
            configurator: configurator.clone(),
            environment: config.environment.clone(),
            config_target: config.config_target.clone(),
        };

        let created = future::try_join_all(
            config
                .bundles
                .iter()
                .map(|spec| factory.create(&context, spec)),
        )
        .await?;

        debug!(
            bundles = created.len(),
            environment = %config.environment,
            "bundler created"
        );

        Ok(Self {
            config,
            registry: ItemRegistry::new(),
            bundles: BundleSet::new(created),
            loader,
            configurator,
        })
    }

    /// Register a file. A path-equivalent registration returns the existing
    /// item untouched; a new item is assigned to a bundle, either the named
    /// `inclusion` or whichever bundle subsumes it first.
    pub fn add_file(&mut self, file: SourceFile, inclusion: Option<&str>) -> Result<SharedItem> {
        let (item, created) = self.registry.insert(&file);
        if created {
            self.assign(&item, inclusion)?;
        }
        Ok(item)
    }

    /// Register a file, folding its fields into the existing item when the
    /// path is already known. Identity is preserved: bundles holding the
    /// item observe the merge without re-assignment.
    pub fn update_file(&mut self, file: SourceFile, inclusion: Option<&str>) -> Result<SharedItem> {
        let (item, created) = self.registry.update(&file);
        if created {
            self.assign(&item, inclusion)?;
        }
        Ok(item)
    }

    fn assign(&mut self, item: &SharedItem, inclusion: Option<&str>) -> Result<()> {
        match inclusion {
            Some(name) => self.bundles.adopt_into(name, item),
            None => {
                if self.bundles.subsume(item).is_none() {
                    debug!(path = %item.read().key, "no bundle accepted item");
                }
                Ok(())
            }
        }
    }

    /// Exact lookup by any spelling of a registered path.
    pub fn item_by_path(&self, path: impl AsRef<Path>) -> Option<SharedItem> {
        self.registry.by_path(path)
    }

    /// Whether an item participates in builds for the configured
    /// environment.
    pub fn item_included_in_build(&self, item: &SharedItem) -> bool {
        item.read().included_in_build(&self.config.environment)
    }

    /// Analyze one dependency and fold the result into the loader config.
    pub async fn configure_dependency(
        &self,
        dependency: impl Into<DependencyRef>,
    ) -> Result<DependencyDescriptor> {
        self.configurator.configure(&dependency.into()).await
    }

    /// Run the build pipeline: every bundle transform in declaration order,
    /// then the config-target bundle moved to the final write position.
    ///
    /// Items no bundle accepted are reported as a warning first; they will
    /// be absent from every output.
    pub async fn build(&mut self) -> Result<()> {
        let orphans = self.orphans();
        if !orphans.is_empty() {
            let paths: Vec<String> = orphans
                .iter()
                .map(|item| item.read().key.clone())
                .collect();
            warn!(
                count = paths.len(),
                paths = %paths.join(", "),
                "items not accepted by any bundle will be absent from every output"
            );
        }

        pipeline::run_transforms(&mut self.bundles).await?;
        pipeline::reorder_for_config_target(&mut self.bundles, &self.config.config_target)
    }

    /// Write every bundle against the primary build target.
    ///
    /// Writes run concurrently and the call completes only once all of them
    /// have finished. The bundle order set up by [`build`](Self::build) is
    /// the write order as far as sequencing matters to callers.
    pub async fn write(&self) -> Result<()> {
        let target = self.config.targets.first().ok_or(Error::NoTargets)?;
        future::try_join_all(self.bundles.iter().map(|bundle| bundle.write(target))).await?;
        debug!(target = %target.display(), bundles = self.bundles.len(), "all bundles written");
        Ok(())
    }

    /// Every bundle's configured dependency locations, concatenated in
    /// bundle order.
    pub fn all_dependency_locations(&self) -> Vec<PathBuf> {
        self.bundles
            .iter()
            .flat_map(|bundle| bundle.dependency_locations())
            .collect()
    }

    /// Cache-safe registry snapshot for an external tracing step.
    pub fn trace_cache(&self) -> Vec<TraceEntry> {
        trace::collect(&self.registry, &self.loader)
    }

    /// Registered items no bundle accepted, in registration order.
    pub fn orphans(&self) -> Vec<SharedItem> {
        self.registry
            .iter()
            .filter(|item| item.read().owner.is_none())
            .cloned()
            .collect()
    }

    /// The loader config as assembled so far.
    pub fn loader_config(&self) -> LoaderConfig {
        self.loader.snapshot()
    }

    pub fn config(&self) -> &DrayConfig {
        &self.config
    }

    pub fn bundles(&self) -> &BundleSet {
        &self.bundles
    }

    pub fn item_count(&self) -> usize {
        self.registry.len()
    }
}
