//! Bundle handles and assignment.
//!
//! A [`Bundle`] is one output grouping of items. Bundles claim items through
//! first-match subsumption: the [`BundleSet`] offers each new item to every
//! bundle in declaration order and stops at the first acceptance, so an item
//! belongs to at most one bundle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use dray_config::BundleSpec;

use crate::analyze::DependencyConfigurator;
use crate::item::SharedItem;
use crate::loader::LoaderConfigBuilder;
use crate::writer;
use crate::{Error, Result};

/// Shared build state a bundle keeps hold of.
///
/// Everything here is a cheap clone of per-build shared handles, so entries
/// one bundle adds to the loader config are visible to every other bundle.
#[derive(Clone)]
pub struct BundleContext {
    pub loader: LoaderConfigBuilder,
    pub configurator: DependencyConfigurator,
    pub environment: String,
    pub config_target: String,
}

/// One output grouping of items.
#[async_trait]
pub trait Bundle: Send + Sync {
    /// The declaration this bundle was created from.
    fn config(&self) -> &BundleSpec;

    /// Offer an item. Returning true claims it for this bundle.
    fn try_subsume(&mut self, item: &SharedItem) -> bool;

    /// Take an item unconditionally (explicit inclusion).
    fn adopt(&mut self, item: SharedItem);

    /// Rewrite the bundle's output. Runs once per build; may configure
    /// dependencies and extend the shared loader config.
    async fn transform(&mut self) -> Result<()>;

    /// Serialize the bundle into the target directory.
    async fn write(&self, target: &Path) -> Result<()>;

    /// Locations of the dependencies this bundle configured.
    fn dependency_locations(&self) -> Vec<PathBuf>;

    /// Items claimed so far, in acceptance order.
    fn items(&self) -> &[SharedItem];
}

/// Constructs bundle handles from their declarations.
#[async_trait]
pub trait BundleFactory: Send + Sync {
    async fn create(&self, context: &BundleContext, config: &BundleSpec)
    -> Result<Box<dyn Bundle>>;
}

/// Declaration-ordered collection of bundles.
#[derive(Default)]
pub struct BundleSet {
    bundles: Vec<Box<dyn Bundle>>,
}

impl BundleSet {
    pub fn new(bundles: Vec<Box<dyn Bundle>>) -> Self {
        Self { bundles }
    }

    /// Offer an item to each bundle in order; the first acceptance wins and
    /// is recorded as the item's owner. Returns the accepting bundle's name,
    /// or None when every bundle declined.
    pub fn subsume(&mut self, item: &SharedItem) -> Option<&str> {
        let pos = self.bundles.iter_mut().position(|b| b.try_subsume(item))?;
        let name = self.bundles[pos].config().name.as_str();
        item.write().owner = Some(name.to_string());
        Some(name)
    }

    /// Place an item into the named bundle, bypassing subsumption.
    pub fn adopt_into(&mut self, name: &str, item: &SharedItem) -> Result<()> {
        let bundle = self
            .bundles
            .iter_mut()
            .find(|b| b.config().name == name)
            .ok_or_else(|| Error::UnknownBundle(name.to_string()))?;
        item.write().owner = Some(name.to_string());
        bundle.adopt(Arc::clone(item));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Bundle> {
        self.bundles
            .iter()
            .find(|b| b.config().name == name)
            .map(AsRef::as_ref)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.bundles.iter().position(|b| b.config().name == name)
    }

    /// Move the bundle at `pos` to the back of the order.
    pub fn shift_to_end(&mut self, pos: usize) {
        let bundle = self.bundles.remove(pos);
        self.bundles.push(bundle);
    }

    /// Bundles in their current order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Bundle> {
        self.bundles.iter().map(AsRef::as_ref)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Bundle>> {
        self.bundles.iter_mut()
    }

    pub fn names(&self) -> Vec<&str> {
        self.bundles
            .iter()
            .map(|b| b.config().name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

/// Compiled include/exclude predicate over registry keys.
struct BundleMatcher {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl BundleMatcher {
    fn compile(config: &BundleSpec) -> Result<Self> {
        Ok(Self {
            include: build_globset(&config.name, &config.include)?,
            exclude: build_globset(&config.name, &config.exclude)?,
        })
    }

    /// An empty include list accepts everything not excluded.
    fn matches(&self, key: &str) -> bool {
        let included = self.include.as_ref().is_none_or(|set| set.is_match(key));
        let excluded = self
            .exclude
            .as_ref()
            .is_some_and(|set| set.is_match(key));
        included && !excluded
    }
}

fn build_globset(bundle: &str, patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|err| {
            Error::InvalidBundle(format!("bundle '{bundle}': bad pattern '{pattern}': {err}"))
        })?;
        builder.add(glob);
    }
    let set = builder.build().map_err(|err| {
        Error::InvalidBundle(format!("bundle '{bundle}': {err}"))
    })?;
    Ok(Some(set))
}

/// The shipped bundle implementation.
///
/// Claims items whose registry key matches the declaration's include globs,
/// concatenates their contents at transform time, and writes `<name>.js`
/// into the build target. When this bundle is the config target, the final
/// loader config is embedded ahead of the body.
pub struct FileBundle {
    config: BundleSpec,
    context: BundleContext,
    matcher: BundleMatcher,
    items: Vec<SharedItem>,
    rendered: Option<String>,
    dependency_locations: Vec<PathBuf>,
}

impl std::fmt::Debug for FileBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBundle")
            .field("config", &self.config)
            .field("items", &self.items)
            .field("rendered", &self.rendered)
            .field("dependency_locations", &self.dependency_locations)
            .finish_non_exhaustive()
    }
}

impl FileBundle {
    pub fn new(context: BundleContext, config: BundleSpec) -> Result<Self> {
        if config.name.is_empty() {
            return Err(Error::InvalidBundle("bundle name must not be empty".into()));
        }
        let matcher = BundleMatcher::compile(&config)?;
        Ok(Self {
            config,
            context,
            matcher,
            items: Vec::new(),
            rendered: None,
            dependency_locations: Vec::new(),
        })
    }

    /// The transform output, if a transform has run.
    pub fn rendered(&self) -> Option<&str> {
        self.rendered.as_deref()
    }

    /// Concatenate the claimed items that pass the environment gate and
    /// carry contents, in acceptance order.
    fn render_body(&self) -> String {
        let mut body = String::new();
        for item in &self.items {
            let item = item.read();
            if !item.included_in_build(&self.context.environment) {
                continue;
            }
            let Some(contents) = &item.contents else {
                continue;
            };
            body.push_str(&format!("// dray:include {}\n", item.key));
            body.push_str(contents);
            if !contents.ends_with('\n') {
                body.push('\n');
            }
        }
        body
    }
}

#[async_trait]
impl Bundle for FileBundle {
    fn config(&self) -> &BundleSpec {
        &self.config
    }

    fn try_subsume(&mut self, item: &SharedItem) -> bool {
        let key = item.read().key.clone();
        if !self.matcher.matches(&key) {
            return false;
        }
        self.items.push(Arc::clone(item));
        true
    }

    fn adopt(&mut self, item: SharedItem) {
        self.items.push(item);
    }

    async fn transform(&mut self) -> Result<()> {
        // Dependencies first: their descriptors feed the loader config this
        // bundle's output may end up embedding.
        for dependency in self.config.dependencies.clone() {
            let descriptor = self.context.configurator.configure(&dependency).await?;
            self.dependency_locations.push(PathBuf::from(descriptor.path));
        }
        self.rendered = Some(self.render_body());
        Ok(())
    }

    async fn write(&self, target: &Path) -> Result<()> {
        let body = match &self.rendered {
            Some(rendered) => rendered.clone(),
            None => self.render_body(),
        };
        let mut output = String::new();
        if self.config.name == self.context.config_target {
            let snapshot = self.context.loader.snapshot();
            output.push_str(&format!(
                "require.config({});\n",
                serde_json::to_string_pretty(&snapshot)?
            ));
        }
        output.push_str(&body);

        let path = writer::resolve_output_path(target, &format!("{}.js", self.config.name))?;
        writer::write_atomic(&path, output.as_bytes()).await?;
        debug!(bundle = %self.config.name, path = %path.display(), bytes = output.len(), "bundle written");
        Ok(())
    }

    fn dependency_locations(&self) -> Vec<PathBuf> {
        self.dependency_locations.clone()
    }

    fn items(&self) -> &[SharedItem] {
        &self.items
    }
}

/// Factory for [`FileBundle`] handles.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileBundleFactory;

#[async_trait]
impl BundleFactory for FileBundleFactory {
    async fn create(
        &self,
        context: &BundleContext,
        config: &BundleSpec,
    ) -> Result<Box<dyn Bundle>> {
        Ok(Box::new(FileBundle::new(context.clone(), config.clone())?))
    }
}
