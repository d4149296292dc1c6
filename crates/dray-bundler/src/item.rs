//! Source item registry.
//!
//! Every file handed to the bundler becomes an [`Item`] registered under a
//! normalized path key. Items are shared: a bundle that accepts one holds the
//! same allocation the registry does, so a later [`ItemRegistry::update`] is
//! visible everywhere without re-assignment.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use path_clean::PathClean;
use rustc_hash::FxHashMap;

/// Shared handle to a registered item.
pub type SharedItem = Arc<RwLock<Item>>;

/// Input description of a source file.
///
/// All fields except the path are optional; absent fields leave the stored
/// item untouched on [`ItemRegistry::update`].
#[derive(Debug, Clone, Default)]
pub struct SourceFile {
    pub path: PathBuf,
    pub module_id: Option<String>,
    pub deps: Option<Vec<String>>,
    pub contents: Option<String>,
    pub requires_transform: Option<bool>,
    pub env: Option<String>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_module_id(mut self, id: impl Into<String>) -> Self {
        self.module_id = Some(id.into());
        self
    }

    pub fn with_deps(mut self, deps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.deps = Some(deps.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_contents(mut self, contents: impl Into<String>) -> Self {
        self.contents = Some(contents.into());
        self
    }

    pub fn with_requires_transform(mut self, flag: bool) -> Self {
        self.requires_transform = Some(flag);
        self
    }

    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }
}

/// One registered source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Normalized path key, unique across the registry.
    pub key: String,
    /// Path exactly as first registered.
    pub path: PathBuf,
    /// Module identity once analysis has produced one.
    pub module_id: Option<String>,
    /// Resolved dependency ids, in declaration order.
    pub deps: Option<Vec<String>>,
    pub contents: Option<String>,
    /// True while the stored contents are not cache-safe.
    pub requires_transform: bool,
    /// Environment gate, e.g. `"dev & stage"`.
    pub env: Option<String>,
    /// Name of the bundle that accepted this item, if any did.
    pub owner: Option<String>,
}

impl Item {
    fn from_file(key: String, file: &SourceFile) -> Self {
        Self {
            key,
            path: file.path.clone(),
            module_id: file.module_id.clone(),
            deps: file.deps.clone(),
            contents: file.contents.clone(),
            requires_transform: file.requires_transform.unwrap_or(false),
            env: file.env.clone(),
            owner: None,
        }
    }

    /// Fold a fresh file description into this item. Present fields
    /// overwrite, absent fields persist.
    pub fn update(&mut self, file: &SourceFile) {
        if let Some(id) = &file.module_id {
            self.module_id = Some(id.clone());
        }
        if let Some(deps) = &file.deps {
            self.deps = Some(deps.clone());
        }
        if let Some(contents) = &file.contents {
            self.contents = Some(contents.clone());
        }
        if let Some(flag) = file.requires_transform {
            self.requires_transform = flag;
        }
        if let Some(env) = &file.env {
            self.env = Some(env.clone());
        }
    }

    /// Whether this item participates in a build for `environment`.
    ///
    /// The gate is a membership test, not a conjunction: `"dev & stage"`
    /// names the set of environments the item belongs to, so it passes when
    /// the current environment is either one. Parts are trimmed and
    /// lower-cased before comparison. Ungated items always pass.
    pub fn included_in_build(&self, environment: &str) -> bool {
        match &self.env {
            None => true,
            Some(gate) => gate
                .split('&')
                .any(|part| part.trim().to_ascii_lowercase() == environment),
        }
    }
}

/// Reduce a path to the key form used for registry lookups.
///
/// Separators become `/`, `.` and `..` segments are resolved lexically, and
/// a leading `./` is dropped, so `./src/a.js` and `src/./a.js` collide.
pub fn normalize_key(path: &Path) -> String {
    path.clean().to_string_lossy().replace('\\', "/")
}

/// Insertion-ordered item store with path-keyed deduplication.
#[derive(Debug, Default)]
pub struct ItemRegistry {
    items: Vec<SharedItem>,
    index: FxHashMap<String, usize>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file, or return the existing item when the normalized
    /// path is already known. The flag reports whether a new item was
    /// created; an existing item is returned untouched.
    pub fn insert(&mut self, file: &SourceFile) -> (SharedItem, bool) {
        let key = normalize_key(&file.path);
        if let Some(&pos) = self.index.get(&key) {
            return (Arc::clone(&self.items[pos]), false);
        }
        let item = Arc::new(RwLock::new(Item::from_file(key.clone(), file)));
        self.index.insert(key, self.items.len());
        self.items.push(Arc::clone(&item));
        (item, true)
    }

    /// Register a file, folding its fields into the existing item when the
    /// path is already known. Identity is preserved: every holder of the
    /// item observes the merge.
    pub fn update(&mut self, file: &SourceFile) -> (SharedItem, bool) {
        let key = normalize_key(&file.path);
        if let Some(&pos) = self.index.get(&key) {
            let item = Arc::clone(&self.items[pos]);
            item.write().update(file);
            return (item, false);
        }
        self.insert(file)
    }

    /// Look an item up by any spelling of its path.
    pub fn by_path(&self, path: impl AsRef<Path>) -> Option<SharedItem> {
        let key = normalize_key(path.as_ref());
        self.index.get(&key).map(|&pos| Arc::clone(&self.items[pos]))
    }

    /// Items in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &SharedItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
