//! Module cache keyed by absolute path.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::Loader;
use crate::module::Export;

/// Loader cache: repeated imports of a path share one loaded export until it
/// is evicted.
pub struct ModuleCache<L> {
    loader: L,
    entries: RwLock<FxHashMap<PathBuf, Export>>,
}

impl<L: Loader> ModuleCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Return the cached export for `path`, loading it on a miss.
    ///
    /// The loader runs without holding the cache lock, so a slow load only
    /// delays importers of that path. A failed load caches nothing.
    pub fn import(&self, path: &Path) -> anyhow::Result<Export> {
        if let Some(export) = self.entries.read().get(path) {
            crate::debug!("hot"; "cache hit: {}", path.display());
            return Ok(export.clone());
        }

        let export = self.loader.load(path)?;

        // Racing importers of the same path: the first insert wins.
        let mut entries = self.entries.write();
        Ok(entries
            .entry(path.to_path_buf())
            .or_insert(export)
            .clone())
    }

    /// Remove the entry for `path`, handing it back for a later [`reinsert`].
    ///
    /// [`reinsert`]: ModuleCache::reinsert
    pub fn evict(&self, path: &Path) -> Option<Export> {
        let evicted = self.entries.write().remove(path);
        if evicted.is_none() {
            crate::debug!("hot"; "evict: no cache entry for {}", path.display());
        }
        evicted
    }

    /// Put a previously evicted entry back.
    pub fn reinsert(&self, path: &Path, entry: Export) {
        self.entries.write().insert(path.to_path_buf(), entry);
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.read().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
