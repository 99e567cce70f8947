//! Module, proxy and watcher stores, keyed by absolute path.
//!
//! The module store and the proxy store share one [`ModuleCell`] per path: the
//! store swaps the cell's content on reload and every handle reads through the
//! same cell, so handles never need to be re-synchronized.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use super::handle::Handle;
use super::watcher::ChangeWatcher;
use crate::module::Export;

// ============================================================================
// Module Store
// ============================================================================

/// Per-path reload state, held for the whole evict/load/swap sequence.
#[derive(Debug, Default)]
pub(crate) struct ReloadGate {
    /// Content hash of the last successfully loaded source.
    pub(crate) fingerprint: Option<u64>,
}

/// Indirection cell holding the current export of one module.
pub(crate) struct ModuleCell {
    path: PathBuf,
    current: ArcSwap<Export>,
    /// Number of successful loads, starting at 1.
    version: AtomicU64,
    pub(crate) gate: Mutex<ReloadGate>,
}

impl ModuleCell {
    fn new(path: PathBuf, export: Export, fingerprint: Option<u64>) -> Self {
        Self {
            path,
            current: ArcSwap::from_pointee(export),
            version: AtomicU64::new(1),
            gate: Mutex::new(ReloadGate { fingerprint }),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub(crate) fn load(&self) -> Arc<Export> {
        self.current.load_full()
    }

    pub(crate) fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Swap in a freshly loaded export, returning the new version.
    pub(crate) fn replace(&self, export: Export) -> u64 {
        self.current.store(Arc::new(export));
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[derive(Default)]
pub(crate) struct ModuleStore {
    cells: RwLock<FxHashMap<PathBuf, Arc<ModuleCell>>>,
}

impl ModuleStore {
    pub(crate) fn get(&self, path: &Path) -> Option<Arc<ModuleCell>> {
        self.cells.read().get(path).cloned()
    }

    pub(crate) fn contains(&self, path: &Path) -> bool {
        self.cells.read().contains_key(path)
    }

    /// Create the cell for a first load.
    ///
    /// If another importer created it meanwhile, that cell is kept and
    /// `export` is discarded: the store is only ever replaced by a reload.
    pub(crate) fn insert_new(
        &self,
        path: &Path,
        export: Export,
        fingerprint: Option<u64>,
    ) -> Arc<ModuleCell> {
        let mut cells = self.cells.write();
        let cell = cells
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(ModuleCell::new(path.to_path_buf(), export, fingerprint)));
        Arc::clone(cell)
    }

    pub(crate) fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.cells.read().keys().cloned().collect();
        paths.sort();
        paths
    }
}

// ============================================================================
// Proxy Store
// ============================================================================

#[derive(Default)]
pub(crate) struct ProxyStore {
    handles: RwLock<FxHashMap<PathBuf, Handle>>,
}

impl ProxyStore {
    pub(crate) fn get(&self, path: &Path) -> Option<Handle> {
        self.handles.read().get(path).cloned()
    }

    /// The handle for `cell`, created on first request and never replaced.
    pub(crate) fn get_or_create(&self, cell: &Arc<ModuleCell>) -> Handle {
        if let Some(handle) = self.get(cell.path()) {
            return handle;
        }
        let mut handles = self.handles.write();
        handles
            .entry(cell.path().to_path_buf())
            .or_insert_with(|| Handle::new(Arc::clone(cell)))
            .clone()
    }

    /// Path of the module a handle was issued for, if issued by this store.
    pub(crate) fn find(&self, handle: &Handle) -> Option<PathBuf> {
        self.handles
            .read()
            .iter()
            .find(|(_, issued)| issued.ptr_eq(handle))
            .map(|(path, _)| path.clone())
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.handles.read().len()
    }
}

// ============================================================================
// Watcher Store
// ============================================================================

#[derive(Default)]
pub(crate) struct WatcherStore {
    watchers: Mutex<FxHashMap<PathBuf, ChangeWatcher>>,
}

impl WatcherStore {
    /// Insert the watcher built by `spawn` unless `path` is already watched.
    ///
    /// Check and insert happen under one lock, so concurrent callers never
    /// attach two watchers to a path. Returns `Ok(false)` when already watched.
    pub(crate) fn insert_with<E>(
        &self,
        path: &Path,
        spawn: impl FnOnce() -> Result<ChangeWatcher, E>,
    ) -> Result<bool, E> {
        let mut watchers = self.watchers.lock();
        if watchers.contains_key(path) {
            return Ok(false);
        }
        watchers.insert(path.to_path_buf(), spawn()?);
        Ok(true)
    }

    pub(crate) fn remove(&self, path: &Path) -> Option<ChangeWatcher> {
        self.watchers.lock().remove(path)
    }

    pub(crate) fn contains(&self, path: &Path) -> bool {
        self.watchers.lock().contains_key(path)
    }

    pub(crate) fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.watchers.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.watchers.lock().len()
    }
}
