//! Hot import context.
//!
//! [`HotImport`] owns the three stores that make hot reloading work, all keyed
//! by the module's absolute path:
//!
//! - module store: the current export of every loaded module
//! - proxy store: the one [`Handle`] issued per module
//! - watcher store: the file watcher of every hot module
//!
//! ```ignore
//! let hot = HotImport::new(DataLoader);
//! let site = hot.import_from(file!(), "./site.json")?;
//! // edit site.json: `site` serves the new content, no re-import needed
//! println!("{:?}", site.value("title"));
//! ```
//!
//! Dropping the last clone of the context closes every watcher.

mod event;
mod handle;
mod reload;
mod store;
mod watcher;


use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam::channel::Receiver;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use self::event::EventBus;
use self::store::{ModuleCell, ModuleStore, ProxyStore, WatcherStore};
use self::watcher::ChangeWatcher;
use crate::config::HotConfig;
use crate::error::{HotError, Result};
use crate::loader::{DataLoader, Loader, ModuleCache};
use crate::resolve::{normalize_path, resolve_caller_path};
use crate::utils::hash;
use crate::{debug, log};

pub use event::{ReloadEvent, ReloadOutcome};
pub use handle::Handle;

/// Whether a load should leave the module watched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Watch {
    Hot,
    Cold,
}

/// Hot module reloading context.
///
/// Cloning is cheap and shares the stores.
pub struct HotImport<L: Loader = DataLoader> {
    inner: Arc<Inner<L>>,
}

pub(crate) struct Inner<L> {
    config: HotConfig,
    cache: ModuleCache<L>,
    modules: ModuleStore,
    proxies: ProxyStore,
    watchers: WatcherStore,
    /// Paths stopped by `stop_watch_all`, resumed by `start_watch_all`.
    suspended: Mutex<FxHashSet<PathBuf>>,
    events: EventBus,
}

impl<L: Loader> Clone for HotImport<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: Loader + Default> Default for HotImport<L> {
    fn default() -> Self {
        Self::new(L::default())
    }
}

impl<L: Loader> HotImport<L> {
    pub fn new(loader: L) -> Self {
        Self::with_config(loader, HotConfig::default())
    }

    pub fn with_config(loader: L, config: HotConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                cache: ModuleCache::new(loader),
                modules: ModuleStore::default(),
                proxies: ProxyStore::default(),
                watchers: WatcherStore::default(),
                suspended: Mutex::new(FxHashSet::default()),
                events: EventBus::default(),
            }),
        }
    }

    pub fn config(&self) -> &HotConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> &ModuleCache<L> {
        &self.inner.cache
    }

    /// Import `path` (relative to the working directory) and keep it hot.
    ///
    /// Returns the same handle for every import of the same file. With
    /// `watch = false` in the config the module is loaded cold.
    pub fn hot_import(&self, path: impl AsRef<Path>) -> Result<Handle> {
        self.load(path, self.default_watch())
    }

    /// Import `path` relative to the directory of `caller_file`, usually
    /// `file!()`.
    pub fn import_from(
        &self,
        caller_file: impl AsRef<Path>,
        path: impl AsRef<Path>,
    ) -> Result<Handle> {
        let resolved = resolve_caller_path(path, [caller_file.as_ref()], None)?;
        self.load(resolved, self.default_watch())
    }

    /// Import `path` without watching it.
    ///
    /// An existing watcher on the path is left running; use [`unwatch`] to
    /// stop it.
    ///
    /// [`unwatch`]: HotImport::unwatch
    pub fn load_cold(&self, path: impl AsRef<Path>) -> Result<Handle> {
        self.load(path, Watch::Cold)
    }

    /// Load `path` unless already loaded, then start watching for
    /// [`Watch::Hot`].
    ///
    /// # Errors
    ///
    /// [`HotError::Load`] when the first load fails, [`HotError::Watch`] when
    /// the watcher cannot be attached. A failed watch leaves the module loaded.
    pub fn load(&self, path: impl AsRef<Path>, watch: Watch) -> Result<Handle> {
        let path = normalize_path(path.as_ref());
        let cell = match self.inner.modules.get(&path) {
            Some(cell) => cell,
            None => self.inner.first_load(&path)?,
        };
        let handle = self.inner.proxies.get_or_create(&cell);

        if watch == Watch::Hot {
            self.inner.start_watch(&path)?;
        }
        Ok(handle)
    }

    /// Make `path` cold: no longer watched, the last loaded version keeps
    /// serving.
    ///
    /// Never loads or unloads. A path that is not watched is a no-op.
    pub fn unwatch(&self, path: impl AsRef<Path>) -> Result<()> {
        self.stop_watch(path);
        Ok(())
    }

    /// Stop watching the module `handle` was issued for.
    ///
    /// Returns `false` for a handle issued by another context.
    pub fn unwatch_handle(&self, handle: &Handle) -> bool {
        match self.inner.proxies.find(handle) {
            Some(path) => {
                self.inner.suspended.lock().remove(&path);
                self.inner.stop_watch(&path);
                true
            }
            None => {
                debug!("hot"; "handle for {} not issued here", handle.path().display());
                false
            }
        }
    }

    /// The handle of an already loaded module.
    pub fn create_proxy(&self, path: impl AsRef<Path>) -> Result<Handle> {
        let cell = self.inner.loaded(path.as_ref())?;
        Ok(self.inner.proxies.get_or_create(&cell))
    }

    /// Reload a loaded module now, whether hot or cold.
    ///
    /// Always loads, even when the content is unchanged. A failed load is
    /// reported as [`ReloadOutcome::RolledBack`], not as an error.
    pub fn reload(&self, path: impl AsRef<Path>) -> Result<ReloadOutcome> {
        let cell = self.inner.loaded(path.as_ref())?;
        Ok(self.inner.refresh(&cell, false))
    }

    /// Start watching a loaded module. Idempotent.
    pub fn start_watch(&self, path: impl AsRef<Path>) -> Result<()> {
        let cell = self.inner.loaded(path.as_ref())?;
        self.inner.start_watch(cell.path())
    }

    /// Stop watching `path`. Idempotent; never unloads.
    pub fn stop_watch(&self, path: impl AsRef<Path>) {
        let path = normalize_path(path.as_ref());
        self.inner.suspended.lock().remove(&path);
        self.inner.stop_watch(&path);
    }

    /// Resume watching the modules suspended by [`stop_watch_all`].
    ///
    /// Modules loaded cold stay cold. Keeps going past failures and returns
    /// the first one.
    ///
    /// [`stop_watch_all`]: HotImport::stop_watch_all
    pub fn start_watch_all(&self) -> Result<()> {
        let mut suspended: Vec<_> = self.inner.suspended.lock().drain().collect();
        suspended.sort();

        let mut first_error = None;
        for path in suspended {
            if let Err(e) = self.inner.start_watch(&path) {
                log!("error"; "{}", e.chain());
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Stop every watcher, remembering the paths for [`start_watch_all`].
    /// Modules and handles stay.
    ///
    /// [`start_watch_all`]: HotImport::start_watch_all
    pub fn stop_watch_all(&self) {
        for path in self.inner.watchers.paths() {
            self.inner.stop_watch(&path);
            self.inner.suspended.lock().insert(path);
        }
    }

    /// Receive an event for every reload attempt from now on.
    pub fn subscribe(&self) -> Receiver<ReloadEvent> {
        self.inner.events.subscribe()
    }

    pub fn is_hot(&self, path: impl AsRef<Path>) -> bool {
        self.inner.watchers.contains(&normalize_path(path.as_ref()))
    }

    pub fn is_loaded(&self, path: impl AsRef<Path>) -> bool {
        self.inner.modules.contains(&normalize_path(path.as_ref()))
    }

    /// Paths of hot modules, sorted.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.inner.watchers.paths()
    }

    /// Paths of loaded modules, sorted.
    pub fn loaded_paths(&self) -> Vec<PathBuf> {
        self.inner.modules.paths()
    }

    fn default_watch(&self) -> Watch {
        if self.inner.config.watch {
            Watch::Hot
        } else {
            Watch::Cold
        }
    }
}

impl<L: Loader> Inner<L> {
    fn loaded(&self, path: &Path) -> Result<Arc<ModuleCell>> {
        let path = normalize_path(path);
        self.modules
            .get(&path)
            .ok_or(HotError::NotLoaded(path))
    }

    fn first_load(&self, path: &Path) -> Result<Arc<ModuleCell>> {
        let fingerprint = hash::compute_file(path).ok();
        let export = self.cache.import(path).map_err(|source| {
            let err = HotError::Load {
                path: path.to_path_buf(),
                source,
            };
            log!("error"; "{}", err.chain());
            err
        })?;

        log!("hot"; "loaded {}", path.display());
        let fingerprint = reload::settled(path, fingerprint);
        Ok(self.modules.insert_new(path, export, fingerprint))
    }

    fn start_watch(self: &Arc<Self>, path: &Path) -> Result<()> {
        let context = Arc::downgrade(self);
        let watched = path.to_path_buf();

        let started = self
            .watchers
            .insert_with(path, || {
                ChangeWatcher::spawn(path, self.config.poll_interval(), move |event| {
                    if let Some(inner) = context.upgrade() {
                        inner.on_change(&watched, event);
                    }
                })
            })
            .map_err(|source| HotError::Watch {
                path: path.to_path_buf(),
                source,
            })?;

        if started {
            log!("watch"; "watching {}", path.display());
        } else {
            debug!("watch"; "{} already hot", path.display());
        }
        Ok(())
    }

    fn stop_watch(&self, path: &Path) {
        match self.watchers.remove(path) {
            Some(watcher) => {
                drop(watcher);
                log!("watch"; "stopped watching {}", path.display());
            }
            None => debug!("watch"; "{} is not hot", path.display()),
        }
    }
}
