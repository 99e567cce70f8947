//! Module loading.
//!
//! A [`Loader`] turns a file into an [`Export`]. The [`ModuleCache`] sits in
//! front of it and plays the role of the module loader's cache: entries are
//! keyed by absolute path and can be evicted and reinserted, which is what the
//! reload rollback relies on.
//!
//! Any `Fn(&Path) -> anyhow::Result<Export>` is a loader, so hosts can plug in
//! their own module formats; [`DataLoader`] covers JSON and TOML data files.

use std::path::Path;

use crate::module::Export;

mod cache;
mod data;

pub use cache::ModuleCache;
pub use data::DataLoader;

/// Loads the exported surface of a module file.
///
/// Implementations report syntax errors, initialization failures and missing
/// files as errors; they never need to cache.
pub trait Loader: Send + Sync + 'static {
    fn load(&self, path: &Path) -> anyhow::Result<Export>;
}

impl<F> Loader for F
where
    F: Fn(&Path) -> anyhow::Result<Export> + Send + Sync + 'static,
{
    fn load(&self, path: &Path) -> anyhow::Result<Export> {
        self(path)
    }
}
