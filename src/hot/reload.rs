//! Reload orchestration.
//!
//! A reload runs entirely under the module's reload gate:
//!
//! 1. fingerprint the file, skip when it matches the last good load
//! 2. evict the cache entry, keeping it
//! 3. load fresh
//! 4. swap the store cell on success, reinsert the evicted entry on failure
//! 5. publish the outcome
//!
//! Handles keep serving the previous export until step 4 swaps the cell.

use std::path::Path;
use std::sync::Arc;

use notify::Event;

use super::Inner;
use super::event::{ReloadEvent, ReloadOutcome};
use super::store::{ModuleCell, ReloadGate};
use super::watcher::{is_content_change, is_ready};
use crate::error::HotError;
use crate::loader::Loader;
use crate::utils::hash;
use crate::{debug, log};

impl<L: Loader> Inner<L> {
    /// Handle a notify event for a watched path.
    ///
    /// Returns `None` when the event was filtered out before reaching the
    /// reload gate.
    pub(crate) fn on_change(&self, path: &Path, event: &Event) -> Option<ReloadOutcome> {
        if !is_content_change(&event.kind, self.config.poll_interval().is_some()) {
            debug!("watch"; "ignored {:?} for {}", event.kind, path.display());
            return None;
        }
        if !is_ready(path, self.config.skip_empty) {
            return None;
        }
        // Events queued before a stop still arrive
        if !self.watchers.contains(path) {
            debug!("watch"; "{} is cold, skip", path.display());
            return None;
        }
        let cell = self.modules.get(path)?;
        Some(self.refresh(&cell, self.config.skip_unchanged))
    }

    /// Reload one module and publish the outcome.
    pub(crate) fn refresh(&self, cell: &ModuleCell, skip_unchanged: bool) -> ReloadOutcome {
        let path = cell.path();
        let mut gate = cell.gate.lock();

        let fingerprint = hash::compute_file(path).ok();
        let unchanged = fingerprint.is_some() && fingerprint == gate.fingerprint;
        let outcome = if skip_unchanged && unchanged {
            debug!("reload"; "{} unchanged, skip", path.display());
            ReloadOutcome::Unchanged
        } else {
            self.swap(cell, &mut gate, fingerprint)
        };

        // Published under the gate so subscribers see outcomes in order
        self.events.publish(&ReloadEvent {
            path: path.to_path_buf(),
            outcome: outcome.clone(),
        });
        outcome
    }

    fn swap(
        &self,
        cell: &ModuleCell,
        gate: &mut ReloadGate,
        fingerprint: Option<u64>,
    ) -> ReloadOutcome {
        let path = cell.path();
        let evicted = self.cache.evict(path);

        match self.cache.import(path) {
            Ok(export) => {
                let version = cell.replace(export);
                gate.fingerprint = settled(path, fingerprint);
                log!("reload"; "{} (v{})", path.display(), version);
                ReloadOutcome::Reloaded { version }
            }
            Err(source) => {
                let error = HotError::Reload {
                    path: path.to_path_buf(),
                    source,
                };
                log!("error"; "{}, keeping v{}", error.chain(), cell.version());
                if let Some(entry) = evicted {
                    self.cache.reinsert(path, entry);
                }
                ReloadOutcome::RolledBack {
                    error: Arc::new(error),
                }
            }
        }
    }
}

/// Fingerprint to record after a successful load that started at `before`.
///
/// The loader reads the file on its own; if the bytes changed while it ran,
/// the loaded content is unknown and nothing is recorded, so the next change
/// event always reloads.
pub(crate) fn settled(path: &Path, before: Option<u64>) -> Option<u64> {
    let after = hash::compute_file(path).ok();
    if after == before {
        before
    } else {
        debug!("reload"; "{} changed during load", path.display());
        None
    }
}
