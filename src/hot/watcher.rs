//! File change watcher for a single module file.
//!
//! One [`ChangeWatcher`] per watched path. Dropping it closes the underlying
//! notify watcher; events already delivered to the callback still run to
//! completion.

use std::path::Path;
use std::time::Duration;

use notify::event::{MetadataKind, ModifyKind};
use notify::{Config, Event, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};

/// Live subscription to change notifications of one file.
pub(crate) struct ChangeWatcher {
    /// Watcher handle (must be kept alive)
    _watcher: Box<dyn Watcher + Send>,
}

impl ChangeWatcher {
    /// Start watching `path`, calling `on_event` for every notify event.
    ///
    /// `poll_interval` selects notify's `PollWatcher` (with content comparison)
    /// instead of the native backend.
    pub(crate) fn spawn<F>(
        path: &Path,
        poll_interval: Option<Duration>,
        on_event: F,
    ) -> notify::Result<Self>
    where
        F: Fn(&Event) + Send + 'static,
    {
        let handler = move |result: notify::Result<Event>| match result {
            Ok(event) => on_event(&event),
            Err(e) => crate::log!("watch"; "notify error: {}", e),
        };

        let mut watcher: Box<dyn Watcher + Send> = match poll_interval {
            Some(interval) => Box::new(PollWatcher::new(
                handler,
                Config::default()
                    .with_poll_interval(interval)
                    .with_compare_contents(true),
            )?),
            None => Box::new(RecommendedWatcher::new(handler, Config::default())?),
        };

        watcher.watch(path, RecursiveMode::NonRecursive)?;
        Ok(Self { _watcher: watcher })
    }
}

/// Whether an event kind reports a content modification.
///
/// Renames, metadata-only changes (chmod noise), access, create and remove
/// events are not reload triggers.
pub(crate) fn is_content_change(kind: &EventKind, polling: bool) -> bool {
    match kind {
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) => true,
        // The poll backend reports most edits as a write-time change
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)) => polling,
        _ => false,
    }
}

/// Whether the file can be reloaded right now.
///
/// A change event may fire once for the truncate (zero size) and again for
/// the write; with `skip_empty` the empty state is not ready. A failing
/// `metadata()` (file missing mid-write) is never ready.
pub(crate) fn is_ready(path: &Path, skip_empty: bool) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) if skip_empty && meta.len() == 0 => {
            crate::debug!("watch"; "{} is empty, skip", path.display());
            false
        }
        Ok(_) => true,
        Err(e) => {
            crate::debug!("watch"; "metadata of {} failed: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, AccessMode, CreateKind, DataChange, RemoveKind, RenameMode};
    use tempfile::TempDir;

    #[test]
    fn test_content_change_kinds() {
        let kinds = [
            EventKind::Modify(ModifyKind::Data(DataChange::Any)),
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            EventKind::Modify(ModifyKind::Any),
        ];
        for kind in &kinds {
            assert!(is_content_change(kind, false), "{kind:?} should trigger");
            assert!(is_content_change(kind, true), "{kind:?} should trigger");
        }
    }

    #[test]
    fn test_write_time_only_when_polling() {
        let kind = EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime));
        assert!(!is_content_change(&kind, false));
        assert!(is_content_change(&kind, true));
    }

    #[test]
    fn test_non_content_kinds_ignored() {
        let ignored = [
            EventKind::Modify(ModifyKind::Name(RenameMode::Any)),
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            EventKind::Access(AccessKind::Close(AccessMode::Write)),
            EventKind::Create(CreateKind::File),
            EventKind::Remove(RemoveKind::File),
            EventKind::Any,
        ];
        for kind in &ignored {
            assert!(!is_content_change(kind, true), "{kind:?} should be ignored");
        }
    }

    #[test]
    fn test_empty_file_not_ready() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("module.json");
        std::fs::write(&path, "").unwrap();

        assert!(!is_ready(&path, true));
        assert!(is_ready(&path, false));
    }

    #[test]
    fn test_written_file_ready() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("module.json");
        std::fs::write(&path, "{}").unwrap();

        assert!(is_ready(&path, true));
    }

    #[test]
    fn test_missing_file_not_ready() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.json");

        assert!(!is_ready(&path, true));
        assert!(!is_ready(&path, false));
    }

    #[test]
    fn test_spawn_missing_path_fails() {
        let dir = TempDir::new().unwrap();
        let result = ChangeWatcher::spawn(&dir.path().join("missing.json"), None, |_| {});
        assert!(result.is_err());
    }

    #[test]
    fn test_spawn_poll_watcher() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("module.json");
        std::fs::write(&path, "{}").unwrap();

        let watcher = ChangeWatcher::spawn(&path, Some(Duration::from_millis(50)), |_| {});
        assert!(watcher.is_ok());
    }
}
