//! Reload notifications.

use std::path::PathBuf;
use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

use crate::error::HotError;

/// Result of one reload attempt.
#[derive(Debug, Clone)]
pub enum ReloadOutcome {
    /// A fresh version is now served.
    Reloaded { version: u64 },
    /// The source hashes the same as the served version; nothing was loaded.
    Unchanged,
    /// Loading failed; the cache entry was restored and the previous version
    /// keeps serving.
    RolledBack { error: Arc<HotError> },
}

impl ReloadOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Reloaded { .. } => "reloaded",
            Self::Unchanged => "unchanged",
            Self::RolledBack { .. } => "rolled back",
        }
    }

    pub fn is_reloaded(&self) -> bool {
        matches!(self, Self::Reloaded { .. })
    }

    pub fn is_rolled_back(&self) -> bool {
        matches!(self, Self::RolledBack { .. })
    }
}

/// A reload attempt for one module.
#[derive(Debug, Clone)]
pub struct ReloadEvent {
    pub path: PathBuf,
    pub outcome: ReloadOutcome,
}

/// Fan-out of reload events to subscribers.
#[derive(Default)]
pub(crate) struct EventBus {
    subscribers: Mutex<Vec<Sender<ReloadEvent>>>,
}

impl EventBus {
    pub(crate) fn subscribe(&self) -> Receiver<ReloadEvent> {
        let (tx, rx) = channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Send to every live subscriber, dropping the ones that hung up.
    pub(crate) fn publish(&self, event: &ReloadEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(version: u64) -> ReloadEvent {
        ReloadEvent {
            path: PathBuf::from("/srv/answer.json"),
            outcome: ReloadOutcome::Reloaded { version },
        }
    }

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let bus = EventBus::default();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.publish(&event(2));
        assert!(a.try_recv().unwrap().outcome.is_reloaded());
        assert!(b.try_recv().unwrap().outcome.is_reloaded());
    }

    #[test]
    fn test_dropped_subscriber_removed() {
        let bus = EventBus::default();
        let kept = bus.subscribe();
        drop(bus.subscribe());

        bus.publish(&event(2));
        assert_eq!(bus.len(), 1);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_outcome_labels() {
        let rolled_back = ReloadOutcome::RolledBack {
            error: Arc::new(HotError::NotLoaded(PathBuf::from("/srv/a.json"))),
        };
        assert_eq!(rolled_back.label(), "rolled back");
        assert!(rolled_back.is_rolled_back());
        assert_eq!(ReloadOutcome::Unchanged.label(), "unchanged");
    }
}
