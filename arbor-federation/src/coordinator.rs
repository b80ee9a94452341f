//! Refresh deduplication.
//!
//! However many concurrent readers discover that the same (node, source)
//! contribution is missing or expired, at most one fetch may be
//! outstanding for that pair system-wide. The coordinator keeps the
//! in-flight map: the first caller to attach creates the entry (and is
//! told to start the fetch), later callers are attached to the existing
//! entry, and completion fans one outcome out to every attached waiter.

use crate::source::FetchError;
use arbor_types::{Contribution, NodePath};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

/// The result a refresh delivers to its waiters.
pub type RefreshOutcome = Result<Contribution, FetchError>;

/// Identifies one outstanding fetch: one node, one source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefreshKey {
    /// The node being refreshed.
    pub node: NodePath,
    /// The source being asked.
    pub source: String,
}

impl RefreshKey {
    /// Creates a refresh key.
    #[must_use]
    pub fn new(node: NodePath, source: impl Into<String>) -> Self {
        Self {
            node,
            source: source.into(),
        }
    }
}

/// Awaits the outcome of an in-flight refresh.
///
/// Dropping a waiter abandons interest without affecting the fetch: a
/// fetch that has started is allowed to complete and populate the cache
/// for the next reader rather than being aborted destructively.
#[derive(Debug)]
pub struct RefreshWaiter {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl RefreshWaiter {
    /// Waits for the refresh to complete.
    ///
    /// Returns `None` if the refresh task went away without completing.
    pub async fn wait(self) -> Option<RefreshOutcome> {
        self.rx.await.ok()
    }
}

#[derive(Default)]
struct Inflight {
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// Tracks in-flight fetches and deduplicates concurrent refresh requests.
#[derive(Default)]
pub struct RefreshCoordinator {
    inflight: Mutex<HashMap<RefreshKey, Inflight>>,
}

impl RefreshCoordinator {
    /// Creates an empty coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches to the in-flight fetch for `key`, creating the entry if
    /// none exists.
    ///
    /// Returns the caller's waiter plus `true` when this call created the
    /// entry. The creator is responsible for actually starting the fetch
    /// and eventually calling [`complete`](Self::complete).
    pub fn attach(&self, key: &RefreshKey) -> (RefreshWaiter, bool) {
        let (tx, rx) = oneshot::channel();
        let mut inflight = self.inflight.lock().unwrap();
        let started = !inflight.contains_key(key);
        inflight.entry(key.clone()).or_default().waiters.push(tx);
        if !started {
            debug!(
                "Attached to in-flight refresh of {} from '{}'",
                key.node, key.source
            );
        }
        (RefreshWaiter { rx }, started)
    }

    /// Completes the fetch for `key`, notifying every attached waiter
    /// with the same outcome and removing the in-flight entry.
    ///
    /// Waiters that abandoned interest are skipped silently.
    pub fn complete(&self, key: &RefreshKey, outcome: &RefreshOutcome) {
        let entry = self.inflight.lock().unwrap().remove(key);
        let Some(entry) = entry else {
            return;
        };
        for tx in entry.waiters {
            let _ = tx.send(outcome.clone());
        }
    }

    /// The number of fetches currently outstanding.
    #[must_use]
    pub fn inflight_count(&self) -> usize {
        self.inflight.lock().unwrap().len()
    }

    /// Whether a fetch for `key` is currently outstanding.
    #[must_use]
    pub fn is_inflight(&self, key: &RefreshKey) -> bool {
        self.inflight.lock().unwrap().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_types::Expiration;

    fn key(source: &str) -> RefreshKey {
        RefreshKey::new(NodePath::root(), source)
    }

    #[tokio::test]
    async fn first_attach_creates_entry() {
        let coordinator = RefreshCoordinator::new();
        let (_waiter, started) = coordinator.attach(&key("a"));
        assert!(started);
        assert_eq!(coordinator.inflight_count(), 1);
    }

    #[tokio::test]
    async fn second_attach_joins_existing_entry() {
        let coordinator = RefreshCoordinator::new();
        let (_first, started_first) = coordinator.attach(&key("a"));
        let (_second, started_second) = coordinator.attach(&key("a"));
        assert!(started_first);
        assert!(!started_second);
        assert_eq!(coordinator.inflight_count(), 1);
    }

    #[tokio::test]
    async fn distinct_sources_are_distinct_entries() {
        let coordinator = RefreshCoordinator::new();
        let (_a, started_a) = coordinator.attach(&key("a"));
        let (_b, started_b) = coordinator.attach(&key("b"));
        assert!(started_a);
        assert!(started_b);
        assert_eq!(coordinator.inflight_count(), 2);
    }

    #[tokio::test]
    async fn complete_notifies_all_waiters_and_clears_entry() {
        let coordinator = RefreshCoordinator::new();
        let k = key("a");
        let (first, _) = coordinator.attach(&k);
        let (second, _) = coordinator.attach(&k);

        let contribution = Contribution::empty("a", Expiration::Never).unwrap();
        coordinator.complete(&k, &Ok(contribution.clone()));

        assert_eq!(first.wait().await, Some(Ok(contribution.clone())));
        assert_eq!(second.wait().await, Some(Ok(contribution)));
        assert_eq!(coordinator.inflight_count(), 0);
    }

    #[tokio::test]
    async fn dropped_waiter_does_not_block_completion() {
        let coordinator = RefreshCoordinator::new();
        let k = key("a");
        let (first, _) = coordinator.attach(&k);
        let (second, _) = coordinator.attach(&k);
        drop(first);

        let contribution = Contribution::empty("a", Expiration::Never).unwrap();
        coordinator.complete(&k, &Ok(contribution.clone()));
        assert_eq!(second.wait().await, Some(Ok(contribution)));
    }

    #[tokio::test]
    async fn waiter_sees_none_when_entry_vanishes() {
        let coordinator = RefreshCoordinator::new();
        let k = key("a");
        let (waiter, _) = coordinator.attach(&k);
        coordinator.inflight.lock().unwrap().clear();
        assert_eq!(waiter.wait().await, None);
    }
}
