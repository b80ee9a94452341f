//! The federation cache.
//!
//! Owns, per node, the current set of contributions and the last
//! published merged snapshot. A read refreshes whatever has expired,
//! keeps whatever is still valid, and merges the combined set.
//!
//! The defining correctness property is selectivity: a source whose
//! contribution is still valid is never re-fetched, no matter how stale
//! its siblings are. Staleness is refreshed through the
//! [`RefreshCoordinator`] so that concurrent readers share one fetch per
//! (node, source) pair.

use crate::config::{FederatedSource, FederationConfig, RetryConfig};
use crate::coordinator::{RefreshCoordinator, RefreshKey, RefreshOutcome, RefreshWaiter};
use crate::error::{FederationError, FederationResult};
use crate::node::{NodeSnapshot, NodeStatus, SourceFailure};
use crate::source::{FetchError, SourceContributor};
use arbor_merge::MergeEngine;
use arbor_types::{Contribution, Expiration, NodePath, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Read-through cache over the federated sources of one workspace.
///
/// Readers receive immutable [`NodeSnapshot`]s; the live per-node state is
/// only ever touched under that node's exclusive section, with no await
/// held. Cloning the cache is cheap and shares all state.
#[derive(Clone)]
pub struct FederationCache {
    config: FederationConfig,
    sources: Arc<Vec<FederatedSource>>,
    coordinator: Arc<RefreshCoordinator>,
    nodes: Arc<RwLock<HashMap<NodePath, Arc<NodeCell>>>>,
    stats: Arc<StatsInner>,
}

#[derive(Default)]
struct NodeCell {
    state: std::sync::RwLock<NodeState>,
}

#[derive(Default)]
struct NodeState {
    /// Current contribution per source, valid or pending refresh.
    contributions: HashMap<String, Contribution>,
    /// Last resolution failure per source, cleared on success.
    failures: HashMap<String, SourceFailure>,
    /// Last published snapshot.
    snapshot: Option<Arc<NodeSnapshot>>,
    /// Publication counter; snapshots of one node are totally ordered.
    version: u64,
    /// Merged-node identity, assigned at first publication.
    uuid: Option<Uuid>,
    /// Set when contributions or failures changed after `snapshot` was
    /// published.
    dirty: bool,
}

impl FederationCache {
    /// Creates a cache for the given workspace.
    ///
    /// `sources` is the priority-ordered registry, highest priority
    /// first. Names must be non-blank and unique.
    pub fn new(
        config: FederationConfig,
        sources: Vec<FederatedSource>,
    ) -> FederationResult<Self> {
        let mut seen = std::collections::HashSet::new();
        for source in &sources {
            if source.name.trim().is_empty() {
                return Err(arbor_types::Error::InvalidArgument(
                    "federated source name may not be blank".to_string(),
                )
                .into());
            }
            if !seen.insert(source.name.clone()) {
                return Err(arbor_types::Error::InvalidArgument(format!(
                    "duplicate federated source name '{}'",
                    source.name
                ))
                .into());
            }
        }
        Ok(Self {
            config,
            sources: Arc::new(sources),
            coordinator: Arc::new(RefreshCoordinator::new()),
            nodes: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(StatsInner::default()),
        })
    }

    /// The workspace name this cache federates.
    #[must_use]
    pub fn workspace_name(&self) -> &str {
        &self.config.workspace_name
    }

    /// Source names in priority order, highest first.
    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.name.as_str())
    }

    /// Reads the federated node at `path`, refreshing expired or missing
    /// contributions first.
    pub async fn get(&self, path: &NodePath) -> FederationResult<Arc<NodeSnapshot>> {
        self.get_at(path, Timestamp::now()).await
    }

    /// [`get`](Self::get) with an explicit notion of "now".
    pub async fn get_at(
        &self,
        path: &NodePath,
        now: Timestamp,
    ) -> FederationResult<Arc<NodeSnapshot>> {
        let cell = self.cell(path).await;

        if let Some(snapshot) = self.current_snapshot(&cell, now) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(snapshot);
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);

        let pending = self.schedule_refreshes(path, &cell, now);
        self.await_refreshes(&cell, pending, now).await;
        self.publish(path, &cell, now)
    }

    /// Marks one source's cached contribution expired, without touching
    /// any other source.
    ///
    /// Used by change-notification plumbing: the next read selectively
    /// refreshes exactly this source. Returns false when nothing was
    /// cached for (node, source).
    pub async fn invalidate(&self, path: &NodePath, source: &str) -> bool {
        self.invalidate_at(path, source, Timestamp::now()).await
    }

    /// [`invalidate`](Self::invalidate) with an explicit notion of "now".
    pub async fn invalidate_at(&self, path: &NodePath, source: &str, now: Timestamp) -> bool {
        let Some(cell) = self.lookup(path).await else {
            return false;
        };
        let mut state = cell.state.write().unwrap();
        let Some(current) = state.contributions.get(source) else {
            return false;
        };
        let expired = current.with_expiration(Expiration::At(now));
        state.contributions.insert(source.to_string(), expired);
        state.dirty = true;
        debug!("Invalidated contribution from '{}' for {}", source, path);
        true
    }

    /// Evicts a node wholesale. The capacity policy deciding *what* to
    /// evict lives outside this core.
    pub async fn remove(&self, path: &NodePath) -> bool {
        self.nodes.write().await.remove(path).is_some()
    }

    /// The number of nodes currently cached.
    pub async fn node_count(&self) -> usize {
        self.nodes.read().await.len()
    }

    /// The node's cache lifecycle state at `now`.
    pub async fn status(&self, path: &NodePath, now: Timestamp) -> NodeStatus {
        let Some(cell) = self.lookup(path).await else {
            return NodeStatus::Absent;
        };
        let state = cell.state.read().unwrap();
        if state.contributions.is_empty() {
            return NodeStatus::Absent;
        }
        if self
            .sources
            .iter()
            .any(|s| !state.contributions.contains_key(&s.name))
        {
            return NodeStatus::Partial;
        }
        let mut stale = false;
        let mut degraded = false;
        for (name, contribution) in &state.contributions {
            if contribution.is_expired(now) {
                if state.failures.contains_key(name) {
                    degraded = true;
                } else {
                    stale = true;
                }
            }
        }
        if degraded {
            NodeStatus::DegradedFresh
        } else if stale {
            NodeStatus::Stale
        } else {
            NodeStatus::Fresh
        }
    }

    /// A point-in-time copy of the cache counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            refreshes: self.stats.refreshes.load(Ordering::Relaxed),
            refresh_failures: self.stats.refresh_failures.load(Ordering::Relaxed),
            degraded_serves: self.stats.degraded_serves.load(Ordering::Relaxed),
        }
    }

    async fn cell(&self, path: &NodePath) -> Arc<NodeCell> {
        {
            let nodes = self.nodes.read().await;
            if let Some(cell) = nodes.get(path) {
                return cell.clone();
            }
        }
        let mut nodes = self.nodes.write().await;
        nodes
            .entry(path.clone())
            .or_insert_with(|| Arc::new(NodeCell::default()))
            .clone()
    }

    async fn lookup(&self, path: &NodePath) -> Option<Arc<NodeCell>> {
        self.nodes.read().await.get(path).cloned()
    }

    /// True when every configured source has an unexpired cached
    /// contribution.
    fn is_current(&self, state: &NodeState, now: Timestamp) -> bool {
        self.sources.iter().all(|source| {
            state
                .contributions
                .get(&source.name)
                .is_some_and(|c| !c.is_expired(now))
        })
    }

    fn current_snapshot(&self, cell: &NodeCell, now: Timestamp) -> Option<Arc<NodeSnapshot>> {
        let state = cell.state.read().unwrap();
        if state.dirty {
            return None;
        }
        let snapshot = state.snapshot.clone()?;
        self.is_current(&state, now).then_some(snapshot)
    }

    /// Attaches to (or starts) a refresh for exactly the sources whose
    /// contribution is missing or expired.
    fn schedule_refreshes(
        &self,
        path: &NodePath,
        cell: &Arc<NodeCell>,
        now: Timestamp,
    ) -> Vec<(String, RefreshWaiter)> {
        let mut pending = Vec::new();
        let mut to_spawn = Vec::new();
        {
            let state = cell.state.read().unwrap();
            for source in self.sources.iter() {
                let needs_refresh = match state.contributions.get(&source.name) {
                    None => true,
                    Some(contribution) => contribution.is_expired(now),
                };
                if !needs_refresh {
                    continue;
                }
                let key = RefreshKey::new(path.clone(), source.name.clone());
                let (waiter, started) = self.coordinator.attach(&key);
                if started {
                    to_spawn.push((key, source.contributor.clone()));
                }
                pending.push((source.name.clone(), waiter));
            }
        }
        for (key, contributor) in to_spawn {
            self.spawn_refresh(key, contributor, cell.clone());
        }
        pending
    }

    async fn await_refreshes(
        &self,
        cell: &Arc<NodeCell>,
        pending: Vec<(String, RefreshWaiter)>,
        now: Timestamp,
    ) {
        for (source, waiter) in pending {
            let outcome = match self.config.read_timeout_ms {
                Some(ms) => {
                    match tokio::time::timeout(Duration::from_millis(ms), waiter.wait()).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            self.record_wait_failure(
                                cell,
                                &source,
                                format!("refresh did not complete within {ms}ms"),
                                now,
                            );
                            continue;
                        }
                    }
                }
                None => waiter.wait().await,
            };
            // Success and failure outcomes are applied to the node state
            // by the refresh task itself before waiters are notified.
            if outcome.is_none() {
                self.record_wait_failure(
                    cell,
                    &source,
                    "refresh abandoned before completing".to_string(),
                    now,
                );
            }
        }
    }

    fn record_wait_failure(
        &self,
        cell: &Arc<NodeCell>,
        source: &str,
        reason: String,
        now: Timestamp,
    ) {
        let mut state = cell.state.write().unwrap();
        let resolved = state
            .contributions
            .get(source)
            .is_some_and(|c| !c.is_expired(now));
        if resolved {
            return;
        }
        state
            .failures
            .entry(source.to_string())
            .or_insert_with(|| SourceFailure {
                source: source.to_string(),
                reason,
                retryable: true,
            });
        state.dirty = true;
    }

    /// Merges the current contribution set and publishes a new immutable
    /// snapshot under the node's exclusive section.
    fn publish(
        &self,
        path: &NodePath,
        cell: &NodeCell,
        now: Timestamp,
    ) -> FederationResult<Arc<NodeSnapshot>> {
        let mut state = cell.state.write().unwrap();

        // Another reader may have published for the same completion set.
        if !state.dirty && self.is_current(&state, now) {
            if let Some(snapshot) = state.snapshot.clone() {
                return Ok(snapshot);
            }
        }

        let mut ordered = Vec::with_capacity(self.sources.len());
        let mut degraded = Vec::new();
        let mut unavailable = Vec::new();
        for source in self.sources.iter() {
            match state.contributions.get(&source.name) {
                Some(contribution) if contribution.is_expired(now) => {
                    if let Some(failure) = state.failures.get(&source.name) {
                        if self.config.stale_if_error {
                            warn!(
                                "Serving stale contribution from '{}' for {}: {}",
                                source.name, path, failure.reason
                            );
                            degraded.push(source.name.clone());
                            ordered.push(contribution.clone());
                        } else {
                            unavailable.push(failure.clone());
                        }
                    } else {
                        // Refresh outcome not yet applied; the last good
                        // value stays in the view.
                        ordered.push(contribution.clone());
                    }
                }
                Some(contribution) => ordered.push(contribution.clone()),
                None => {
                    if let Some(failure) = state.failures.get(&source.name) {
                        unavailable.push(failure.clone());
                    }
                }
            }
        }

        if ordered.iter().all(Contribution::is_empty) {
            // Includes the zero-contribution case. With unresolved
            // sources in play we cannot assert nonexistence.
            if unavailable.is_empty() {
                return Err(FederationError::NotFound(path.clone()));
            }
            return Err(FederationError::PartialUnavailable {
                failures: unavailable,
            });
        }

        let view = MergeEngine::merge(&ordered);
        let uuid = *state.uuid.get_or_insert_with(Uuid::new_v4);
        state.version += 1;
        let status = if degraded.is_empty() {
            NodeStatus::Fresh
        } else {
            self.stats.degraded_serves.fetch_add(1, Ordering::Relaxed);
            NodeStatus::DegradedFresh
        };
        let snapshot = Arc::new(NodeSnapshot::new(
            uuid,
            view,
            ordered,
            status,
            degraded,
            unavailable,
            state.version,
        ));
        state.snapshot = Some(snapshot.clone());
        state.dirty = false;
        debug!(
            "Published snapshot v{} of {} ({})",
            snapshot.version(),
            path,
            snapshot.status()
        );
        Ok(snapshot)
    }

    fn spawn_refresh(
        &self,
        key: RefreshKey,
        contributor: Arc<dyn SourceContributor>,
        cell: Arc<NodeCell>,
    ) {
        let coordinator = Arc::clone(&self.coordinator);
        let stats = Arc::clone(&self.stats);
        let retry = self.config.retry.clone();
        let fetch_timeout_ms = self.config.fetch_timeout_ms;
        tokio::spawn(async move {
            stats.refreshes.fetch_add(1, Ordering::Relaxed);
            debug!("Fetching {} from '{}'", key.node, key.source);
            let outcome =
                fetch_with_retry(contributor.as_ref(), &key, &retry, fetch_timeout_ms).await;
            {
                let mut state = cell.state.write().unwrap();
                match &outcome {
                    Ok(contribution) => {
                        debug_assert_eq!(contribution.source_name(), key.source);
                        state.failures.remove(&key.source);
                        state
                            .contributions
                            .insert(key.source.clone(), contribution.clone());
                    }
                    Err(error) => {
                        warn!(
                            "Fetch of {} from '{}' failed: {}",
                            key.node, key.source, error.reason
                        );
                        stats.refresh_failures.fetch_add(1, Ordering::Relaxed);
                        state.failures.insert(
                            key.source.clone(),
                            SourceFailure {
                                source: key.source.clone(),
                                reason: error.reason.clone(),
                                retryable: error.retryable,
                            },
                        );
                    }
                }
                state.dirty = true;
            }
            coordinator.complete(&key, &outcome);
        });
    }
}

/// One fetch attempt plus bounded retries for retryable failures.
///
/// A fetch that outlives `fetch_timeout_ms` is treated as a retryable
/// failure of that attempt; 0 disables the per-attempt bound.
async fn fetch_with_retry(
    contributor: &dyn SourceContributor,
    key: &RefreshKey,
    retry: &RetryConfig,
    fetch_timeout_ms: u64,
) -> RefreshOutcome {
    let mut attempt = 0u32;
    loop {
        let fetched = if fetch_timeout_ms == 0 {
            contributor.fetch(&key.node, &key.source).await
        } else {
            match tokio::time::timeout(
                Duration::from_millis(fetch_timeout_ms),
                contributor.fetch(&key.node, &key.source),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(FetchError::timed_out(&key.source, fetch_timeout_ms)),
            }
        };
        match fetched {
            Ok(contribution) => return Ok(contribution),
            Err(error) if error.retryable && attempt < retry.max_retries => {
                let backoff = retry.backoff_for(attempt);
                debug!(
                    "Retrying fetch of {} from '{}' in {:?}: {}",
                    key.node, key.source, backoff, error.reason
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[derive(Debug, Default)]
struct StatsInner {
    hits: AtomicU64,
    misses: AtomicU64,
    refreshes: AtomicU64,
    refresh_failures: AtomicU64,
    degraded_serves: AtomicU64,
}

/// Cache counters, as a plain value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Reads served from the published snapshot with no refresh.
    pub hits: u64,
    /// Reads that had to wait on at least one refresh.
    pub misses: u64,
    /// Fetches started (after coordinator deduplication).
    pub refreshes: u64,
    /// Fetches that failed after exhausting retries.
    pub refresh_failures: u64,
    /// Publications that served at least one stale contribution.
    pub degraded_serves: u64,
}
