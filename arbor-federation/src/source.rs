//! The capability interface to per-source connectors.
//!
//! The federation core never talks to a backing store directly. Each
//! source (a database, a version-control system, an in-memory store, a
//! file-backed store) is represented by a connector implementing
//! [`SourceContributor`], supplied at construction. The core only asks a
//! connector one question ("what do you know about this node?") and only
//! interprets one thing about a failure: whether it is worth retrying.

use arbor_types::{Contribution, NodePath};
use async_trait::async_trait;

/// A failed fetch from a source connector.
///
/// The core never looks at *why* a fetch failed beyond the retryable
/// flag; it only decides whether to retry and whether to keep serving a
/// stale contribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    /// The source that failed.
    pub source: String,
    /// Connector-supplied description, for diagnostics only.
    pub reason: String,
    /// Whether the connector considers the failure transient.
    pub retryable: bool,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fetch from '{}' failed: {}", self.source, self.reason)
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// A retryable failure.
    pub fn retryable(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            reason: reason.into(),
            retryable: true,
        }
    }

    /// A permanent failure.
    pub fn permanent(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            reason: reason.into(),
            retryable: false,
        }
    }

    pub(crate) fn timed_out(source: &str, after_ms: u64) -> Self {
        Self::retryable(source, format!("fetch timed out after {after_ms}ms"))
    }
}

/// Fetches one source's contribution for one node.
///
/// Implemented by connectors outside the federation core. A connector
/// that was asked and affirmatively has nothing must return
/// [`Contribution::empty`] rather than an error, so the answer can be
/// cached like any other.
#[async_trait]
pub trait SourceContributor: Send + Sync {
    /// Fetches the contribution for `node` from the named source.
    ///
    /// `source` is the configured source name the federation is asking
    /// on behalf of; a connector serving a single source may ignore it.
    async fn fetch(&self, node: &NodePath, source: &str) -> Result<Contribution, FetchError>;
}

/// A scriptable contributor for tests.
pub mod mock {
    use super::*;
    use arbor_types::{Expiration, PathSegment, Property, Timestamp};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    type Outcome = Result<Contribution, FetchError>;

    /// A mock source connector.
    ///
    /// Responses are scripted per node path: each fetch for a path pops
    /// the next scripted outcome, and the last outcome is repeated once
    /// the script runs dry. Every fetch is counted, which is what the
    /// selective-refresh and single-flight tests assert on.
    pub struct MockContributor {
        source: String,
        scripts: Mutex<HashMap<NodePath, Vec<Outcome>>>,
        calls: Mutex<HashMap<NodePath, usize>>,
        latency: Option<Duration>,
    }

    impl MockContributor {
        /// Creates a mock connector for the named source.
        #[must_use]
        pub fn new(source: impl Into<String>) -> Self {
            Self {
                source: source.into(),
                scripts: Mutex::new(HashMap::new()),
                calls: Mutex::new(HashMap::new()),
                latency: None,
            }
        }

        /// Adds artificial latency to every fetch, so tests can overlap
        /// concurrent readers deterministically.
        #[must_use]
        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        /// Queues the next outcome for fetches of `node`.
        pub fn script(&self, node: &NodePath, outcome: Outcome) {
            self.scripts
                .lock()
                .unwrap()
                .entry(node.clone())
                .or_default()
                .push(outcome);
        }

        /// Queues a successful contribution for fetches of `node`.
        pub fn script_ok(&self, node: &NodePath, contribution: Contribution) {
            self.script(node, Ok(contribution));
        }

        /// Queues an "asked and has nothing" answer for fetches of `node`.
        pub fn script_empty(&self, node: &NodePath, expiration: Expiration) {
            let empty = Contribution::empty(self.source.clone(), expiration)
                .expect("mock source name is non-blank");
            self.script(node, Ok(empty));
        }

        /// How many times `node` has been fetched from this source.
        #[must_use]
        pub fn fetch_count(&self, node: &NodePath) -> usize {
            self.calls.lock().unwrap().get(node).copied().unwrap_or(0)
        }

        /// Total fetches across all nodes.
        #[must_use]
        pub fn total_fetches(&self) -> usize {
            self.calls.lock().unwrap().values().sum()
        }
    }

    #[async_trait]
    impl SourceContributor for MockContributor {
        async fn fetch(&self, node: &NodePath, _source: &str) -> Outcome {
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            *self.calls.lock().unwrap().entry(node.clone()).or_insert(0) += 1;
            let mut scripts = self.scripts.lock().unwrap();
            let queue = scripts.entry(node.clone()).or_default();
            match queue.len() {
                0 => Err(FetchError::permanent(
                    self.source.clone(),
                    format!("no scripted response for {node}"),
                )),
                1 => queue[0].clone(),
                _ => queue.remove(0),
            }
        }
    }

    /// A contribution with one property, expiring at `expires_ms`.
    ///
    /// Small helper for tests that just need distinguishable content.
    pub fn property_contribution(
        source: &str,
        path: &NodePath,
        name: &str,
        value: serde_json::Value,
        expires_ms: u64,
    ) -> Contribution {
        Contribution::with_property(
            source,
            path.clone(),
            Expiration::At(Timestamp::from_millis(expires_ms)),
            Property::single(name, value),
        )
        .expect("valid test contribution")
    }

    /// A contribution with one child, expiring at `expires_ms`.
    pub fn child_contribution(
        source: &str,
        path: &NodePath,
        child: &str,
        expires_ms: u64,
    ) -> Contribution {
        Contribution::with_child(
            source,
            path.clone(),
            Expiration::At(Timestamp::from_millis(expires_ms)),
            PathSegment::new(child),
        )
        .expect("valid test contribution")
    }
}
