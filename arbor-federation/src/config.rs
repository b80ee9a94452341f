//! Federation configuration.
//!
//! The source list is the one piece of global knowledge the cache needs:
//! which sources make up the federated workspace and in what priority
//! order. It is passed explicitly to the cache constructor; there is no
//! ambient registry.

use crate::source::SourceContributor;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a federated workspace.
#[derive(Debug, Clone)]
pub struct FederationConfig {
    /// Name of the federated workspace, for diagnostics.
    pub workspace_name: String,
    /// Retry behavior for retryable fetch failures.
    pub retry: RetryConfig,
    /// Upper bound on a single fetch attempt (ms). 0 disables the bound.
    pub fetch_timeout_ms: u64,
    /// Upper bound on how long a read waits for any one source's refresh
    /// before falling back to the stale value or reporting the source
    /// unavailable. `None` waits as long as the fetch (and its retries)
    /// take.
    pub read_timeout_ms: Option<u64>,
    /// Serve a previously cached contribution when its refresh fails,
    /// instead of dropping that source from the merged view.
    pub stale_if_error: bool,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            workspace_name: "default".to_string(),
            retry: RetryConfig::default(),
            fetch_timeout_ms: 30_000,
            read_timeout_ms: None,
            stale_if_error: true,
        }
    }
}

/// Bounded exponential backoff for retryable fetch failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the initial attempt. Non-retryable failures are
    /// never retried regardless of this setting.
    pub max_retries: u32,
    /// Backoff before the first retry (ms); doubles per attempt.
    pub backoff_base_ms: u64,
    /// Cap on the computed backoff (ms).
    pub backoff_max_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base_ms: 100,
            backoff_max_ms: 5_000,
        }
    }
}

impl RetryConfig {
    /// The backoff to sleep before retry number `attempt` (0-based).
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(32);
        let millis = self
            .backoff_base_ms
            .saturating_mul(factor)
            .min(self.backoff_max_ms);
        Duration::from_millis(millis)
    }
}

/// One source in a federated workspace: its name plus the connector that
/// answers for it.
///
/// The order of the `Vec<FederatedSource>` handed to the cache IS the
/// source priority order, highest priority first. Priority is workspace
/// configuration, not a property of any contribution.
#[derive(Clone)]
pub struct FederatedSource {
    /// The source name; appears in every contribution it produces.
    pub name: String,
    /// The connector that fetches this source's contributions.
    pub contributor: Arc<dyn SourceContributor>,
}

impl FederatedSource {
    /// Creates a source registry entry.
    pub fn new(name: impl Into<String>, contributor: Arc<dyn SourceContributor>) -> Self {
        Self {
            name: name.into(),
            contributor,
        }
    }
}

impl fmt::Debug for FederatedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FederatedSource")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
