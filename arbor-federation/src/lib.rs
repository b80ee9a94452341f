//! Federation layer for Arbor.
//!
//! Presents a single logical tree of nodes whose content is scattered
//! across multiple independent, heterogeneous back-end sources. Each
//! source, asked about a node, answers with a contribution: its own
//! opinion of the node's properties and children, valid until a
//! source-specific expiration. This crate combines those independently
//! aging contributions into one coherent, efficiently refreshable view.
//!
//! # Components
//!
//! - **SourceContributor**: the capability interface to per-source
//!   connectors; implemented externally, consumed here
//! - **RefreshCoordinator**: at most one outstanding fetch per
//!   (node, source) pair, however many readers discover the staleness
//! - **FederationCache**: per-node contribution sets and published
//!   snapshots; reads refresh what expired, keep what is valid, and
//!   merge the result
//!
//! The merge itself lives in `arbor-merge` and is pure; the value types
//! live in `arbor-types`.
//!
//! # Read path
//!
//! 1. Ask the cache for a node; a fully fresh node is answered from the
//!    last published snapshot without locking out writers
//! 2. Expired or missing contributions, and only those, are fetched
//!    through the coordinator, which deduplicates concurrent requests
//! 3. A failed refresh keeps the previous contribution in the view
//!    (stale-if-error) and marks the node degraded; a failure with no
//!    fallback surfaces per-source, never discarding the other sources
//! 4. The merged view is published copy-on-write and returned
//!
//! # Example
//!
//! ```
//! use arbor_federation::source::mock::MockContributor;
//! use arbor_federation::{FederatedSource, FederationCache, FederationConfig};
//! use std::sync::Arc;
//!
//! let config = FederationConfig {
//!     workspace_name: "docs".to_string(),
//!     ..Default::default()
//! };
//! let alpha = Arc::new(MockContributor::new("alpha"));
//! let cache = FederationCache::new(
//!     config,
//!     vec![FederatedSource::new("alpha", alpha)],
//! )
//! .expect("valid source registry");
//! assert_eq!(cache.workspace_name(), "docs");
//! ```

mod cache;
mod config;
mod coordinator;
mod error;
mod node;
pub mod source;

pub use cache::{CacheStats, FederationCache};
pub use config::{FederatedSource, FederationConfig, RetryConfig};
pub use coordinator::{RefreshCoordinator, RefreshKey, RefreshOutcome, RefreshWaiter};
pub use error::{FederationError, FederationResult};
pub use node::{NodeSnapshot, NodeStatus, SourceFailure};
pub use source::{FetchError, SourceContributor};
