//! Published node snapshots.
//!
//! The cache never hands a caller its live mutable entry. Every read
//! returns an `Arc<NodeSnapshot>`: a deeply immutable value published
//! copy-on-write under the node's exclusive section. A reader holding an
//! old snapshot keeps a coherent view while newer snapshots are published
//! behind it.

use arbor_merge::EffectiveView;
use arbor_types::{Contribution, Expiration, PathSegment, Property, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Cache lifecycle of a node, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    /// No cached contributions.
    Absent,
    /// Some sources answered, others have never been asked.
    Partial,
    /// Every cached contribution is unexpired.
    Fresh,
    /// At least one contribution is expired and awaiting refresh.
    Stale,
    /// A stale contribution is being served because its refresh failed.
    DegradedFresh,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Absent => "absent",
            Self::Partial => "partial",
            Self::Fresh => "fresh",
            Self::Stale => "stale",
            Self::DegradedFresh => "degraded-fresh",
        };
        write!(f, "{name}")
    }
}

/// A per-source resolution failure, recorded for observability and
/// reported without collapsing the rest of the node read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    /// The source that could not be resolved.
    pub source: String,
    /// Human-readable reason.
    pub reason: String,
    /// Whether the underlying failure was considered transient.
    pub retryable: bool,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.source, self.reason)
    }
}

/// The merged, multi-source view of one logical node, as published.
///
/// Immutable and freely shareable across threads. `version` increases by
/// one per publication for a given node, so snapshots of one node are
/// totally ordered; once a reader observes version N it can never be
/// handed data that N already superseded.
#[derive(Debug, Clone)]
pub struct NodeSnapshot {
    uuid: Uuid,
    view: EffectiveView,
    contributions: Vec<Contribution>,
    status: NodeStatus,
    degraded: Vec<String>,
    unavailable: Vec<SourceFailure>,
    version: u64,
}

impl NodeSnapshot {
    pub(crate) fn new(
        uuid: Uuid,
        view: EffectiveView,
        contributions: Vec<Contribution>,
        status: NodeStatus,
        degraded: Vec<String>,
        unavailable: Vec<SourceFailure>,
        version: u64,
    ) -> Self {
        Self {
            uuid,
            view,
            contributions,
            status,
            degraded,
            unavailable,
            version,
        }
    }

    /// The merged node's identity, stable across republications.
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// The merged effective view.
    #[must_use]
    pub fn view(&self) -> &EffectiveView {
        &self.view
    }

    /// Looks up a resolved property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.view.property(name)
    }

    /// The resolved properties, in priority order of first definition.
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        self.view.properties()
    }

    /// The resolved children.
    #[must_use]
    pub fn children(&self) -> &[PathSegment] {
        self.view.children()
    }

    /// The contributions this snapshot was merged from, in source
    /// priority order. Retained for diagnostics.
    #[must_use]
    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    /// The contribution from a particular source, if it participated.
    #[must_use]
    pub fn contribution_from(&self, source: &str) -> Option<&Contribution> {
        self.contributions
            .iter()
            .find(|c| c.source_name() == source)
    }

    /// Node status at publication time (`Fresh` or `DegradedFresh`).
    #[must_use]
    pub const fn status(&self) -> NodeStatus {
        self.status
    }

    /// Sources whose stale contribution is being served after a failed
    /// refresh.
    #[must_use]
    pub fn degraded(&self) -> &[String] {
        &self.degraded
    }

    /// Sources that could not be resolved and had no cached fallback.
    /// Their portion of the node is missing from the view.
    #[must_use]
    pub fn unavailable(&self) -> &[SourceFailure] {
        &self.unavailable
    }

    /// The earliest expiration among the merged contributions.
    #[must_use]
    pub fn expiration(&self) -> Expiration {
        self.view.expiration()
    }

    /// True iff the snapshot's aggregate deadline has passed.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.view.is_expired(now)
    }

    /// The publication sequence number for this node.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }
}
