//! The effective (merged) view of a federated node.

use arbor_types::{Expiration, PathSegment, Property, Timestamp};
use serde::{Deserialize, Serialize};

/// The merged, multi-source view of one node.
///
/// Produced by [`MergeEngine::merge`](crate::MergeEngine::merge) and
/// recomputed whenever any constituent contribution changes. The view is
/// immutable; accessors mirror the contribution contract.
///
/// The view's expiration is the earliest expiration among the
/// contributions it was merged from: a node is only as fresh as its
/// least-fresh source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EffectiveView {
    properties: Vec<Property>,
    children: Vec<PathSegment>,
    expiration: Expiration,
}

impl EffectiveView {
    pub(crate) fn new(
        properties: Vec<Property>,
        children: Vec<PathSegment>,
        expiration: Expiration,
    ) -> Self {
        Self {
            properties,
            children,
            expiration,
        }
    }

    /// Looks up a resolved property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// All resolved properties, in first-definition (priority) order.
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// The number of resolved properties.
    #[must_use]
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// The resolved children, in priority-concatenation order.
    #[must_use]
    pub fn children(&self) -> &[PathSegment] {
        &self.children
    }

    /// The number of resolved children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// The earliest expiration among the merged contributions.
    #[must_use]
    pub const fn expiration(&self) -> Expiration {
        self.expiration
    }

    /// True iff a concrete deadline is set and `now` has reached it.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiration.is_expired(now)
    }

    /// True when no source contributed any property or child.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.children.is_empty()
    }
}
