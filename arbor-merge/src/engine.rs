//! The merge algorithm.

use crate::view::EffectiveView;
use arbor_types::{Contribution, Expiration, PathSegment, Property};
use std::collections::HashSet;

/// Merges an ordered contribution list into an effective node view.
///
/// The list order is the source priority order, highest priority first.
/// Merging is a pure function of that ordered list: no I/O, no state, no
/// clock reads, O(total properties + children) in a single pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeEngine;

impl MergeEngine {
    /// Computes the effective view of a node from its contributions.
    ///
    /// - Properties: the first (highest-priority) contribution to define a
    ///   name wins; later definitions are shadowed, not merged and not
    ///   reported as conflicts.
    /// - Children: concatenated in priority order; an exact (name, index)
    ///   duplicate is kept only at its first occurrence, while distinct
    ///   sibling indices for the same name all survive.
    /// - Expiration: the earliest among all contributions, with `Never`
    ///   acting as positive infinity.
    ///
    /// Zero contributions produce an empty view that never expires; the
    /// caller decides whether that means "node does not exist".
    #[must_use]
    pub fn merge(contributions: &[Contribution]) -> EffectiveView {
        // Cheap path for the overwhelmingly common single-source node.
        if let [only] = contributions {
            return Self::merge_one(only);
        }

        let mut properties: Vec<Property> = Vec::new();
        let mut seen_names: HashSet<&str> = HashSet::new();
        let mut children: Vec<PathSegment> = Vec::new();
        let mut seen_children: HashSet<&PathSegment> = HashSet::new();
        let mut expiration = Expiration::Never;

        for contribution in contributions {
            for property in contribution.properties() {
                if seen_names.insert(property.name()) {
                    properties.push(property.clone());
                }
            }
            for child in contribution.children() {
                if seen_children.insert(child) {
                    children.push(child.clone());
                }
            }
            expiration = expiration.earliest(contribution.expiration());
        }

        EffectiveView::new(properties, children, expiration)
    }

    /// Single-contribution merge: the source's own view, verbatim.
    ///
    /// Contributions already hold duplicate-free properties and ordered
    /// children, so no resolution work is needed. Observationally
    /// identical to the general path.
    fn merge_one(contribution: &Contribution) -> EffectiveView {
        EffectiveView::new(
            contribution.properties().to_vec(),
            contribution.children().to_vec(),
            contribution.expiration(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_types::{NodePath, Timestamp};
    use serde_json::json;

    fn at(millis: u64) -> Expiration {
        Expiration::At(Timestamp::from_millis(millis))
    }

    #[test]
    fn zero_contributions_yield_empty_never_expiring_view() {
        let view = MergeEngine::merge(&[]);
        assert!(view.is_empty());
        assert_eq!(view.expiration(), Expiration::Never);
    }

    #[test]
    fn single_contribution_passes_through() {
        let contribution = Contribution::new(
            "alpha",
            NodePath::root(),
            at(500),
            vec![Property::single("title", json!("hello"))],
            vec![PathSegment::new("child")],
        )
        .unwrap();
        let view = MergeEngine::merge(std::slice::from_ref(&contribution));
        assert_eq!(view.property_count(), 1);
        assert_eq!(view.child_count(), 1);
        assert_eq!(view.expiration(), at(500));
    }

    #[test]
    fn single_path_matches_general_path() {
        let contribution = Contribution::new(
            "alpha",
            NodePath::root(),
            at(500),
            vec![Property::single("title", json!("hello"))],
            vec![PathSegment::new("child")],
        )
        .unwrap();
        let never_empty = Contribution::empty("beta", Expiration::Never).unwrap();
        let one = MergeEngine::merge(std::slice::from_ref(&contribution));
        let two = MergeEngine::merge(&[contribution, never_empty]);
        assert_eq!(one, two);
    }
}
