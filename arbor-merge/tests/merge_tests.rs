use arbor_merge::MergeEngine;
use arbor_types::{Contribution, Expiration, NodePath, PathSegment, Property, Timestamp};
use pretty_assertions::assert_eq;
use serde_json::json;

fn path() -> NodePath {
    "/docs".parse().unwrap()
}

fn at(millis: u64) -> Expiration {
    Expiration::At(Timestamp::from_millis(millis))
}

fn with_properties(source: &str, properties: Vec<Property>, expiration: Expiration) -> Contribution {
    Contribution::new(source, path(), expiration, properties, vec![]).unwrap()
}

fn with_children(source: &str, children: Vec<PathSegment>, expiration: Expiration) -> Contribution {
    Contribution::new(source, path(), expiration, vec![], children).unwrap()
}

// ── Property shadowing ───────────────────────────────────────────

#[test]
fn highest_priority_definition_wins() {
    let a = with_properties(
        "a",
        vec![Property::single("x", json!(1))],
        Expiration::Never,
    );
    let b = with_properties(
        "b",
        vec![Property::single("x", json!(2)), Property::single("y", json!(3))],
        Expiration::Never,
    );

    let view = MergeEngine::merge(&[a, b]);

    assert_eq!(view.property_count(), 2);
    assert_eq!(view.property("x"), Some(&Property::single("x", json!(1))));
    assert_eq!(view.property("y"), Some(&Property::single("y", json!(3))));
}

#[test]
fn shadowing_is_by_name_not_by_value() {
    let a = with_properties(
        "a",
        vec![Property::new("x", vec![json!(1), json!(2)])],
        Expiration::Never,
    );
    let b = with_properties(
        "b",
        vec![Property::new("x", vec![json!(1), json!(2)])],
        Expiration::Never,
    );

    let view = MergeEngine::merge(&[a, b]);
    // Identical values still resolve to the single first definition.
    assert_eq!(view.property_count(), 1);
}

#[test]
fn reversing_priority_reverses_the_winner() {
    let a = with_properties("a", vec![Property::single("x", json!(1))], Expiration::Never);
    let b = with_properties("b", vec![Property::single("x", json!(2))], Expiration::Never);

    let forward = MergeEngine::merge(&[a.clone(), b.clone()]);
    let reverse = MergeEngine::merge(&[b, a]);

    assert_eq!(forward.property("x"), Some(&Property::single("x", json!(1))));
    assert_eq!(reverse.property("x"), Some(&Property::single("x", json!(2))));
}

// ── Child union with de-dup ──────────────────────────────────────

#[test]
fn exact_child_duplicates_collapse_to_first_occurrence() {
    let a = with_children(
        "a",
        vec![PathSegment::new("foo"), PathSegment::new("bar")],
        Expiration::Never,
    );
    let b = with_children(
        "b",
        vec![PathSegment::new("bar"), PathSegment::new("baz")],
        Expiration::Never,
    );

    let view = MergeEngine::merge(&[a, b]);

    assert_eq!(
        view.children(),
        &[
            PathSegment::new("foo"),
            PathSegment::new("bar"),
            PathSegment::new("baz"),
        ]
    );
}

#[test]
fn same_name_siblings_with_distinct_indices_all_survive() {
    let a = with_children("a", vec![PathSegment::with_index("ch", 1)], Expiration::Never);
    let b = with_children("b", vec![PathSegment::with_index("ch", 2)], Expiration::Never);

    let view = MergeEngine::merge(&[a, b]);

    assert_eq!(view.child_count(), 2);
    assert_eq!(
        view.children(),
        &[PathSegment::with_index("ch", 1), PathSegment::with_index("ch", 2)]
    );
}

#[test]
fn children_concatenate_in_priority_order() {
    let a = with_children("a", vec![PathSegment::new("z")], Expiration::Never);
    let b = with_children("b", vec![PathSegment::new("a")], Expiration::Never);

    let view = MergeEngine::merge(&[a, b]);
    // Priority order, not name order.
    assert_eq!(view.children(), &[PathSegment::new("z"), PathSegment::new("a")]);
}

// ── Expiration ───────────────────────────────────────────────────

#[test]
fn effective_expiration_is_the_minimum() {
    let a = with_properties("a", vec![Property::single("x", json!(1))], at(100));
    let b = with_properties("b", vec![Property::single("y", json!(2))], at(50));

    let view = MergeEngine::merge(&[a, b]);
    assert_eq!(view.expiration(), at(50));
}

#[test]
fn never_expiring_contributions_do_not_shorten_the_window() {
    let a = with_properties("a", vec![Property::single("x", json!(1))], at(100));
    let b = with_properties("b", vec![Property::single("y", json!(2))], Expiration::Never);

    let view = MergeEngine::merge(&[a, b]);
    assert_eq!(view.expiration(), at(100));
}

#[test]
fn all_never_yields_never() {
    let a = with_properties("a", vec![Property::single("x", json!(1))], Expiration::Never);
    let view = MergeEngine::merge(&[a]);
    assert_eq!(view.expiration(), Expiration::Never);
}

// ── Empty input ──────────────────────────────────────────────────

#[test]
fn no_contributions_is_an_empty_view_that_never_expires() {
    let view = MergeEngine::merge(&[]);
    assert!(view.is_empty());
    assert_eq!(view.expiration(), Expiration::Never);
}

#[test]
fn empty_contributions_add_nothing_but_their_expiration() {
    let a = with_properties("a", vec![Property::single("x", json!(1))], Expiration::Never);
    let empty = Contribution::empty("b", at(30)).unwrap();

    let view = MergeEngine::merge(&[a, empty]);

    assert_eq!(view.property_count(), 1);
    assert_eq!(view.child_count(), 0);
    // Even an empty answer ages: the node must be re-asked once the
    // source's answer expires.
    assert_eq!(view.expiration(), at(30));
}

// ── Determinism / idempotence ────────────────────────────────────

#[test]
fn merge_is_deterministic() {
    let contributions = vec![
        Contribution::new(
            "a",
            path(),
            at(100),
            vec![Property::single("x", json!(1))],
            vec![PathSegment::new("foo")],
        )
        .unwrap(),
        Contribution::new(
            "b",
            path(),
            at(50),
            vec![Property::single("x", json!(2)), Property::single("y", json!(3))],
            vec![PathSegment::new("foo"), PathSegment::new("bar")],
        )
        .unwrap(),
    ];

    let first = MergeEngine::merge(&contributions);
    let second = MergeEngine::merge(&contributions);
    assert_eq!(first, second);
}

#[test]
fn merge_of_unchanged_inputs_is_byte_identical() {
    let contributions = vec![
        with_properties("a", vec![Property::single("x", json!(1))], at(100)),
        with_children("b", vec![PathSegment::new("bar")], at(50)),
    ];

    let first = serde_json::to_vec(&MergeEngine::merge(&contributions)).unwrap();
    let second = serde_json::to_vec(&MergeEngine::merge(&contributions)).unwrap();
    assert_eq!(first, second);
}

// ── Paths in source ──────────────────────────────────────────────

#[test]
fn differing_paths_in_source_do_not_affect_the_merge() {
    let a = Contribution::new(
        "a",
        "/mirror/docs".parse().unwrap(),
        Expiration::Never,
        vec![Property::single("x", json!(1))],
        vec![],
    )
    .unwrap();
    let b = Contribution::new(
        "b",
        "/store/d0cs".parse().unwrap(),
        Expiration::Never,
        vec![Property::single("y", json!(2))],
        vec![],
    )
    .unwrap();

    let view = MergeEngine::merge(&[a, b]);
    assert_eq!(view.property_count(), 2);
}
