#![allow(clippy::unwrap_used, clippy::expect_used)]

use deepcmp_core::diff::{compare_default, DifferenceKind};
use deepcmp_core::model::Value;

const DEPTH: usize = 50_000;

/// Linked list of `depth` nodes ending in a node holding `tail`
fn chain(depth: usize, tail: i64) -> Value {
    let mut node = Value::object("Node", [("value", Value::from(tail))]);
    for i in 0..depth {
        node = Value::object(
            "Node",
            [("value", Value::from(i as i64)), ("next", node)],
        );
    }
    node
}

fn record(id: i64, owner: &Value) -> Value {
    Value::object("Record", [("id", Value::from(id)), ("owner", owner.clone())])
}

// ===== Depth =====

#[test]
fn test_deep_equal_chains_compare_equal() {
    let c = compare_default(&chain(DEPTH, 7), &chain(DEPTH, 7));
    assert!(c.is_equal());
    assert_eq!(c.cycles_skipped, 0);
    assert!(c.nodes_visited > 2 * DEPTH);
}

#[test]
fn test_deep_difference_keeps_full_path() {
    let c = compare_default(&chain(DEPTH, 7), &chain(DEPTH, 8));
    assert_eq!(c.len(), 1);

    let difference = &c.differences[0];
    assert_eq!(difference.kind, DifferenceKind::ValueMismatch);
    assert_eq!(difference.path.depth(), DEPTH + 1);
    assert_eq!(difference.path.field_name(), "value");
    assert!(difference.path.render().starts_with("next.next.next"));
    assert!(difference.path.rule_path().ends_with("next.next.value"));
}

#[test]
fn test_dropping_deep_graph_does_not_overflow() {
    let value = chain(200_000, 0);
    drop(value);
}

#[test]
fn test_dropping_deep_graph_after_comparison() {
    let actual = chain(DEPTH, 1);
    let expected = chain(DEPTH, 2);
    let c = compare_default(&actual, &expected);
    drop(actual);
    drop(expected);

    // Differences keep their values alive after the roots are gone
    assert_eq!(c.differences[0].actual.as_leaf().map(|l| l.to_string()), Some("1".to_string()));
    drop(c);
}

// ===== Unordered matching =====

#[test]
fn test_unordered_matching_after_many_visited_pairs() {
    let build = |reversed: bool| {
        let mut ids: Vec<i64> = (0..300).collect();
        if reversed {
            ids.reverse();
        }
        Value::object(
            "Catalog",
            [
                ("history", chain(5_000, 0)),
                ("items", Value::set(ids.into_iter().map(|i| Value::object("Item", [("id", i)])))),
            ],
        )
    };

    let c = compare_default(&build(false), &build(true));
    assert!(c.is_equal());
}

#[test]
fn test_failed_matching_does_not_hide_later_pairs() {
    let owner_actual = Value::object("Owner", [("name", "Jack")]);
    let owner_expected = Value::object("Owner", [("name", "Tim")]);

    let actual = Value::object(
        "Holder",
        [
            ("items", Value::set([record(1, &owner_actual)])),
            ("owner", owner_actual.clone()),
        ],
    );
    let expected = Value::object(
        "Holder",
        [
            ("items", Value::set([record(1, &owner_expected)])),
            ("owner", owner_expected.clone()),
        ],
    );

    let c = compare_default(&actual, &expected);
    assert_eq!(c.paths(), vec!["items[0]", "items[0]", "owner.name"]);
    assert_eq!(c.at("owner.name").unwrap().kind, DifferenceKind::ValueMismatch);
    assert_eq!(c.cycles_skipped, 0);
}

#[test]
fn test_successful_matching_does_not_mark_pairs_visited() {
    let owner_actual = Value::object("Owner", [("name", "Jack")]);
    let owner_expected = Value::object("Owner", [("name", "Jack")]);

    let build = |owner: &Value| {
        Value::object(
            "Holder",
            [
                ("items", Value::set([record(1, owner), record(2, owner)])),
                ("owner", owner.clone()),
            ],
        )
    };

    let c = compare_default(&build(&owner_actual), &build(&owner_expected));
    assert!(c.is_equal());
    assert_eq!(c.cycles_skipped, 0);
}
