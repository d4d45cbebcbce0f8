//! Breadth-first structural comparison.
//!
//! The engine owns one FIFO work queue of [`ComparisonNode`]s and one visited
//! set of [`PairKey`]s per invocation. Each dequeued node either ends in a
//! recorded difference, passes, is skipped as an already-compared pair, or is
//! decomposed into child nodes appended to the queue. Depth is bounded by
//! memory, never by the call stack.
//!
//! Unordered iterables are matched greedily: each actual element pairs with
//! the first unmatched expected element that a probe traversal finds equal.
//! A probe keeps its own visited set layered over the enclosing traversal's,
//! so it never revisits a pair the main traversal has already entered and
//! never leaks its own pairs back.

use crate::classify::{classify, Shape, TypeClass};
use crate::diff::model::{Comparison, Difference, DifferenceKind};
use crate::errors::Result;
use crate::model::{Leaf, MapKey, Value};
use crate::node::{ComparisonNode, PairKey};
use crate::path::Path;
use crate::policy::{ComparisonPolicy, ResolvedPolicy};
use crate::{log_op_end, log_op_error, log_op_start};
use deepcmp_core_types::RunId;
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};
use std::time::Instant;

pub const OP_COMPARE: &str = "compare";

/// Compare two value graphs under `policy`
///
/// The policy is resolved once before traversal starts. Structural
/// differences are never errors; they are returned in the [`Comparison`].
///
/// # Errors
///
/// Returns the policy configuration error from [`ComparisonPolicy::resolve`];
/// no traversal happens in that case.
pub fn compare(actual: &Value, expected: &Value, policy: &ComparisonPolicy) -> Result<Comparison> {
    let run_id = RunId::new();
    let start = Instant::now();
    log_op_start!(OP_COMPARE, run_id = %run_id);

    let resolved = match policy.resolve() {
        Ok(resolved) => resolved,
        Err(err) => {
            log_op_error!(
                OP_COMPARE,
                err.clone(),
                duration_ms = elapsed_ms(start),
                run_id = %run_id
            );
            return Err(err);
        }
    };

    Ok(run(actual, expected, &resolved, run_id, start))
}

/// Compare two value graphs under the default policy, which cannot fail
/// validation.
pub fn compare_default(actual: &Value, expected: &Value) -> Comparison {
    let run_id = RunId::new();
    let start = Instant::now();
    log_op_start!(OP_COMPARE, run_id = %run_id);

    let policy = ComparisonPolicy::default();
    run(actual, expected, &ResolvedPolicy::trivial(&policy), run_id, start)
}

fn run(
    actual: &Value,
    expected: &Value,
    policy: &ResolvedPolicy<'_>,
    run_id: RunId,
    start: Instant,
) -> Comparison {
    let mut traversal = Traversal::new(policy, Visited::default(), false);
    traversal.enqueue(ComparisonNode::root(actual.clone(), expected.clone()));
    traversal.drain();

    let comparison = Comparison {
        differences: traversal.differences,
        nodes_visited: traversal.nodes_visited,
        cycles_skipped: traversal.cycles_skipped,
        run_id,
    };
    log_op_end!(
        OP_COMPARE,
        duration_ms = elapsed_ms(start),
        run_id = %comparison.run_id,
        diff_count = comparison.len(),
        nodes_visited = comparison.nodes_visited,
        cycles_skipped = comparison.cycles_skipped
    );
    comparison
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Pairs entered so far: this traversal's own, plus those of every enclosing
/// traversal when probing.
#[derive(Default)]
struct Visited<'o> {
    local: HashSet<PairKey>,
    outer: Option<&'o Visited<'o>>,
}

impl<'o> Visited<'o> {
    fn overlay(outer: &'o Visited<'o>) -> Self {
        Self {
            local: HashSet::new(),
            outer: Some(outer),
        }
    }

    fn contains(&self, key: &PairKey) -> bool {
        let mut layer = Some(self);
        while let Some(visited) = layer {
            if visited.local.contains(key) {
                return true;
            }
            layer = visited.outer;
        }
        false
    }

    /// False when the pair was already entered at any layer
    fn insert(&mut self, key: PairKey) -> bool {
        if self.outer.is_some_and(|outer| outer.contains(&key)) {
            return false;
        }
        self.local.insert(key)
    }
}

/// State of one traversal: the main one, or a probe deciding whether two
/// unordered elements match.
struct Traversal<'r, 'p, 'o> {
    policy: &'r ResolvedPolicy<'p>,
    queue: VecDeque<ComparisonNode>,
    visited: Visited<'o>,
    differences: Vec<Difference>,
    nodes_visited: usize,
    cycles_skipped: usize,
    /// Probes stop at the first difference and do not log
    probe: bool,
}

impl<'r, 'p, 'o> Traversal<'r, 'p, 'o> {
    fn new(policy: &'r ResolvedPolicy<'p>, visited: Visited<'o>, probe: bool) -> Self {
        Self {
            policy,
            queue: VecDeque::new(),
            visited,
            differences: Vec::new(),
            nodes_visited: 0,
            cycles_skipped: 0,
            probe,
        }
    }

    fn enqueue(&mut self, node: ComparisonNode) {
        self.queue.push_back(node);
    }

    fn drain(&mut self) {
        while let Some(node) = self.queue.pop_front() {
            if self.probe && !self.differences.is_empty() {
                break;
            }
            self.visit(node);
        }
    }

    fn visit(&mut self, node: ComparisonNode) {
        self.nodes_visited += 1;

        if self.policy.skips(&node) {
            return;
        }

        if let Some(comparator) = self.policy.comparator_for(&node) {
            if !comparator.equals(node.actual(), node.expected()) {
                self.record(&node, DifferenceKind::ValueMismatch);
            }
            return;
        }

        // Covers both-null, the same composite on both sides and equal leaves.
        if node.actual().is_identical(node.expected()) {
            return;
        }

        if node.is_either_null() {
            self.compare_with_null(&node);
            return;
        }

        if node.has_potential_cycling_values() {
            if let Some(key) = node.pair_key() {
                if !self.visited.insert(key) {
                    self.cycles_skipped += 1;
                    if !self.probe {
                        tracing::debug!(path = %node.path(), "pair already compared, skipping");
                    }
                    return;
                }
            }
        }

        if self.policy.policy().strict_type_checking()
            && node.actual().type_name() != node.expected().type_name()
        {
            self.record(&node, DifferenceKind::ShapeMismatch);
            return;
        }

        let shape = self.effective_shape(classify(node.actual()));
        if shape != self.effective_shape(classify(node.expected())) {
            self.record(&node, DifferenceKind::ShapeMismatch);
            return;
        }

        match shape {
            Shape::Leaf => self.compare_leaves(&node),
            Shape::Object => self.decompose_object(&node),
            Shape::Map => self.decompose_map(&node),
            Shape::Array | Shape::OrderedCollection | Shape::AtomicArray => {
                self.decompose_sequence(&node)
            }
            Shape::UnorderedIterable => self.match_unordered(&node),
            Shape::Optional => self.unwrap_optional(&node),
            Shape::Atomic => self.unwrap_atomic(&node),
        }
    }

    fn effective_shape(&self, class: TypeClass) -> Shape {
        match class.shape() {
            Shape::Array | Shape::OrderedCollection
                if self.policy.policy().ignore_collection_order() =>
            {
                Shape::UnorderedIterable
            }
            shape => shape,
        }
    }

    /// Exactly one side is null
    fn compare_with_null(&mut self, node: &ComparisonNode) {
        let (kind, other) = if node.actual().is_null() {
            (DifferenceKind::MissingOnActual, node.expected())
        } else {
            (DifferenceKind::MissingOnExpected, node.actual())
        };
        if !self.policy.policy().treat_null_as_distinct_from_empty() && other.is_empty_container()
        {
            return;
        }
        self.record(node, kind);
    }

    fn compare_leaves(&mut self, node: &ComparisonNode) {
        let strict = self.policy.policy().strict_type_checking();
        let equal = match (node.actual(), node.expected()) {
            (Value::Leaf(a), Value::Leaf(e)) if strict => a.strict_eq(e),
            (Value::Leaf(a), Value::Leaf(e)) => Leaf::lenient_eq(a, e),
            (Value::Enum(a), Value::Enum(e)) => a == e,
            _ => false,
        };
        if !equal {
            self.record(node, DifferenceKind::ValueMismatch);
        }
    }

    fn decompose_object(&mut self, node: &ComparisonNode) {
        let actual_fields = node.actual().fields().unwrap_or_default();
        let expected_fields = node.expected().fields().unwrap_or_default();

        for (name, actual) in &actual_fields {
            match node.expected().field(name) {
                Some(expected) => self.enqueue(node.child(name.clone(), actual.clone(), expected)),
                None => self.record_absent(
                    node.path().child(name.clone()),
                    actual.clone(),
                    Value::Null,
                    DifferenceKind::MissingOnExpected,
                ),
            }
        }
        for (name, expected) in expected_fields {
            if node.actual().field(&name).is_none() {
                self.record_absent(
                    node.path().child(name),
                    Value::Null,
                    expected,
                    DifferenceKind::MissingOnActual,
                );
            }
        }
    }

    fn decompose_map(&mut self, node: &ComparisonNode) {
        let actual: IndexMap<MapKey, Value> =
            node.actual().entries().unwrap_or_default().into_iter().collect();
        let expected: IndexMap<MapKey, Value> =
            node.expected().entries().unwrap_or_default().into_iter().collect();

        for (key, value) in &actual {
            if self.partner(key, &actual, &expected).is_none() {
                self.record_absent(
                    node.path().key(key.clone()),
                    value.clone(),
                    Value::Null,
                    DifferenceKind::MissingOnExpected,
                );
            }
        }
        for (key, value) in &expected {
            if self.partner(key, &expected, &actual).is_none() {
                self.record_absent(
                    node.path().key(key.clone()),
                    Value::Null,
                    value.clone(),
                    DifferenceKind::MissingOnActual,
                );
            }
        }
        for (key, value) in &actual {
            if let Some(other) = self.partner(key, &actual, &expected) {
                self.enqueue(node.key(key.clone(), value.clone(), other.clone()));
            }
        }
    }

    /// Entry of `other` paired with `key` of `own`. Exact keys pair first;
    /// outside strict mode a signed and an unsigned key holding the same
    /// number also pair, unless `own` holds both forms.
    fn partner<'m>(
        &self,
        key: &MapKey,
        own: &IndexMap<MapKey, Value>,
        other: &'m IndexMap<MapKey, Value>,
    ) -> Option<&'m Value> {
        if let Some(value) = other.get(key) {
            return Some(value);
        }
        if self.policy.policy().strict_type_checking() {
            return None;
        }
        let twin = key.numeric_twin()?;
        if own.contains_key(&twin) {
            return None;
        }
        other.get(&twin)
    }

    fn decompose_sequence(&mut self, node: &ComparisonNode) {
        let actual = node.actual().elements().unwrap_or_default();
        let expected = node.expected().elements().unwrap_or_default();

        if actual.len() != expected.len() {
            self.record(node, DifferenceKind::SizeMismatch);
            return;
        }
        for (index, (a, e)) in actual.into_iter().zip(expected).enumerate() {
            self.enqueue(node.element(index, a, e));
        }
    }

    fn match_unordered(&mut self, node: &ComparisonNode) {
        let actual = node.actual().elements().unwrap_or_default();
        let expected = node.expected().elements().unwrap_or_default();

        let mut matched = vec![false; expected.len()];
        let mut unmatched_actual = Vec::new();

        for (i, a) in actual.iter().enumerate() {
            let path = node.path().element(i);
            let found = (0..expected.len())
                .find(|&j| !matched[j] && self.probe_equal(&path, a, &expected[j]));
            match found {
                Some(j) => matched[j] = true,
                None => unmatched_actual.push(i),
            }
        }

        for i in unmatched_actual {
            self.record_absent(
                node.path().element(i),
                actual[i].clone(),
                Value::Null,
                DifferenceKind::MissingOnExpected,
            );
        }
        for (j, e) in expected.into_iter().enumerate() {
            if !matched[j] {
                self.record_absent(
                    node.path().element(j),
                    Value::Null,
                    e,
                    DifferenceKind::MissingOnActual,
                );
            }
        }
    }

    /// Run an isolated traversal of one candidate pairing
    fn probe_equal(&self, path: &Path, actual: &Value, expected: &Value) -> bool {
        if actual.is_identical(expected) {
            return true;
        }
        let mut probe = Traversal::new(self.policy, Visited::overlay(&self.visited), true);
        probe.enqueue(ComparisonNode::new(
            path.clone(),
            actual.clone(),
            expected.clone(),
        ));
        probe.drain();
        probe.differences.is_empty()
    }

    fn unwrap_optional(&mut self, node: &ComparisonNode) {
        let actual = node.actual().wrapped().flatten();
        let expected = node.expected().wrapped().flatten();
        match (actual, expected) {
            (None, None) => {}
            (None, Some(_)) => self.record(node, DifferenceKind::MissingOnActual),
            (Some(_), None) => self.record(node, DifferenceKind::MissingOnExpected),
            (Some(a), Some(e)) => self.enqueue(node.unwrapped(a, e)),
        }
    }

    fn unwrap_atomic(&mut self, node: &ComparisonNode) {
        if let (Some(a), Some(e)) = (
            node.actual().wrapped().flatten(),
            node.expected().wrapped().flatten(),
        ) {
            self.enqueue(node.unwrapped(a, e));
        }
    }

    fn record(&mut self, node: &ComparisonNode, kind: DifferenceKind) {
        if !self.probe && kind == DifferenceKind::ShapeMismatch {
            tracing::debug!(
                path = %node.path(),
                actual = %node.actual().type_name(),
                expected = %node.expected().type_name(),
                "incompatible shapes"
            );
        }
        self.differences.push(Difference::new(
            node.path().clone(),
            node.actual().clone(),
            node.expected().clone(),
            kind,
        ));
    }

    /// Record a field, key or element present on one side only, unless the
    /// policy ignores it or a comparator registered for it accepts the pair.
    fn record_absent(&mut self, path: Path, actual: Value, expected: Value, kind: DifferenceKind) {
        if self.policy.is_path_ignored(&path)
            || self.policy.is_type_ignored(&actual)
            || self.policy.is_type_ignored(&expected)
        {
            return;
        }
        let node = ComparisonNode::new(path, actual, expected);
        if let Some(comparator) = self.policy.comparator_for(&node) {
            if comparator.equals(node.actual(), node.expected()) {
                return;
            }
        }
        let (path, actual, expected) = node.into_parts();
        self.differences
            .push(Difference::new(path, actual, expected, kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::AlwaysEqualComparator;

    fn person(name: &str, age: i64) -> Value {
        Value::object("Person", [("name", Value::from(name)), ("age", Value::from(age))])
    }

    #[test]
    fn test_equal_records() {
        let c = compare_default(&person("Jack", 40), &person("Jack", 40));
        assert!(c.is_equal());
        assert!(c.nodes_visited >= 3);
    }

    #[test]
    fn test_leaf_mismatch_path() {
        let c = compare_default(&person("Jack", 40), &person("Jack", 41));
        assert_eq!(c.paths(), vec!["age"]);
        assert_eq!(c.differences[0].kind, DifferenceKind::ValueMismatch);
    }

    #[test]
    fn test_one_null_side() {
        let c = compare_default(&Value::Null, &person("Jack", 40));
        assert_eq!(c.differences[0].kind, DifferenceKind::MissingOnActual);
        let c = compare_default(&person("Jack", 40), &Value::Null);
        assert_eq!(c.differences[0].kind, DifferenceKind::MissingOnExpected);
    }

    #[test]
    fn test_null_equals_empty_when_configured() {
        let policy = ComparisonPolicy::new().with_null_distinct_from_empty(false);
        let empty = Value::list(Vec::<Value>::new());
        assert!(compare(&Value::Null, &empty, &policy).unwrap().is_equal());
        assert!(!compare_default(&Value::Null, &empty).is_equal());
        let non_empty = Value::list([1]);
        assert!(!compare(&Value::Null, &non_empty, &policy).unwrap().is_equal());
    }

    #[test]
    fn test_self_cycle_terminates() {
        let a = Value::object("Node", [("v", 1)]);
        a.set_field("next", a.clone()).unwrap();
        let b = Value::object("Node", [("v", 1)]);
        b.set_field("next", b.clone()).unwrap();

        let c = compare_default(&a, &b);
        assert!(c.is_equal());
        assert_eq!(c.cycles_skipped, 1);
    }

    #[test]
    fn test_size_mismatch_is_one_difference_at_node() {
        let c = compare_default(&Value::list([1, 2, 3]), &Value::list([1, 2]));
        assert_eq!(c.len(), 1);
        assert_eq!(c.differences[0].kind, DifferenceKind::SizeMismatch);
        assert!(c.differences[0].path.is_root());
    }

    #[test]
    fn test_unordered_greedy_matching() {
        let c = compare_default(&Value::set([1, 2, 3]), &Value::set([3, 1, 2]));
        assert!(c.is_equal());

        let c = compare_default(&Value::set([1, 2, 4]), &Value::set([3, 1, 2]));
        assert_eq!(c.len(), 2);
        assert_eq!(c.differences[0].kind, DifferenceKind::MissingOnExpected);
        assert_eq!(c.differences[0].path.render(), "[2]");
        assert_eq!(c.differences[1].kind, DifferenceKind::MissingOnActual);
        assert_eq!(c.differences[1].path.render(), "[0]");
    }

    #[test]
    fn test_ignore_collection_order() {
        let policy = ComparisonPolicy::new().ignoring_collection_order(true);
        let c = compare(&Value::list([1, 2, 3]), &Value::list([3, 2, 1]), &policy).unwrap();
        assert!(c.is_equal());
        assert!(!compare_default(&Value::list([1, 2, 3]), &Value::list([3, 2, 1])).is_equal());
    }

    #[test]
    fn test_lenient_and_strict_integers() {
        let signed = Value::from(5_i64);
        let unsigned = Value::from(5_u64);
        assert!(compare_default(&signed, &unsigned).is_equal());

        let strict = ComparisonPolicy::new().with_strict_type_checking(true);
        let c = compare(&signed, &unsigned, &strict).unwrap();
        assert_eq!(c.differences[0].kind, DifferenceKind::ShapeMismatch);
    }

    #[test]
    fn test_strict_mode_flags_record_type_difference() {
        let a = Value::object("Person", [("name", "Jack")]);
        let b = Value::object("Employee", [("name", "Jack")]);
        assert!(compare_default(&a, &b).is_equal());

        let strict = ComparisonPolicy::new().with_strict_type_checking(true);
        assert!(!compare(&a, &b, &strict).unwrap().is_equal());
    }

    #[test]
    fn test_field_comparator_replaces_decision() {
        let policy = ComparisonPolicy::new().with_field_comparator("age", AlwaysEqualComparator);
        let c = compare(&person("Jack", 40), &person("Jack", 99), &policy).unwrap();
        assert!(c.is_equal());
    }

    #[test]
    fn test_invalid_policy_stops_before_traversal() {
        let policy = ComparisonPolicy::new().ignoring_fields([""]);
        assert!(compare(&Value::from(1), &Value::from(2), &policy).is_err());
    }

    #[test]
    fn test_visited_overlay_reads_outer_without_writing_it() {
        let seen = PairKey {
            actual: 1,
            expected: 2,
        };
        let fresh = PairKey {
            actual: 3,
            expected: 4,
        };
        let mut outer = Visited::default();
        assert!(outer.insert(seen));

        let mut overlay = Visited::overlay(&outer);
        assert!(overlay.contains(&seen));
        assert!(!overlay.insert(seen));
        assert!(overlay.insert(fresh));
        assert!(!overlay.insert(fresh));

        drop(overlay);
        assert!(!outer.contains(&fresh));
    }

    #[test]
    fn test_ignored_missing_field_not_reported() {
        let a = Value::object("T", [("id", 1), ("x", 2)]);
        let b = Value::object("T", [("x", 2)]);
        assert_eq!(compare_default(&a, &b).paths(), vec!["id"]);

        let policy = ComparisonPolicy::new().ignoring_fields(["id"]);
        assert!(compare(&a, &b, &policy).unwrap().is_equal());
    }
}
