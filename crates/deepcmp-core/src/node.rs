//! Comparison nodes: a path paired with one actual and one expected value.
//!
//! ## Equality
//!
//! Two nodes are equal when their paths are equal and both sides refer to the
//! *same* objects. Hashing uses only identity (allocation address for
//! composites, a per-variant constant for inline values), never contents, so
//! nodes are usable as set keys even over mutable graphs.
//!
//! ## Same pair
//!
//! [`ComparisonNode::same_pair`] ignores the path. It is the relation used for
//! cycle detection: when Jack's neighbour is Tim and Tim's neighbour is Jack,
//! the pair (Jack, Jack') is reached both at the root and at
//! `neighbour.neighbour`, and the second visit must be recognised.

use crate::classify::classify;
use crate::model::{MapKey, Value};
use crate::path::{Path, Segment};
use std::borrow::Cow;
use std::hash::{Hash, Hasher};

/// Identity key of a (actual, expected) pair of composites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    pub actual: usize,
    pub expected: usize,
}

/// Unit of traversal work. Immutable once built.
#[derive(Debug, Clone)]
pub struct ComparisonNode {
    path: Path,
    actual: Value,
    expected: Value,
}

impl ComparisonNode {
    pub fn new(path: Path, actual: Value, expected: Value) -> Self {
        Self {
            path,
            actual,
            expected,
        }
    }

    /// Node for the two top-level values
    pub fn root(actual: Value, expected: Value) -> Self {
        Self::new(Path::root(), actual, expected)
    }

    /// Child node one field below this one
    pub fn child(&self, segment: impl Into<Segment>, actual: Value, expected: Value) -> Self {
        Self::new(self.path.child(segment), actual, expected)
    }

    /// Child node for the map entry stored under `key`
    pub fn key(&self, key: MapKey, actual: Value, expected: Value) -> Self {
        Self::new(self.path.key(key), actual, expected)
    }

    /// Child node for the element at `index`
    pub fn element(&self, index: usize, actual: Value, expected: Value) -> Self {
        Self::new(self.path.element(index), actual, expected)
    }

    /// Node at the same path holding unwrapped values
    pub fn unwrapped(&self, actual: Value, expected: Value) -> Self {
        Self::new(self.path.clone(), actual, expected)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn actual(&self) -> &Value {
        &self.actual
    }

    pub fn expected(&self) -> &Value {
        &self.expected
    }

    pub fn into_parts(self) -> (Path, Value, Value) {
        (self.path, self.actual, self.expected)
    }

    pub fn field_name(&self) -> Cow<'_, str> {
        self.path.field_name()
    }

    pub fn rule_path(&self) -> String {
        self.path.rule_path()
    }

    /// Same actual and expected objects, regardless of path
    pub fn same_pair(&self, other: &ComparisonNode) -> bool {
        self.actual.is_identical(&other.actual) && self.expected.is_identical(&other.expected)
    }

    /// Identity key for the visited set; only composites on both sides have one
    pub fn pair_key(&self) -> Option<PairKey> {
        Some(PairKey {
            actual: self.actual.identity()?,
            expected: self.expected.identity()?,
        })
    }

    pub fn is_both_null(&self) -> bool {
        self.actual.is_null() && self.expected.is_null()
    }

    pub fn is_either_null(&self) -> bool {
        self.actual.is_null() || self.expected.is_null()
    }

    /// Neither side is a container (records count as non-containers)
    pub fn has_only_opaque_leaf_values(&self) -> bool {
        !self.has_container_on_either_side()
    }

    pub fn has_container_on_either_side(&self) -> bool {
        classify(&self.actual).is_container() || classify(&self.expected).is_container()
    }

    /// Both sides could take part in a reference cycle
    pub fn has_potential_cycling_values(&self) -> bool {
        classify(&self.actual).is_cycle_capable() && classify(&self.expected).is_cycle_capable()
    }
}

impl PartialEq for ComparisonNode {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.same_pair(other)
    }
}

impl Eq for ComparisonNode {}

impl Hash for ComparisonNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        identity_hash(&self.actual, state);
        identity_hash(&self.expected, state);
    }
}

fn identity_hash<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => 0_u8.hash(state),
        Value::Leaf(_) => 1_u8.hash(state),
        Value::Enum(_) => 2_u8.hash(state),
        Value::Ref(shared) => {
            3_u8.hash(state);
            shared.addr().hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn person(name: &str) -> Value {
        Value::object("Person", [("name", name)])
    }

    #[test]
    fn test_equality_requires_identity_not_content() {
        let a = person("Jack");
        let b = person("Jack");

        let n1 = ComparisonNode::root(a.clone(), b.clone());
        let n2 = ComparisonNode::root(a.clone(), b.clone());
        let n3 = ComparisonNode::root(person("Jack"), b.clone());

        assert_eq!(n1, n2);
        assert_ne!(n1, n3);
    }

    #[test]
    fn test_same_pair_ignores_path() {
        let a = person("Jack");
        let b = person("Jack");

        let at_root = ComparisonNode::root(a.clone(), b.clone());
        let deeper = ComparisonNode::new(
            Path::from_segments(["neighbour", "neighbour"]),
            a.clone(),
            b.clone(),
        );

        assert!(at_root.same_pair(&deeper));
        assert_ne!(at_root, deeper);
        assert_eq!(at_root.pair_key(), deeper.pair_key());
    }

    #[test]
    fn test_nodes_as_set_keys() {
        let a = person("Jack");
        let b = person("Jack");
        let mut set = HashSet::new();

        set.insert(ComparisonNode::root(a.clone(), b.clone()));
        // Mutating a referenced value must not change membership.
        a.set_field("name", "Tim").unwrap();

        assert!(set.contains(&ComparisonNode::root(a, b)));
    }

    #[test]
    fn test_child_derives_path() {
        let root = ComparisonNode::root(Value::Null, Value::Null);
        let child = root.child("address", Value::from(1), Value::from(2));
        let element = child.element(0, Value::Null, Value::Null);

        assert_eq!(child.field_name(), "address");
        assert_eq!(element.path().render(), "address[0]");
        assert_eq!(element.rule_path(), "address");

        let entry = child.key(MapKey::from("[0]"), Value::Null, Value::Null);
        assert_eq!(entry.path().render(), "address{\"[0]\"}");
        assert_ne!(entry.path(), element.path());
    }

    #[test]
    fn test_null_predicates() {
        let both = ComparisonNode::root(Value::Null, Value::Null);
        let one = ComparisonNode::root(Value::from(1), Value::Null);
        let none = ComparisonNode::root(Value::from(1), Value::from(2));

        assert!(both.is_both_null() && both.is_either_null());
        assert!(!one.is_both_null() && one.is_either_null());
        assert!(!none.is_either_null());
    }

    #[test]
    fn test_container_predicates() {
        let leaves = ComparisonNode::root(Value::from(1), Value::from("x"));
        let records = ComparisonNode::root(person("a"), person("b"));
        let mixed = ComparisonNode::root(Value::list([1]), Value::from(1));

        assert!(leaves.has_only_opaque_leaf_values());
        assert!(records.has_only_opaque_leaf_values());
        assert!(mixed.has_container_on_either_side());
    }

    #[test]
    fn test_cycling_values_exclude_leaves_and_enums() {
        let objects = ComparisonNode::root(person("a"), person("b"));
        let enums = ComparisonNode::root(
            Value::enum_const("Color", "Red"),
            Value::enum_const("Color", "Red"),
        );
        let half = ComparisonNode::root(person("a"), Value::from(1));

        assert!(objects.has_potential_cycling_values());
        assert!(!enums.has_potential_cycling_values());
        assert!(!half.has_potential_cycling_values());
        assert!(half.pair_key().is_none());
    }
}
