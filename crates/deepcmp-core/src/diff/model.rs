//! Comparison output types.
//!
//! Differences reference the compared values themselves; [`DifferenceSummary`]
//! is the serialisable projection used for reports and determinism checks.

use crate::model::{Composite, Value};
use crate::path::Path;
use deepcmp_core_types::RunId;
use serde::{Deserialize, Serialize};

/// Classification of one recorded difference
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceKind {
    /// Leaf inequality, or a custom comparator returned false
    ValueMismatch,
    /// Actual is null (or an absent optional, or lacks the field/key/element)
    MissingOnActual,
    /// Expected is null (or an absent optional, or lacks the field/key/element)
    MissingOnExpected,
    /// The two sides are decomposed differently
    ShapeMismatch,
    /// Ordered sequences of different lengths
    SizeMismatch,
}

/// One divergence at one path
#[derive(Debug, Clone)]
pub struct Difference {
    pub path: Path,
    pub actual: Value,
    pub expected: Value,
    pub kind: DifferenceKind,
}

impl Difference {
    pub fn new(path: Path, actual: Value, expected: Value, kind: DifferenceKind) -> Self {
        Self {
            path,
            actual,
            expected,
            kind,
        }
    }

    pub fn summary(&self) -> DifferenceSummary {
        DifferenceSummary {
            path: self.path.render(),
            kind: self.kind,
            actual: describe(&self.actual),
            expected: describe(&self.expected),
        }
    }
}

/// Serialisable rendering of a [`Difference`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DifferenceSummary {
    pub path: String,
    pub kind: DifferenceKind,
    pub actual: String,
    pub expected: String,
}

/// Outcome of one invocation
#[derive(Debug, Clone, Default)]
pub struct Comparison {
    /// Differences in discovery order
    pub differences: Vec<Difference>,
    /// Nodes dequeued by the main traversal (probe traversals excluded)
    pub nodes_visited: usize,
    /// Nodes skipped because their pair was already compared
    pub cycles_skipped: usize,
    /// Correlates this result with the invocation's log events
    pub run_id: RunId,
}

impl Comparison {
    /// Structural equality holds
    pub fn is_equal(&self) -> bool {
        self.differences.is_empty()
    }

    pub fn len(&self) -> usize {
        self.differences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    /// Rendered paths in discovery order
    pub fn paths(&self) -> Vec<String> {
        self.differences.iter().map(|d| d.path.render()).collect()
    }

    pub fn summaries(&self) -> Vec<DifferenceSummary> {
        self.differences.iter().map(Difference::summary).collect()
    }

    /// First difference recorded at `path` (rendered form)
    pub fn at(&self, path: &str) -> Option<&Difference> {
        self.differences.iter().find(|d| d.path.render() == path)
    }
}

/// Short, non-recursive description of a value.
///
/// Composites are described by type and size only, so cyclic graphs are safe
/// to describe.
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Leaf(leaf) => leaf.to_string(),
        Value::Enum(e) => e.to_string(),
        Value::Ref(shared) => {
            let composite = shared.borrow();
            let type_name = composite.type_name();
            match &*composite {
                Composite::Object(o) => format!("{} {{{} fields}}", type_name, o.fields.len()),
                Composite::Array(v) => format!("{}[{}]", type_name, v.len()),
                Composite::Collection(c) => format!("{}[{}]", type_name, c.elements.len()),
                Composite::Map(m) => format!("{}{{{} entries}}", type_name, m.entries.len()),
                Composite::Optional(o) if o.is_present() => format!("{}(present)", type_name),
                Composite::Optional(_) => format!("{}(empty)", type_name),
                Composite::Atomic(a) => match a.elements() {
                    Some(elements) => format!("{}[{}]", type_name, elements.len()),
                    None => type_name,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_comparison_is_equal() {
        let c = Comparison::default();
        assert!(c.is_equal());
        assert!(c.is_empty());
        assert_eq!(c.len(), 0);
    }

    #[test]
    fn test_summary_renders_path_and_values() {
        let d = Difference::new(
            Path::root().child("orders").element(2).child("sku"),
            Value::from("A-1"),
            Value::Null,
            DifferenceKind::MissingOnExpected,
        );
        let s = d.summary();
        assert_eq!(s.path, "orders[2].sku");
        assert_eq!(s.actual, "\"A-1\"");
        assert_eq!(s.expected, "null");
        assert_eq!(s.kind, DifferenceKind::MissingOnExpected);
    }

    #[test]
    fn test_kind_serialises_snake_case() {
        let json = serde_json::to_string(&DifferenceKind::ShapeMismatch).unwrap();
        assert_eq!(json, "\"shape_mismatch\"");
    }

    #[test]
    fn test_describe_is_shallow_for_cycles() {
        let node = Value::object("Node", [("next", Value::Null)]);
        node.set_field("next", node.clone()).unwrap();
        assert_eq!(describe(&node), "Node {1 fields}");
        assert_eq!(describe(&Value::list([1, 2])), "list[2]");
        assert_eq!(describe(&Value::optional(None)), "optional(empty)");
    }
}
