//! Comparison policy: ignore rules, custom comparators and type strictness.
//!
//! A [`ComparisonPolicy`] is built by the caller and checked once per
//! invocation by [`ComparisonPolicy::resolve`]. Resolution either returns a
//! [`ResolvedPolicy`] (patterns compiled, paths validated) or a single
//! configuration error; traversal never starts with an invalid policy.
//!
//! Rule paths are dotted field names without element segments
//! (`orders.lines.sku`), see [`crate::path::Path::rule_path`].

use crate::errors::{DeepCmpError, Result};
use crate::model::{Leaf, Value};
use crate::node::ComparisonNode;
use crate::path::Path;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

/// Type names produced by [`Value::type_name`] for non-user values. A rule
/// naming a type in this lowercase style must name one of these.
pub const BUILTIN_TYPE_NAMES: &[&str] = &[
    "bool",
    "int",
    "uint",
    "float",
    "char",
    "str",
    "bytes",
    "path",
    "array",
    "list",
    "sorted_set",
    "linked_set",
    "set",
    "map",
    "sorted_map",
    "optional",
    "optional_int",
    "optional_long",
    "optional_double",
    "atomic_reference",
    "atomic_integer",
    "atomic_long",
    "atomic_boolean",
    "atomic_reference_array",
    "atomic_integer_array",
    "atomic_long_array",
];

/// Equality override substituted for the engine's own decision at a node
pub trait ValueComparator {
    fn equals(&self, actual: &Value, expected: &Value) -> bool;
}

impl<F> ValueComparator for F
where
    F: Fn(&Value, &Value) -> bool,
{
    fn equals(&self, actual: &Value, expected: &Value) -> bool {
        self(actual, expected)
    }
}

/// Numeric leaves equal within `epsilon`
#[derive(Debug, Clone, Copy)]
pub struct ApproxComparator {
    pub epsilon: f64,
}

impl ValueComparator for ApproxComparator {
    fn equals(&self, actual: &Value, expected: &Value) -> bool {
        match (
            actual.as_leaf().and_then(Leaf::as_f64),
            expected.as_leaf().and_then(Leaf::as_f64),
        ) {
            (Some(a), Some(e)) => (a - e).abs() <= self.epsilon,
            _ => actual.is_identical(expected),
        }
    }
}

/// String leaves equal ignoring case
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitiveComparator;

impl ValueComparator for CaseInsensitiveComparator {
    fn equals(&self, actual: &Value, expected: &Value) -> bool {
        match (
            actual.as_leaf().and_then(Leaf::as_str),
            expected.as_leaf().and_then(Leaf::as_str),
        ) {
            (Some(a), Some(e)) => a.to_lowercase() == e.to_lowercase(),
            _ => actual.is_identical(expected),
        }
    }
}

/// Treats every pair as equal
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysEqualComparator;

impl ValueComparator for AlwaysEqualComparator {
    fn equals(&self, _: &Value, _: &Value) -> bool {
        true
    }
}

/// Caller-supplied comparison configuration
#[derive(Clone)]
pub struct ComparisonPolicy {
    ignored_fields: BTreeSet<String>,
    ignored_field_regexes: Vec<String>,
    ignored_types: BTreeSet<String>,
    field_comparators: BTreeMap<String, Rc<dyn ValueComparator>>,
    type_comparators: BTreeMap<String, Rc<dyn ValueComparator>>,
    strict_type_checking: bool,
    treat_null_as_distinct_from_empty: bool,
    ignore_collection_order: bool,
    ignore_actual_null_fields: bool,
    ignore_expected_null_fields: bool,
}

impl Default for ComparisonPolicy {
    fn default() -> Self {
        Self {
            ignored_fields: BTreeSet::new(),
            ignored_field_regexes: Vec::new(),
            ignored_types: BTreeSet::new(),
            field_comparators: BTreeMap::new(),
            type_comparators: BTreeMap::new(),
            strict_type_checking: false,
            treat_null_as_distinct_from_empty: true,
            ignore_collection_order: false,
            ignore_actual_null_fields: false,
            ignore_expected_null_fields: false,
        }
    }
}

impl fmt::Debug for ComparisonPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparisonPolicy")
            .field("ignored_fields", &self.ignored_fields)
            .field("ignored_field_regexes", &self.ignored_field_regexes)
            .field("ignored_types", &self.ignored_types)
            .field(
                "field_comparators",
                &self.field_comparators.keys().collect::<Vec<_>>(),
            )
            .field(
                "type_comparators",
                &self.type_comparators.keys().collect::<Vec<_>>(),
            )
            .field("strict_type_checking", &self.strict_type_checking)
            .field(
                "treat_null_as_distinct_from_empty",
                &self.treat_null_as_distinct_from_empty,
            )
            .field("ignore_collection_order", &self.ignore_collection_order)
            .field("ignore_actual_null_fields", &self.ignore_actual_null_fields)
            .field(
                "ignore_expected_null_fields",
                &self.ignore_expected_null_fields,
            )
            .finish()
    }
}

impl ComparisonPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip these rule paths (and everything below them)
    pub fn ignoring_fields<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_fields
            .extend(paths.into_iter().map(Into::into));
        self
    }

    /// Skip rule paths fully matching any of these regexes
    pub fn ignoring_fields_matching<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_field_regexes
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Skip values whose type name is listed
    pub fn ignoring_types<I, S>(mut self, type_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_types
            .extend(type_names.into_iter().map(Into::into));
        self
    }

    pub fn with_field_comparator(
        mut self,
        rule_path: impl Into<String>,
        comparator: impl ValueComparator + 'static,
    ) -> Self {
        self.field_comparators
            .insert(rule_path.into(), Rc::new(comparator));
        self
    }

    pub fn with_type_comparator(
        mut self,
        type_name: impl Into<String>,
        comparator: impl ValueComparator + 'static,
    ) -> Self {
        self.type_comparators
            .insert(type_name.into(), Rc::new(comparator));
        self
    }

    pub(crate) fn with_shared_field_comparator(
        mut self,
        rule_path: String,
        comparator: Rc<dyn ValueComparator>,
    ) -> Self {
        self.field_comparators.insert(rule_path, comparator);
        self
    }

    pub(crate) fn with_shared_type_comparator(
        mut self,
        type_name: String,
        comparator: Rc<dyn ValueComparator>,
    ) -> Self {
        self.type_comparators.insert(type_name, comparator);
        self
    }

    pub fn with_strict_type_checking(mut self, strict: bool) -> Self {
        self.strict_type_checking = strict;
        self
    }

    pub fn with_null_distinct_from_empty(mut self, distinct: bool) -> Self {
        self.treat_null_as_distinct_from_empty = distinct;
        self
    }

    pub fn ignoring_collection_order(mut self, ignore: bool) -> Self {
        self.ignore_collection_order = ignore;
        self
    }

    pub fn ignoring_actual_null_fields(mut self, ignore: bool) -> Self {
        self.ignore_actual_null_fields = ignore;
        self
    }

    pub fn ignoring_expected_null_fields(mut self, ignore: bool) -> Self {
        self.ignore_expected_null_fields = ignore;
        self
    }

    pub fn strict_type_checking(&self) -> bool {
        self.strict_type_checking
    }

    pub fn treat_null_as_distinct_from_empty(&self) -> bool {
        self.treat_null_as_distinct_from_empty
    }

    pub fn ignore_collection_order(&self) -> bool {
        self.ignore_collection_order
    }

    pub fn ignored_fields(&self) -> impl Iterator<Item = &str> {
        self.ignored_fields.iter().map(String::as_str)
    }

    /// Check every rule without keeping the compiled form
    ///
    /// # Errors
    ///
    /// Same as [`ComparisonPolicy::resolve`].
    pub fn validate(&self) -> Result<()> {
        self.resolve().map(|_| ())
    }

    /// Validate every rule and compile ignore patterns
    ///
    /// # Errors
    ///
    /// - `InvalidRulePath`: an ignored field or field comparator path is empty,
    ///   has an empty segment, or contains an element segment
    /// - `InvalidRegex`: an ignore pattern does not compile
    /// - `UnresolvedType`: an ignored type or type comparator names `null`, a
    ///   malformed type name, or a lowercase name that is not a built-in type
    /// - `ConflictingRule`: a path is both ignored and given a comparator
    pub fn resolve(&self) -> Result<ResolvedPolicy<'_>> {
        for path in &self.ignored_fields {
            validate_rule_path(path)?;
        }
        for path in self.field_comparators.keys() {
            validate_rule_path(path)?;
        }
        for type_name in self.ignored_types.iter().chain(self.type_comparators.keys()) {
            validate_type_name(type_name)?;
        }

        let ignored_regexes = self
            .ignored_field_regexes
            .iter()
            .map(|pattern| {
                Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| DeepCmpError::InvalidRegex {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for path in self.field_comparators.keys() {
            if self.ignored_fields.contains(path) || ignored_regexes.iter().any(|r| r.is_match(path))
            {
                return Err(DeepCmpError::ConflictingRule { path: path.clone() });
            }
        }

        Ok(ResolvedPolicy {
            policy: self,
            ignored_regexes,
        })
    }
}

fn validate_rule_path(path: &str) -> Result<()> {
    let invalid = |reason: &str| DeepCmpError::InvalidRulePath {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    if path.is_empty() {
        return Err(invalid("rule path is empty"));
    }
    if path.contains('[') || path.contains(']') {
        return Err(invalid(
            "element segments are not allowed; rules apply to every element",
        ));
    }
    if path.split('.').any(str::is_empty) {
        return Err(invalid("rule path has an empty segment"));
    }
    Ok(())
}

fn validate_type_name(type_name: &str) -> Result<()> {
    let mut chars = type_name.chars();
    let well_formed = match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => chars
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '.' | '<' | '>' | ',')),
        _ => false,
    };
    // Built-in names are lowercase words; user types are capitalised or
    // qualified, so a lowercase word outside the built-ins is a typo.
    let builtin_style = type_name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
    if !well_formed || (builtin_style && !BUILTIN_TYPE_NAMES.contains(&type_name)) {
        return Err(DeepCmpError::UnresolvedType {
            type_name: type_name.to_string(),
        });
    }
    Ok(())
}

/// A policy whose rules have been validated for one invocation
#[derive(Debug)]
pub struct ResolvedPolicy<'a> {
    policy: &'a ComparisonPolicy,
    ignored_regexes: Vec<Regex>,
}

impl<'a> ResolvedPolicy<'a> {
    /// Resolution of a policy known to carry no patterns or rules
    pub(crate) fn trivial(policy: &'a ComparisonPolicy) -> Self {
        Self {
            policy,
            ignored_regexes: Vec::new(),
        }
    }

    pub fn policy(&self) -> &ComparisonPolicy {
        self.policy
    }

    /// Node is skipped entirely: no comparison, no recursion
    pub fn skips(&self, node: &ComparisonNode) -> bool {
        (self.policy.ignore_actual_null_fields && node.actual().is_null())
            || (self.policy.ignore_expected_null_fields && node.expected().is_null())
            || self.is_path_ignored(node.path())
            || self.is_type_ignored(node.actual())
            || self.is_type_ignored(node.expected())
    }

    pub fn is_path_ignored(&self, path: &Path) -> bool {
        if self.policy.ignored_fields.is_empty() && self.ignored_regexes.is_empty() {
            return false;
        }
        let rule_path = path.rule_path();
        if rule_path.is_empty() {
            return false;
        }
        self.policy.ignored_fields.contains(&rule_path)
            || self.ignored_regexes.iter().any(|r| r.is_match(&rule_path))
    }

    pub fn is_type_ignored(&self, value: &Value) -> bool {
        !value.is_null()
            && !self.policy.ignored_types.is_empty()
            && self.policy.ignored_types.contains(&value.type_name())
    }

    /// Comparator overriding the default decision at this node: a field
    /// comparator first, then a type comparator for the non-null side.
    pub fn comparator_for(&self, node: &ComparisonNode) -> Option<Rc<dyn ValueComparator>> {
        if !self.policy.field_comparators.is_empty() {
            if let Some(c) = self.policy.field_comparators.get(&node.rule_path()) {
                return Some(c.clone());
            }
        }
        if self.policy.type_comparators.is_empty() {
            return None;
        }
        let typed = if node.actual().is_null() {
            node.expected()
        } else {
            node.actual()
        };
        if typed.is_null() {
            return None;
        }
        self.policy.type_comparators.get(&typed.type_name()).cloned()
    }
}
