//! Conversions from Rust and JSON data into value graphs.
//!
//! User types take part in structural comparison by implementing [`ToValue`],
//! typically returning [`Value::object`] with one entry per attribute.
//!
//! ```
//! use deepcmp_core::model::{ToValue, Value};
//!
//! struct Point { x: i32, y: i32 }
//!
//! impl ToValue for Point {
//!     fn to_value(&self) -> Value {
//!         Value::object("Point", [("x", self.x.to_value()), ("y", self.y.to_value())])
//!     }
//! }
//!
//! let v = Point { x: 1, y: 2 }.to_value();
//! assert_eq!(v.type_name(), "Point");
//! ```

use super::leaf::{Leaf, MapKey};
use super::value::Value;
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::path::{Path, PathBuf};

/// Conversion of a Rust value into a comparable value graph
pub trait ToValue {
    fn to_value(&self) -> Value;
}

macro_rules! to_value_via_from {
    ($($t:ty),*) => {
        $(impl ToValue for $t {
            fn to_value(&self) -> Value {
                Value::from(self.clone())
            }
        })*
    };
}

to_value_via_from!(bool, char, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, String, PathBuf);

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::from(self)
    }
}

impl ToValue for Path {
    fn to_value(&self) -> Value {
        Value::path(self)
    }
}

impl ToValue for usize {
    fn to_value(&self) -> Value {
        Value::Leaf(Leaf::UInt(*self as u64))
    }
}

impl ToValue for isize {
    fn to_value(&self) -> Value {
        Value::Leaf(Leaf::Int(*self as i64))
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

/// `Option` maps to the optional wrapper, not to null
impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        Value::optional(self.as_ref().map(ToValue::to_value))
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::list(self.iter().map(ToValue::to_value))
    }
}

impl<T: ToValue> ToValue for VecDeque<T> {
    fn to_value(&self) -> Value {
        Value::list(self.iter().map(ToValue::to_value))
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Value::array(self.iter().map(ToValue::to_value))
    }
}

impl<T: ToValue, const N: usize> ToValue for [T; N] {
    fn to_value(&self) -> Value {
        Value::array(self.iter().map(ToValue::to_value))
    }
}

impl<T: ToValue> ToValue for BTreeSet<T> {
    fn to_value(&self) -> Value {
        Value::sorted_set(self.iter().map(ToValue::to_value))
    }
}

/// Elements are emitted in sorted order so that conversion is reproducible
impl<T: ToValue + Ord + Hash> ToValue for HashSet<T> {
    fn to_value(&self) -> Value {
        let mut elements: Vec<&T> = self.iter().collect();
        elements.sort();
        Value::set(elements.into_iter().map(ToValue::to_value))
    }
}

impl<K, V> ToValue for BTreeMap<K, V>
where
    K: Clone + Into<MapKey>,
    V: ToValue,
{
    fn to_value(&self) -> Value {
        Value::sorted_map(self.iter().map(|(k, v)| (k.clone(), v.to_value())))
    }
}

/// Entries are emitted in key order so that conversion is reproducible
impl<K, V> ToValue for HashMap<K, V>
where
    K: Clone + Into<MapKey>,
    V: ToValue,
{
    fn to_value(&self) -> Value {
        let mut entries: Vec<(MapKey, Value)> = self
            .iter()
            .map(|(k, v)| (k.clone().into(), v.to_value()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Value::map(entries)
    }
}

impl<K, V> ToValue for IndexMap<K, V>
where
    K: Clone + Into<MapKey>,
    V: ToValue,
{
    fn to_value(&self) -> Value {
        Value::map(self.iter().map(|(k, v)| (k.clone(), v.to_value())))
    }
}

/// JSON objects become maps and arrays become lists. JSON scalars become
/// leaves, so scalar and object nodes are never iterated as collections.
impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::from(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Leaf(Leaf::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Value::Leaf(Leaf::UInt(u))
                } else {
                    Value::Leaf(Leaf::Float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            serde_json::Value::String(s) => Value::from(s.as_str()),
            serde_json::Value::Array(items) => Value::list(items.iter().map(Value::from)),
            serde_json::Value::Object(fields) => {
                Value::map(fields.iter().map(|(k, v)| (k.as_str(), Value::from(v))))
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_option_becomes_optional_wrapper() {
        let some = Some(5).to_value();
        let none: Option<i32> = None;

        assert_eq!(some.type_name(), "optional");
        assert!(matches!(none.to_value().wrapped(), Some(None)));
    }

    #[test]
    fn test_std_collections_map_to_kinds() {
        assert_eq!(vec![1, 2].to_value().type_name(), "list");
        assert_eq!([1, 2].to_value().type_name(), "array");
        assert_eq!(BTreeSet::from([1, 2]).to_value().type_name(), "sorted_set");
        assert_eq!(HashSet::from([1, 2]).to_value().type_name(), "set");
        assert_eq!(
            BTreeMap::from([("a".to_string(), 1)]).to_value().type_name(),
            "sorted_map"
        );
    }

    #[test]
    fn test_hash_map_conversion_is_key_ordered() {
        let map: HashMap<String, i32> = (0..20).map(|i| (format!("k{:02}", i), i)).collect();
        let keys: Vec<String> = map
            .to_value()
            .entries()
            .unwrap()
            .iter()
            .map(|(k, _)| k.text().into_owned())
            .collect();

        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_json_conversion() {
        let value = Value::from(json!({"name": "Jack", "tags": ["a", "b"], "age": 42, "x": null}));

        assert_eq!(value.type_name(), "map");
        let entries = value.entries().unwrap();
        assert_eq!(entries.len(), 4);
        let tags = entries.iter().find(|(k, _)| k.text() == "tags").unwrap();
        assert_eq!(tags.1.type_name(), "list");
        let x = entries.iter().find(|(k, _)| k.text() == "x").unwrap();
        assert!(x.1.is_null());
    }
}
