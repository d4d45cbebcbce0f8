//! The dynamic value graph compared by the engine.

use super::composite::{
    AtomicValue, Collection, CollectionKind, Composite, MapValue, Object, OptionalValue, Shared,
};
use super::leaf::{EnumConst, Leaf, MapKey};
use crate::errors::{DeepCmpError, Result};
use indexmap::IndexMap;
use std::path::PathBuf;

/// A node of a value graph.
///
/// Cloning a `Value` is cheap: composites are shared handles, so a clone of a
/// `Ref` is the *same* object, not a copy.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Leaf(Leaf),
    Enum(EnumConst),
    Ref(Shared),
}

impl Value {
    // ----- constructors -----

    /// A user-defined record with attributes in declaration order
    pub fn object<I, K, V>(type_name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::composite(Composite::Object(Object {
            type_name: type_name.into(),
            fields,
        }))
    }

    pub fn array<I, V>(elements: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::composite(Composite::Array(
            elements.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn list<I, V>(elements: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::collection(CollectionKind::List, elements)
    }

    /// Elements are stored in the order given; callers pass them sorted.
    pub fn sorted_set<I, V>(elements: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::collection(CollectionKind::SortedSet, elements)
    }

    pub fn linked_set<I, V>(elements: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::collection(CollectionKind::LinkedSet, elements)
    }

    pub fn set<I, V>(elements: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::collection(CollectionKind::Set, elements)
    }

    pub fn collection<I, V>(kind: CollectionKind, elements: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::composite(Composite::Collection(Collection {
            kind,
            elements: elements.into_iter().map(Into::into).collect(),
        }))
    }

    /// Map keeping insertion order
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<MapKey>,
        V: Into<Value>,
    {
        Self::composite(Composite::Map(MapValue {
            sorted: false,
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }))
    }

    /// Map keeping key order
    pub fn sorted_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<MapKey>,
        V: Into<Value>,
    {
        let mut entries: IndexMap<MapKey, Value> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        entries.sort_keys();
        Self::composite(Composite::Map(MapValue {
            sorted: true,
            entries,
        }))
    }

    pub fn optional(value: Option<Value>) -> Self {
        Self::composite(Composite::Optional(OptionalValue::Generic(value)))
    }

    pub fn optional_int(value: Option<i32>) -> Self {
        Self::composite(Composite::Optional(OptionalValue::Int(value)))
    }

    pub fn optional_long(value: Option<i64>) -> Self {
        Self::composite(Composite::Optional(OptionalValue::Long(value)))
    }

    pub fn optional_double(value: Option<f64>) -> Self {
        Self::composite(Composite::Optional(OptionalValue::Double(value)))
    }

    pub fn atomic_reference(value: impl Into<Value>) -> Self {
        Self::composite(Composite::Atomic(AtomicValue::Reference(value.into())))
    }

    pub fn atomic_integer(value: i32) -> Self {
        Self::composite(Composite::Atomic(AtomicValue::Integer(value)))
    }

    pub fn atomic_long(value: i64) -> Self {
        Self::composite(Composite::Atomic(AtomicValue::Long(value)))
    }

    pub fn atomic_boolean(value: bool) -> Self {
        Self::composite(Composite::Atomic(AtomicValue::Boolean(value)))
    }

    pub fn atomic_reference_array<I, V>(elements: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::composite(Composite::Atomic(AtomicValue::ReferenceArray(
            elements.into_iter().map(Into::into).collect(),
        )))
    }

    pub fn atomic_integer_array(elements: Vec<i32>) -> Self {
        Self::composite(Composite::Atomic(AtomicValue::IntegerArray(elements)))
    }

    pub fn atomic_long_array(elements: Vec<i64>) -> Self {
        Self::composite(Composite::Atomic(AtomicValue::LongArray(elements)))
    }

    pub fn enum_const(type_name: impl Into<String>, variant: impl Into<String>) -> Self {
        Value::Enum(EnumConst::new(type_name, variant))
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        Value::Leaf(Leaf::Path(path.into()))
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Leaf(Leaf::Bytes(bytes.into()))
    }

    pub fn composite(composite: Composite) -> Self {
        Value::Ref(Shared::new(composite))
    }

    // ----- inspection -----

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Value::Leaf(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_shared(&self) -> Option<&Shared> {
        match self {
            Value::Ref(s) => Some(s),
            _ => None,
        }
    }

    /// Type name: built-in names for leaves and containers, the declared
    /// name for objects and enums, `"null"` for the absent value.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Leaf(l) => l.type_name().to_string(),
            Value::Enum(e) => e.type_name.clone(),
            Value::Ref(s) => s.borrow().type_name(),
        }
    }

    /// Allocation address of a composite; inline values have no identity
    pub fn identity(&self) -> Option<usize> {
        self.as_shared().map(Shared::addr)
    }

    /// Reference identity. Composites are identical only when they are the
    /// same allocation; inline values (which cannot be aliased) when they hold
    /// the same content.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Leaf(a), Value::Leaf(b)) => a.strict_eq(b),
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Empty array, collection, map or absent optional
    pub fn is_empty_container(&self) -> bool {
        let Value::Ref(shared) = self else {
            return false;
        };
        match &*shared.borrow() {
            Composite::Array(v) => v.is_empty(),
            Composite::Collection(c) => c.elements.is_empty(),
            Composite::Map(m) => m.entries.is_empty(),
            Composite::Optional(o) => !o.is_present(),
            Composite::Atomic(a) => a.elements().is_some_and(|e| e.is_empty()),
            Composite::Object(_) => false,
        }
    }

    /// Attribute value of an object
    pub fn field(&self, name: &str) -> Option<Value> {
        let shared = self.as_shared()?;
        match &*shared.borrow() {
            Composite::Object(o) => o.fields.get(name).cloned(),
            _ => None,
        }
    }

    /// Attributes of an object, in declaration order
    pub fn fields(&self) -> Option<Vec<(String, Value)>> {
        let shared = self.as_shared()?;
        match &*shared.borrow() {
            Composite::Object(o) => Some(
                o.fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Elements of an array, collection or atomic array
    pub fn elements(&self) -> Option<Vec<Value>> {
        let shared = self.as_shared()?;
        match &*shared.borrow() {
            Composite::Array(v) => Some(v.clone()),
            Composite::Collection(c) => Some(c.elements.clone()),
            Composite::Atomic(a) => a.elements(),
            _ => None,
        }
    }

    /// Entries of a map, in iteration order
    pub fn entries(&self) -> Option<Vec<(MapKey, Value)>> {
        let shared = self.as_shared()?;
        match &*shared.borrow() {
            Composite::Map(m) => Some(
                m.entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Content of a single-value wrapper (optional or atomic scalar).
    ///
    /// `None` when `self` is not such a wrapper, `Some(None)` for an absent
    /// optional, `Some(Some(v))` otherwise.
    pub fn wrapped(&self) -> Option<Option<Value>> {
        let shared = self.as_shared()?;
        match &*shared.borrow() {
            Composite::Optional(o) => Some(o.get()),
            Composite::Atomic(a) if !a.is_array() => Some(a.get()),
            _ => None,
        }
    }

    // ----- mutation (used to close cycles after construction) -----

    /// Set or add an attribute of an object
    ///
    /// # Errors
    ///
    /// Returns `InvalidMutation` if `self` is not an object.
    pub fn set_field(&self, name: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        self.mutate("set_field", |c| match c {
            Composite::Object(o) => {
                o.fields.insert(name.into(), value.into());
                true
            }
            _ => false,
        })
    }

    /// Append an element to an array or collection
    ///
    /// # Errors
    ///
    /// Returns `InvalidMutation` if `self` is not an array or collection.
    pub fn push(&self, value: impl Into<Value>) -> Result<()> {
        self.mutate("push", |c| match c {
            Composite::Array(v) => {
                v.push(value.into());
                true
            }
            Composite::Collection(col) => {
                col.elements.push(value.into());
                true
            }
            Composite::Atomic(AtomicValue::ReferenceArray(v)) => {
                v.push(value.into());
                true
            }
            _ => false,
        })
    }

    /// Insert a map entry, keeping sorted maps in key order
    ///
    /// # Errors
    ///
    /// Returns `InvalidMutation` if `self` is not a map.
    pub fn insert(&self, key: impl Into<MapKey>, value: impl Into<Value>) -> Result<()> {
        self.mutate("insert", |c| match c {
            Composite::Map(m) => {
                m.insert(key.into(), value.into());
                true
            }
            _ => false,
        })
    }

    /// Replace the content of a generic optional or an atomic reference
    ///
    /// # Errors
    ///
    /// Returns `InvalidMutation` for any other value.
    pub fn set_wrapped(&self, value: Option<Value>) -> Result<()> {
        self.mutate("set_wrapped", |c| match c {
            Composite::Optional(OptionalValue::Generic(slot)) => {
                *slot = value;
                true
            }
            Composite::Atomic(AtomicValue::Reference(slot)) => {
                *slot = value.unwrap_or(Value::Null);
                true
            }
            _ => false,
        })
    }

    fn mutate(&self, op: &str, apply: impl FnOnce(&mut Composite) -> bool) -> Result<()> {
        let applied = match self {
            Value::Ref(shared) => apply(&mut shared.borrow_mut()),
            _ => false,
        };
        if applied {
            Ok(())
        } else {
            Err(DeepCmpError::InvalidMutation {
                op: op.to_string(),
                type_name: self.type_name(),
            })
        }
    }
}

impl From<Leaf> for Value {
    fn from(leaf: Leaf) -> Self {
        Value::Leaf(leaf)
    }
}

impl From<EnumConst> for Value {
    fn from(e: EnumConst) -> Self {
        Value::Enum(e)
    }
}

impl From<MapKey> for Value {
    fn from(key: MapKey) -> Self {
        match key {
            MapKey::Bool(b) => Value::Leaf(Leaf::Bool(b)),
            MapKey::Int(v) => Value::Leaf(Leaf::Int(v)),
            MapKey::UInt(v) => Value::Leaf(Leaf::UInt(v)),
            MapKey::Char(c) => Value::Leaf(Leaf::Char(c)),
            MapKey::Str(s) => Value::Leaf(Leaf::Str(s)),
            MapKey::Enum(e) => Value::Enum(e),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Leaf(Leaf::Bool(b))
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Leaf(Leaf::Char(c))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Leaf(Leaf::Str(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Leaf(Leaf::Str(s))
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Leaf(Leaf::Float(f64::from(v)))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Leaf(Leaf::Float(v))
    }
}

impl From<PathBuf> for Value {
    fn from(p: PathBuf) -> Self {
        Value::Leaf(Leaf::Path(p))
    }
}

macro_rules! value_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Leaf(Leaf::Int(i64::from(v)))
            }
        })*
    };
}

macro_rules! value_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Leaf(Leaf::UInt(u64::from(v)))
            }
        })*
    };
}

value_from_signed!(i8, i16, i32, i64);
value_from_unsigned!(u8, u16, u32, u64);
