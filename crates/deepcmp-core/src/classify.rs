//! Type classification: how the engine treats a single value.
//!
//! [`classify`] maps one value to a [`TypeClass`]: a kind from a closed
//! enumeration plus the cycle-capable flag. The kind fixes the recursion
//! [`Shape`]. Dispatch order, first match wins:
//!
//! 1. null
//! 2. enum constant (leaf, never cycle-capable)
//! 3. optional wrappers (generic, int, long, double)
//! 4. atomic boxes and atomic arrays
//! 5. arrays
//! 6. maps, sorted maps
//! 7. ordered collections (list, sorted set, linked set)
//! 8. unordered iterables (sets). Paths are leaves, and JSON scalar/object
//!    nodes convert to leaves/maps, so neither is ever iterated.
//! 9. opaque base-runtime leaves
//! 10. user-defined records, compared attribute by attribute
//!
//! Classification is pure and recomputed per value.

use crate::model::{AtomicValue, Composite, OptionalValue, Value};

/// Closed set of capability tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Enum,
    Optional,
    OptionalInt,
    OptionalLong,
    OptionalDouble,
    AtomicReference,
    AtomicInteger,
    AtomicLong,
    AtomicBoolean,
    AtomicReferenceArray,
    AtomicIntegerArray,
    AtomicLongArray,
    Array,
    Map,
    SortedMap,
    OrderedCollection,
    UnorderedIterable,
    OpaqueLeaf,
    Object,
}

/// Decomposition strategy shared by both sides of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Compared by equality
    Leaf,
    /// Unwrapped into one child at the same path
    Optional,
    /// Unwrapped into one child at the same path
    Atomic,
    /// Decomposed by index
    AtomicArray,
    /// Decomposed by index
    Array,
    /// Decomposed by key
    Map,
    /// Decomposed by position
    OrderedCollection,
    /// Elements matched as a multiset
    UnorderedIterable,
    /// Decomposed by attribute name
    Object,
}

impl Kind {
    pub fn shape(self) -> Shape {
        match self {
            Kind::Null | Kind::Enum | Kind::OpaqueLeaf => Shape::Leaf,
            Kind::Optional | Kind::OptionalInt | Kind::OptionalLong | Kind::OptionalDouble => {
                Shape::Optional
            }
            Kind::AtomicReference
            | Kind::AtomicInteger
            | Kind::AtomicLong
            | Kind::AtomicBoolean => Shape::Atomic,
            Kind::AtomicReferenceArray | Kind::AtomicIntegerArray | Kind::AtomicLongArray => {
                Shape::AtomicArray
            }
            Kind::Array => Shape::Array,
            Kind::Map | Kind::SortedMap => Shape::Map,
            Kind::OrderedCollection => Shape::OrderedCollection,
            Kind::UnorderedIterable => Shape::UnorderedIterable,
            Kind::Object => Shape::Object,
        }
    }
}

/// Classification result for one value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeClass {
    pub kind: Kind,
    cycle_capable: bool,
}

impl TypeClass {
    fn new(kind: Kind) -> Self {
        // Everything reachable through a shared handle may take part in a cycle.
        let cycle_capable = !matches!(kind, Kind::Null | Kind::Enum | Kind::OpaqueLeaf);
        Self {
            kind,
            cycle_capable,
        }
    }

    pub fn shape(&self) -> Shape {
        self.kind.shape()
    }

    pub fn is_null(&self) -> bool {
        self.kind == Kind::Null
    }

    pub fn is_opaque_leaf(&self) -> bool {
        self.kind == Kind::OpaqueLeaf
    }

    pub fn is_enum(&self) -> bool {
        self.kind == Kind::Enum
    }

    pub fn is_array(&self) -> bool {
        self.kind == Kind::Array
    }

    /// Any map, sorted or not
    pub fn is_map(&self) -> bool {
        matches!(self.kind, Kind::Map | Kind::SortedMap)
    }

    pub fn is_sorted_map(&self) -> bool {
        self.kind == Kind::SortedMap
    }

    pub fn is_ordered_collection(&self) -> bool {
        self.kind == Kind::OrderedCollection
    }

    pub fn is_unordered_iterable(&self) -> bool {
        self.kind == Kind::UnorderedIterable
    }

    /// Any collection, ordered or not
    pub fn is_iterable(&self) -> bool {
        self.is_ordered_collection() || self.is_unordered_iterable()
    }

    /// Generic optional only
    pub fn is_optional(&self) -> bool {
        self.kind == Kind::Optional
    }

    pub fn is_optional_int(&self) -> bool {
        self.kind == Kind::OptionalInt
    }

    pub fn is_optional_long(&self) -> bool {
        self.kind == Kind::OptionalLong
    }

    pub fn is_optional_double(&self) -> bool {
        self.kind == Kind::OptionalDouble
    }

    pub fn is_atomic_reference(&self) -> bool {
        self.kind == Kind::AtomicReference
    }

    pub fn is_atomic_reference_array(&self) -> bool {
        self.kind == Kind::AtomicReferenceArray
    }

    pub fn is_atomic_integer(&self) -> bool {
        self.kind == Kind::AtomicInteger
    }

    pub fn is_atomic_integer_array(&self) -> bool {
        self.kind == Kind::AtomicIntegerArray
    }

    pub fn is_atomic_long(&self) -> bool {
        self.kind == Kind::AtomicLong
    }

    pub fn is_atomic_long_array(&self) -> bool {
        self.kind == Kind::AtomicLongArray
    }

    pub fn is_atomic_boolean(&self) -> bool {
        self.kind == Kind::AtomicBoolean
    }

    pub fn is_cycle_capable(&self) -> bool {
        self.cycle_capable
    }

    /// Iterable, map, optional, atomic or array. Records are not containers.
    pub fn is_container(&self) -> bool {
        !matches!(self.shape(), Shape::Leaf | Shape::Object)
    }
}

/// Classify a single value
pub fn classify(value: &Value) -> TypeClass {
    let kind = match value {
        Value::Null => Kind::Null,
        Value::Enum(_) => Kind::Enum,
        Value::Leaf(_) => Kind::OpaqueLeaf,
        Value::Ref(shared) => match &*shared.borrow() {
            Composite::Optional(o) => match o {
                OptionalValue::Generic(_) => Kind::Optional,
                OptionalValue::Int(_) => Kind::OptionalInt,
                OptionalValue::Long(_) => Kind::OptionalLong,
                OptionalValue::Double(_) => Kind::OptionalDouble,
            },
            Composite::Atomic(a) => match a {
                AtomicValue::Reference(_) => Kind::AtomicReference,
                AtomicValue::Integer(_) => Kind::AtomicInteger,
                AtomicValue::Long(_) => Kind::AtomicLong,
                AtomicValue::Boolean(_) => Kind::AtomicBoolean,
                AtomicValue::ReferenceArray(_) => Kind::AtomicReferenceArray,
                AtomicValue::IntegerArray(_) => Kind::AtomicIntegerArray,
                AtomicValue::LongArray(_) => Kind::AtomicLongArray,
            },
            Composite::Array(_) => Kind::Array,
            Composite::Map(m) if m.sorted => Kind::SortedMap,
            Composite::Map(_) => Kind::Map,
            Composite::Collection(c) if c.kind.is_ordered() => Kind::OrderedCollection,
            Composite::Collection(_) => Kind::UnorderedIterable,
            Composite::Object(_) => Kind::Object,
        },
    };
    TypeClass::new(kind)
}
