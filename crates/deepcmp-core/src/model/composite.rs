//! Heap-allocated, identity-carrying values.
//!
//! Every composite lives behind a [`Shared`] handle. Identity of a handle is
//! the address of its allocation, so two structurally equal composites built
//! separately are never the same object, and a composite can point back to
//! itself after construction.

use super::leaf::{Leaf, MapKey};
use super::value::Value;
use indexmap::IndexMap;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// A user-defined record: a type name plus its declared attributes
#[derive(Debug, Clone)]
pub struct Object {
    pub type_name: String,
    /// Attributes in declaration order
    pub fields: IndexMap<String, Value>,
}

/// Iterable collection flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Sequence compared by position
    List,
    /// Set with a defined sort order; elements are stored in that order
    SortedSet,
    /// Set remembering insertion order
    LinkedSet,
    /// Set without a defined iteration order
    Set,
}

impl CollectionKind {
    pub fn is_ordered(self) -> bool {
        !matches!(self, CollectionKind::Set)
    }

    pub fn type_name(self) -> &'static str {
        match self {
            CollectionKind::List => "list",
            CollectionKind::SortedSet => "sorted_set",
            CollectionKind::LinkedSet => "linked_set",
            CollectionKind::Set => "set",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Collection {
    pub kind: CollectionKind,
    pub elements: Vec<Value>,
}

/// Key/value container. Sorted maps keep `entries` in key order.
#[derive(Debug, Clone)]
pub struct MapValue {
    pub sorted: bool,
    pub entries: IndexMap<MapKey, Value>,
}

impl MapValue {
    pub fn insert(&mut self, key: MapKey, value: Value) {
        self.entries.insert(key, value);
        if self.sorted {
            self.entries.sort_keys();
        }
    }
}

/// Optional-style wrapper, generic or specialised to a primitive
#[derive(Debug, Clone)]
pub enum OptionalValue {
    Generic(Option<Value>),
    Int(Option<i32>),
    Long(Option<i64>),
    Double(Option<f64>),
}

impl OptionalValue {
    pub fn is_present(&self) -> bool {
        match self {
            OptionalValue::Generic(v) => v.is_some(),
            OptionalValue::Int(v) => v.is_some(),
            OptionalValue::Long(v) => v.is_some(),
            OptionalValue::Double(v) => v.is_some(),
        }
    }

    /// The wrapped value, if present
    pub fn get(&self) -> Option<Value> {
        match self {
            OptionalValue::Generic(v) => v.clone(),
            OptionalValue::Int(v) => v.map(|i| Value::Leaf(Leaf::Int(i64::from(i)))),
            OptionalValue::Long(v) => v.map(|i| Value::Leaf(Leaf::Int(i))),
            OptionalValue::Double(v) => v.map(|d| Value::Leaf(Leaf::Float(d))),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            OptionalValue::Generic(_) => "optional",
            OptionalValue::Int(_) => "optional_int",
            OptionalValue::Long(_) => "optional_long",
            OptionalValue::Double(_) => "optional_double",
        }
    }
}

/// Atomic-style boxed scalar or array
#[derive(Debug, Clone)]
pub enum AtomicValue {
    Reference(Value),
    Integer(i32),
    Long(i64),
    Boolean(bool),
    ReferenceArray(Vec<Value>),
    IntegerArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl AtomicValue {
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            AtomicValue::ReferenceArray(_) | AtomicValue::IntegerArray(_) | AtomicValue::LongArray(_)
        )
    }

    /// Boxed value of a scalar form; `None` for array forms
    pub fn get(&self) -> Option<Value> {
        match self {
            AtomicValue::Reference(v) => Some(v.clone()),
            AtomicValue::Integer(i) => Some(Value::Leaf(Leaf::Int(i64::from(*i)))),
            AtomicValue::Long(i) => Some(Value::Leaf(Leaf::Int(*i))),
            AtomicValue::Boolean(b) => Some(Value::Leaf(Leaf::Bool(*b))),
            _ => None,
        }
    }

    /// Elements of an array form; `None` for scalar forms
    pub fn elements(&self) -> Option<Vec<Value>> {
        match self {
            AtomicValue::ReferenceArray(v) => Some(v.clone()),
            AtomicValue::IntegerArray(v) => Some(
                v.iter()
                    .map(|i| Value::Leaf(Leaf::Int(i64::from(*i))))
                    .collect(),
            ),
            AtomicValue::LongArray(v) => Some(v.iter().map(|i| Value::Leaf(Leaf::Int(*i))).collect()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AtomicValue::Reference(_) => "atomic_reference",
            AtomicValue::Integer(_) => "atomic_integer",
            AtomicValue::Long(_) => "atomic_long",
            AtomicValue::Boolean(_) => "atomic_boolean",
            AtomicValue::ReferenceArray(_) => "atomic_reference_array",
            AtomicValue::IntegerArray(_) => "atomic_integer_array",
            AtomicValue::LongArray(_) => "atomic_long_array",
        }
    }
}

/// Every structured value the engine can decompose
#[derive(Debug, Clone)]
pub enum Composite {
    Object(Object),
    Array(Vec<Value>),
    Collection(Collection),
    Map(MapValue),
    Optional(OptionalValue),
    Atomic(AtomicValue),
}

impl Composite {
    pub fn type_name(&self) -> String {
        match self {
            Composite::Object(o) => o.type_name.clone(),
            Composite::Array(_) => "array".to_string(),
            Composite::Collection(c) => c.kind.type_name().to_string(),
            Composite::Map(m) if m.sorted => "sorted_map".to_string(),
            Composite::Map(_) => "map".to_string(),
            Composite::Optional(o) => o.type_name().to_string(),
            Composite::Atomic(a) => a.type_name().to_string(),
        }
    }

    /// Move every directly held value out, leaving the composite empty
    fn detach_children(&mut self) -> Vec<Value> {
        match self {
            Composite::Object(o) => std::mem::take(&mut o.fields).into_values().collect(),
            Composite::Array(v) => std::mem::take(v),
            Composite::Collection(c) => std::mem::take(&mut c.elements),
            Composite::Map(m) => std::mem::take(&mut m.entries).into_values().collect(),
            Composite::Optional(OptionalValue::Generic(v)) => v.take().into_iter().collect(),
            Composite::Optional(_) => Vec::new(),
            Composite::Atomic(AtomicValue::Reference(v)) => vec![std::mem::replace(v, Value::Null)],
            Composite::Atomic(AtomicValue::ReferenceArray(v)) => std::mem::take(v),
            Composite::Atomic(_) => Vec::new(),
        }
    }
}

/// Identity-carrying handle to a [`Composite`]
#[derive(Clone)]
pub struct Shared(Rc<RefCell<Composite>>);

impl Shared {
    pub fn new(composite: Composite) -> Self {
        Self(Rc::new(RefCell::new(composite)))
    }

    pub fn borrow(&self) -> Ref<'_, Composite> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Composite> {
        self.0.borrow_mut()
    }

    /// Address of the allocation; stable for the lifetime of the handle
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &Shared) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// Releasing the last handle of a deep acyclic graph must not recurse once per
// level. Children whose last handle is being released are emptied into a work
// list before they drop, so every drop below this one is shallow.
impl Drop for Shared {
    fn drop(&mut self) {
        if Rc::strong_count(&self.0) != 1 {
            return;
        }
        let mut pending = match self.0.try_borrow_mut() {
            Ok(mut composite) => composite.detach_children(),
            Err(_) => return,
        };
        while let Some(value) = pending.pop() {
            if let Value::Ref(shared) = value {
                if Rc::strong_count(&shared.0) == 1 {
                    if let Ok(mut composite) = shared.0.try_borrow_mut() {
                        pending.extend(composite.detach_children());
                    }
                }
            }
        }
    }
}

// Shallow: cyclic graphs must stay printable.
impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(c) => write!(f, "Ref({}@{:#x})", c.type_name(), self.addr()),
            Err(_) => write!(f, "Ref(<borrowed>@{:#x})", self.addr()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_map_keeps_key_order() {
        let mut map = MapValue {
            sorted: true,
            entries: IndexMap::new(),
        };
        map.insert(MapKey::from("b"), Value::from(2));
        map.insert(MapKey::from("a"), Value::from(1));

        let keys: Vec<String> = map.entries.keys().map(|k| k.text().into_owned()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_optional_primitive_unwraps_to_leaf() {
        let opt = OptionalValue::Double(Some(1.5));
        assert!(opt.is_present());
        assert!(matches!(opt.get(), Some(Value::Leaf(Leaf::Float(v))) if v == 1.5));
        assert!(OptionalValue::Int(None).get().is_none());
    }

    #[test]
    fn test_atomic_array_forms() {
        let ints = AtomicValue::IntegerArray(vec![1, 2]);
        assert!(ints.is_array());
        assert!(ints.get().is_none());
        assert_eq!(ints.elements().map(|e| e.len()), Some(2));

        let flag = AtomicValue::Boolean(true);
        assert!(!flag.is_array());
        assert!(flag.elements().is_none());
    }

    #[test]
    fn test_identity_is_per_allocation() {
        let a = Shared::new(Composite::Array(vec![]));
        let b = Shared::new(Composite::Array(vec![]));
        let a2 = a.clone();

        assert!(a.ptr_eq(&a2));
        assert!(!a.ptr_eq(&b));
        assert_eq!(a.addr(), a2.addr());
    }

    #[test]
    fn test_dropping_deep_chain_is_iterative() {
        let mut head = Shared::new(Composite::Array(vec![]));
        for _ in 0..200_000 {
            head = Shared::new(Composite::Array(vec![Value::Ref(head)]));
        }
        drop(head);
    }

    #[test]
    fn test_drop_keeps_shared_children_alive() {
        let child = Shared::new(Composite::Array(vec![Value::from(1)]));
        let parent = Shared::new(Composite::Array(vec![Value::Ref(child.clone())]));
        drop(parent);

        assert!(matches!(&*child.borrow(), Composite::Array(v) if v.len() == 1));
    }

    #[test]
    fn test_debug_is_shallow_on_cycles() {
        let list = Shared::new(Composite::Collection(Collection {
            kind: CollectionKind::List,
            elements: vec![],
        }));
        if let Composite::Collection(c) = &mut *list.borrow_mut() {
            c.elements.push(Value::Ref(list.clone()));
        }
        let rendered = format!("{:?}", list);
        assert!(rendered.starts_with("Ref(list@"));
    }
}
