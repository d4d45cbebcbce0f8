//! Value graph model.
//!
//! - [`Value`]: null, inline leaf, enum constant, or a shared composite
//! - [`Leaf`] / [`EnumConst`] / [`MapKey`]: inline scalars
//! - [`Composite`] behind [`Shared`]: identity-carrying structured values
//! - [`ToValue`]: conversion of Rust data into graphs

pub mod composite;
pub mod convert;
pub mod leaf;
pub mod value;

pub use composite::{
    AtomicValue, Collection, CollectionKind, Composite, MapValue, Object, OptionalValue, Shared,
};
pub use convert::ToValue;
pub use leaf::{EnumConst, Leaf, MapKey};
pub use value::Value;
