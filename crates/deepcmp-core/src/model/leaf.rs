//! Inline scalar values: opaque leaves, enum constants and map keys.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

/// Base-runtime scalar compared by equality, never decomposed
#[derive(Debug, Clone)]
pub enum Leaf {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    Str(String),
    Bytes(Vec<u8>),
    /// Filesystem path. Hierarchical, but never iterated: the first component
    /// of a path is conceptually the path itself.
    Path(PathBuf),
}

impl Leaf {
    /// Built-in type name used by strict type checking and type comparators
    pub fn type_name(&self) -> &'static str {
        match self {
            Leaf::Bool(_) => "bool",
            Leaf::Int(_) => "int",
            Leaf::UInt(_) => "uint",
            Leaf::Float(_) => "float",
            Leaf::Char(_) => "char",
            Leaf::Str(_) => "str",
            Leaf::Bytes(_) => "bytes",
            Leaf::Path(_) => "path",
        }
    }

    /// Same variant and same content. Floats compare by bit pattern with NaN
    /// canonicalised, so every leaf equals itself.
    pub fn strict_eq(&self, other: &Leaf) -> bool {
        match (self, other) {
            (Leaf::Bool(a), Leaf::Bool(b)) => a == b,
            (Leaf::Int(a), Leaf::Int(b)) => a == b,
            (Leaf::UInt(a), Leaf::UInt(b)) => a == b,
            (Leaf::Float(a), Leaf::Float(b)) => float_bits(*a) == float_bits(*b),
            (Leaf::Char(a), Leaf::Char(b)) => a == b,
            (Leaf::Str(a), Leaf::Str(b)) => a == b,
            (Leaf::Bytes(a), Leaf::Bytes(b)) => a == b,
            (Leaf::Path(a), Leaf::Path(b)) => a == b,
            _ => false,
        }
    }

    /// Like [`Leaf::strict_eq`] but signed and unsigned integers holding the
    /// same number are equal.
    pub fn lenient_eq(&self, other: &Leaf) -> bool {
        match (self, other) {
            (Leaf::Int(a), Leaf::UInt(b)) | (Leaf::UInt(b), Leaf::Int(a)) => {
                i128::from(*a) == i128::from(*b)
            }
            _ => self.strict_eq(other),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Leaf::Int(v) => Some(*v as f64),
            Leaf::UInt(v) => Some(*v as f64),
            Leaf::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Leaf::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Leaf {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leaf::Bool(v) => write!(f, "{}", v),
            Leaf::Int(v) => write!(f, "{}", v),
            Leaf::UInt(v) => write!(f, "{}", v),
            Leaf::Float(v) => write!(f, "{:?}", v),
            Leaf::Char(c) => write!(f, "{:?}", c),
            Leaf::Str(s) => write!(f, "{:?}", s),
            Leaf::Bytes(b) => write!(f, "bytes[{}]", b.len()),
            Leaf::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

fn float_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

/// A named constant of a user enum type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnumConst {
    pub type_name: String,
    pub variant: String,
}

impl EnumConst {
    pub fn new(type_name: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            variant: variant.into(),
        }
    }
}

impl fmt::Display for EnumConst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.type_name, self.variant)
    }
}

/// Hashable, totally ordered scalar used to key map entries
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Char(char),
    Str(String),
    Enum(EnumConst),
}

impl MapKey {
    /// Plain text of the key, as matched by rule paths
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            MapKey::Bool(b) => Cow::Owned(b.to_string()),
            MapKey::Int(v) => Cow::Owned(v.to_string()),
            MapKey::UInt(v) => Cow::Owned(v.to_string()),
            MapKey::Char(c) => Cow::Owned(c.to_string()),
            MapKey::Str(s) => Cow::Borrowed(s),
            MapKey::Enum(e) => Cow::Borrowed(&e.variant),
        }
    }

    /// Literal form used in rendered paths. Distinct keys never share a
    /// literal: strings and chars are quoted, unsigned integers carry a `u`
    /// suffix and enum constants are qualified by their type.
    pub fn literal(&self) -> String {
        match self {
            MapKey::Bool(b) => b.to_string(),
            MapKey::Int(v) => v.to_string(),
            MapKey::UInt(v) => format!("{}u", v),
            MapKey::Char(c) => format!("{:?}", c),
            MapKey::Str(s) => format!("{:?}", s),
            MapKey::Enum(e) => e.to_string(),
        }
    }

    /// The key of the other integer signedness holding the same number
    pub fn numeric_twin(&self) -> Option<MapKey> {
        match self {
            MapKey::Int(v) => u64::try_from(*v).ok().map(MapKey::UInt),
            MapKey::UInt(v) => i64::try_from(*v).ok().map(MapKey::Int),
            _ => None,
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal())
    }
}

impl From<&str> for MapKey {
    fn from(s: &str) -> Self {
        MapKey::Str(s.to_string())
    }
}

impl From<String> for MapKey {
    fn from(s: String) -> Self {
        MapKey::Str(s)
    }
}

impl From<bool> for MapKey {
    fn from(b: bool) -> Self {
        MapKey::Bool(b)
    }
}

impl From<char> for MapKey {
    fn from(c: char) -> Self {
        MapKey::Char(c)
    }
}

impl From<EnumConst> for MapKey {
    fn from(e: EnumConst) -> Self {
        MapKey::Enum(e)
    }
}

macro_rules! map_key_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for MapKey {
            fn from(v: $t) -> Self {
                MapKey::Int(i64::from(v))
            }
        })*
    };
}

macro_rules! map_key_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for MapKey {
            fn from(v: $t) -> Self {
                MapKey::UInt(u64::from(v))
            }
        })*
    };
}

map_key_from_signed!(i8, i16, i32, i64);
map_key_from_unsigned!(u8, u16, u32, u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_equals_itself() {
        let nan = Leaf::Float(f64::NAN);
        assert!(nan.strict_eq(&nan.clone()));
        assert!(!Leaf::Float(0.0).strict_eq(&Leaf::Float(-0.0)));
    }

    #[test]
    fn test_lenient_integer_coercion() {
        assert!(Leaf::Int(7).lenient_eq(&Leaf::UInt(7)));
        assert!(!Leaf::Int(7).strict_eq(&Leaf::UInt(7)));
        assert!(!Leaf::Int(-1).lenient_eq(&Leaf::UInt(u64::MAX)));
        assert!(!Leaf::Int(1).lenient_eq(&Leaf::Float(1.0)));
    }

    #[test]
    fn test_map_key_ordering_is_total() {
        let mut keys = vec![MapKey::from("b"), MapKey::from("a"), MapKey::from("c")];
        keys.sort();
        let texts: Vec<String> = keys.iter().map(|k| k.text().into_owned()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_enum_key_text_is_variant() {
        let key = MapKey::from(EnumConst::new("Color", "Red"));
        assert_eq!(key.text(), "Red");
        assert_eq!(key.literal(), "Color::Red");
    }

    #[test]
    fn test_numeric_twin_crosses_signedness() {
        assert_eq!(MapKey::Int(1).numeric_twin(), Some(MapKey::UInt(1)));
        assert_eq!(MapKey::UInt(1).numeric_twin(), Some(MapKey::Int(1)));
        assert_eq!(MapKey::Int(-1).numeric_twin(), None);
        assert_eq!(MapKey::UInt(u64::MAX).numeric_twin(), None);
        assert_eq!(MapKey::from("1").numeric_twin(), None);
    }
}
