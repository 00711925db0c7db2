use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// A point or direction in agent space.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0., 0., 0.);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(self, other: Self) -> f32 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Bit pattern used for symbol equality: every NaN is one value and the two
/// zeros are one value, so equality stays reflexive.
pub(crate) fn float_bits(f: f32) -> u32 {
    if f.is_nan() {
        f32::NAN.to_bits()
    } else if f == 0. {
        0
    } else {
        f.to_bits()
    }
}

impl PartialEq for Vector3 {
    fn eq(&self, other: &Self) -> bool {
        float_bits(self.x) == float_bits(other.x)
            && float_bits(self.y) == float_bits(other.y)
            && float_bits(self.z) == float_bits(other.z)
    }
}

impl Eq for Vector3 {}

/// Opaque handle to an object owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "ObjectRepr", into = "ObjectRepr")]
pub struct ObjectRef(pub u64);

#[derive(Serialize, Deserialize)]
struct ObjectRepr {
    object: u64,
}

impl From<ObjectRepr> for ObjectRef {
    fn from(repr: ObjectRepr) -> Self {
        Self(repr.object)
    }
}

impl From<ObjectRef> for ObjectRepr {
    fn from(obj: ObjectRef) -> Self {
        Self { object: obj.0 }
    }
}

/// The value of a symbol.
///
/// Equality is exact for every kind. Floats compare by bit pattern, so a
/// NaN equals itself and `-0.0` equals `0.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f32),
    Str(String),
    Vector(Vector3),
    Object(ObjectRef),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => float_bits(*a) == float_bits(*b),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Vector(a), Self::Vector(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Str,
    Vector,
    Object,
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "string",
            Self::Vector => "vector",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Str(_) => ValueKind::Str,
            Self::Vector(_) => ValueKind::Vector,
            Self::Object(_) => ValueKind::Object,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::Vector(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
            Self::Object(v) => write!(f, "object#{}", v.0),
        }
    }
}

/// Rust types that can be stored in and read back from a [`Value`].
pub trait SymbolValue: Sized {
    const KIND: ValueKind;

    fn from_value(value: &Value) -> Option<Self>;

    fn into_value(self) -> Value;
}

macro_rules! impl_symbol_value {
    ($ty:ty, $variant:ident) => {
        impl SymbolValue for $ty {
            const KIND: ValueKind = ValueKind::$variant;

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_symbol_value!(bool, Bool);
impl_symbol_value!(i64, Int);
impl_symbol_value!(f32, Float);
impl_symbol_value!(String, Str);
impl_symbol_value!(Vector3, Vector);
impl_symbol_value!(ObjectRef, Object);

impl SymbolValue for i32 {
    const KIND: ValueKind = ValueKind::Int;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Int(self as i64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}
