//! Parameter value types and their wire tags.

use std::fmt;
use std::net::SocketAddr;

use crate::custom::CustomTypeId;

/// A 3-D vector, encoded as three `f32` values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared euclidean distance to `other`.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A rotation quaternion, encoded as four `f32` values (x, y, z, w).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// The type of a parameter slot.
///
/// Every variant except [`TypeTag::Connection`] has a 4-bit wire code.
/// `Connection` slots are filled by the receiver with the sender's address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I32,
    I64,
    F32,
    F64,
    String,
    Bytes,
    Vec3,
    Quat,
    Custom(CustomTypeId),
    Connection,
}

/// Number of bits used for a type code on the wire.
pub(crate) const TAG_BITS: u8 = 4;

impl TypeTag {
    /// Returns the wire code, or `None` for local-only types.
    #[must_use]
    pub const fn code(self) -> Option<u8> {
        let code = match self {
            Self::Bool => 0,
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 3,
            Self::U64 => 4,
            Self::I32 => 5,
            Self::I64 => 6,
            Self::F32 => 7,
            Self::F64 => 8,
            Self::String => 9,
            Self::Bytes => 10,
            Self::Vec3 => 11,
            Self::Quat => 12,
            Self::Custom(_) => 13,
            Self::Connection => return None,
        };
        Some(code)
    }

    /// Returns `true` if values of this type never appear on the wire.
    #[must_use]
    pub const fn is_local_only(self) -> bool {
        matches!(self, Self::Connection)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::U8 => write!(f, "u8"),
            Self::U16 => write!(f, "u16"),
            Self::U32 => write!(f, "u32"),
            Self::U64 => write!(f, "u64"),
            Self::I32 => write!(f, "i32"),
            Self::I64 => write!(f, "i64"),
            Self::F32 => write!(f, "f32"),
            Self::F64 => write!(f, "f64"),
            Self::String => write!(f, "string"),
            Self::Bytes => write!(f, "bytes"),
            Self::Vec3 => write!(f, "vec3"),
            Self::Quat => write!(f, "quat"),
            Self::Custom(id) => write!(f, "custom{id}"),
            Self::Connection => write!(f, "connection"),
        }
    }
}

/// A custom value in its encoded form, tagged with its registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomValue {
    pub type_id: CustomTypeId,
    pub bytes: Vec<u8>,
}

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Vec3(Vec3),
    Quat(Quat),
    Custom(CustomValue),
    /// The sending connection's address, substituted at dispatch time.
    Connection(SocketAddr),
}

impl Value {
    /// Returns the type tag of this value.
    #[must_use]
    pub fn tag(&self) -> TypeTag {
        match self {
            Self::Bool(_) => TypeTag::Bool,
            Self::U8(_) => TypeTag::U8,
            Self::U16(_) => TypeTag::U16,
            Self::U32(_) => TypeTag::U32,
            Self::U64(_) => TypeTag::U64,
            Self::I32(_) => TypeTag::I32,
            Self::I64(_) => TypeTag::I64,
            Self::F32(_) => TypeTag::F32,
            Self::F64(_) => TypeTag::F64,
            Self::String(_) => TypeTag::String,
            Self::Bytes(_) => TypeTag::Bytes,
            Self::Vec3(_) => TypeTag::Vec3,
            Self::Quat(_) => TypeTag::Quat,
            Self::Custom(custom) => TypeTag::Custom(custom.type_id),
            Self::Connection(_) => TypeTag::Connection,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u8(&self) -> Option<u8> {
        match self {
            Self::U8(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Self::U16(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::U32(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::F32(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_custom(&self) -> Option<&CustomValue> {
        match self {
            Self::Custom(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_connection(&self) -> Option<SocketAddr> {
        match self {
            Self::Connection(v) => Some(*v),
            _ => None,
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => String,
    Vec<u8> => Bytes,
    Vec3 => Vec3,
    Quat => Quat,
    SocketAddr => Connection,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}
