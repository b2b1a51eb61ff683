use super::buffer::BufferData;
use half::f16;
use serde::{Deserialize, Serialize};

/// Element type of a typed buffer.
#[derive(
    Debug,
    Clone,
    Copy,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::Display,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ElementType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float16,
    Float32,
    Float64,
}

impl ElementType {
    /// Size of one element in bytes.
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 | Self::Float16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    /// Type tag used in memory map files.
    ///
    /// Types without a tag cannot be loaded by the simulator.
    #[must_use]
    pub fn wire_tag(self) -> Option<&'static str> {
        match self {
            Self::Float16 => Some("float16"),
            Self::Float32 => Some("float32"),
            Self::Int16 => Some("int16"),
            Self::Int32 => Some("int32"),
            Self::Int64 => Some("int64"),
            Self::Int8 => Some("char8"),
            Self::UInt8 => Some("uint8"),
            Self::UInt16 | Self::UInt32 | Self::UInt64 | Self::Float64 => None,
        }
    }

    #[must_use]
    pub fn from_wire_tag(tag: &str) -> Option<Self> {
        use strum::IntoEnumIterator;
        Self::iter().find(|ty| ty.wire_tag() == Some(tag))
    }

    #[must_use]
    pub fn is_float(self) -> bool {
        matches!(self, Self::Float16 | Self::Float32 | Self::Float64)
    }
}

impl std::str::FromStr for ElementType {
    type Err = super::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let ty = match value.trim().to_lowercase().as_str() {
            "int8" | "i8" | "char8" => Self::Int8,
            "uint8" | "u8" => Self::UInt8,
            "int16" | "i16" => Self::Int16,
            "uint16" | "u16" => Self::UInt16,
            "int32" | "i32" => Self::Int32,
            "uint32" | "u32" => Self::UInt32,
            "int64" | "i64" => Self::Int64,
            "uint64" | "u64" => Self::UInt64,
            "float16" | "f16" | "half" => Self::Float16,
            "float32" | "f32" | "single" => Self::Float32,
            "float64" | "f64" | "double" => Self::Float64,
            _ => return Err(super::Error::UnsupportedType(value.to_string())),
        };
        Ok(ty)
    }
}

/// A primitive that can be stored in a [`TypedBuffer`](super::TypedBuffer).
pub trait Element: Copy + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    const TYPE: ElementType;

    /// Numeric cast with `as` semantics (truncating, saturating at the bounds).
    fn from_f64(value: f64) -> Self;

    fn to_f64(self) -> f64;

    /// Parses a single value of a memory map row.
    fn parse_wire(token: &str) -> Option<Self>;

    /// Formats a single value of a memory map row.
    fn fmt_wire(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result;

    fn into_data(values: Vec<Self>) -> BufferData;

    fn slice(data: &BufferData) -> Option<&[Self]>;
}

/// Formats an element the way memory map rows expect it.
#[derive(Debug, Clone, Copy)]
pub struct Wire<T>(pub T);

impl<T: Element> std::fmt::Display for Wire<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt_wire(f)
    }
}

macro_rules! impl_integer_element {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const TYPE: ElementType = ElementType::$variant;

            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                clippy::cast_lossless
            )]
            fn from_f64(value: f64) -> Self {
                value as $ty
            }

            #[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
            fn to_f64(self) -> f64 {
                self as f64
            }

            fn parse_wire(token: &str) -> Option<Self> {
                token.parse().ok()
            }

            fn fmt_wire(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{self}")
            }

            fn into_data(values: Vec<Self>) -> BufferData {
                BufferData::$variant(values)
            }

            fn slice(data: &BufferData) -> Option<&[Self]> {
                match data {
                    BufferData::$variant(values) => Some(values),
                    _ => None,
                }
            }
        }
    };
}

impl_integer_element!(i8, Int8);
impl_integer_element!(u8, UInt8);
impl_integer_element!(i16, Int16);
impl_integer_element!(u16, UInt16);
impl_integer_element!(i32, Int32);
impl_integer_element!(u32, UInt32);
impl_integer_element!(i64, Int64);
impl_integer_element!(u64, UInt64);

impl Element for f32 {
    const TYPE: ElementType = ElementType::Float32;

    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn parse_wire(token: &str) -> Option<Self> {
        token.parse().ok()
    }

    // debug formatting keeps the fractional part (`1.0` instead of `1`)
    fn fmt_wire(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }

    fn into_data(values: Vec<Self>) -> BufferData {
        BufferData::Float32(values)
    }

    fn slice(data: &BufferData) -> Option<&[Self]> {
        match data {
            BufferData::Float32(values) => Some(values),
            _ => None,
        }
    }
}

impl Element for f64 {
    const TYPE: ElementType = ElementType::Float64;

    fn from_f64(value: f64) -> Self {
        value
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn parse_wire(token: &str) -> Option<Self> {
        token.parse().ok()
    }

    fn fmt_wire(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }

    fn into_data(values: Vec<Self>) -> BufferData {
        BufferData::Float64(values)
    }

    fn slice(data: &BufferData) -> Option<&[Self]> {
        match data {
            BufferData::Float64(values) => Some(values),
            _ => None,
        }
    }
}

impl Element for f16 {
    const TYPE: ElementType = ElementType::Float16;

    fn from_f64(value: f64) -> Self {
        f16::from_f64(value)
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn parse_wire(token: &str) -> Option<Self> {
        token.parse::<f32>().ok().map(f16::from_f32)
    }

    fn fmt_wire(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.to_f32())
    }

    fn into_data(values: Vec<Self>) -> BufferData {
        BufferData::Float16(values)
    }

    fn slice(data: &BufferData) -> Option<&[Self]> {
        match data {
            BufferData::Float16(values) => Some(values),
            _ => None,
        }
    }
}
