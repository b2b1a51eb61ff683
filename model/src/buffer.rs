use super::element::{Element, ElementType};
use half::f16;
use serde::{Deserialize, Serialize};

/// Homogeneous element storage of a [`TypedBuffer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", content = "values", rename_all = "lowercase")]
pub enum BufferData {
    Int8(Vec<i8>),
    UInt8(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Float16(Vec<f16>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

/// Generic operation over the concrete element slice of a buffer.
pub trait BufferVisitor {
    type Output;

    fn visit<T: Element>(self, values: &[T]) -> Self::Output;
}

impl BufferData {
    pub fn visit<V: BufferVisitor>(&self, visitor: V) -> V::Output {
        match self {
            Self::Int8(values) => visitor.visit(values),
            Self::UInt8(values) => visitor.visit(values),
            Self::Int16(values) => visitor.visit(values),
            Self::UInt16(values) => visitor.visit(values),
            Self::Int32(values) => visitor.visit(values),
            Self::UInt32(values) => visitor.visit(values),
            Self::Int64(values) => visitor.visit(values),
            Self::UInt64(values) => visitor.visit(values),
            Self::Float16(values) => visitor.visit(values),
            Self::Float32(values) => visitor.visit(values),
            Self::Float64(values) => visitor.visit(values),
        }
    }

    #[must_use]
    pub fn element_type(&self) -> ElementType {
        struct Type;
        impl BufferVisitor for Type {
            type Output = ElementType;
            fn visit<T: Element>(self, _values: &[T]) -> ElementType {
                T::TYPE
            }
        }
        self.visit(Type)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        struct Len;
        impl BufferVisitor for Len {
            type Output = usize;
            fn visit<T: Element>(self, values: &[T]) -> usize {
                values.len()
            }
        }
        self.visit(Len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn cast_all<T: Element>(values: &[f64]) -> Vec<T> {
    values.iter().copied().map(T::from_f64).collect()
}

/// An immutable, named array of elements of a single type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedBuffer {
    name: String,
    data: BufferData,
}

impl TypedBuffer {
    #[must_use]
    pub fn new<T: Element>(name: impl Into<String>, values: Vec<T>) -> Self {
        Self {
            name: name.into(),
            data: T::into_data(values),
        }
    }

    /// Builds a buffer of `element_type` by casting each value.
    #[must_use]
    pub fn cast(name: impl Into<String>, element_type: ElementType, values: &[f64]) -> Self {
        let data = match element_type {
            ElementType::Int8 => BufferData::Int8(cast_all(values)),
            ElementType::UInt8 => BufferData::UInt8(cast_all(values)),
            ElementType::Int16 => BufferData::Int16(cast_all(values)),
            ElementType::UInt16 => BufferData::UInt16(cast_all(values)),
            ElementType::Int32 => BufferData::Int32(cast_all(values)),
            ElementType::UInt32 => BufferData::UInt32(cast_all(values)),
            ElementType::Int64 => BufferData::Int64(cast_all(values)),
            ElementType::UInt64 => BufferData::UInt64(cast_all(values)),
            ElementType::Float16 => BufferData::Float16(cast_all(values)),
            ElementType::Float32 => BufferData::Float32(cast_all(values)),
            ElementType::Float64 => BufferData::Float64(cast_all(values)),
        };
        Self {
            name: name.into(),
            data,
        }
    }

    /// Builds a buffer from a dtype name such as `"float32"` or `"i8"`.
    pub fn from_dtype(
        name: impl Into<String>,
        dtype: &str,
        values: &[f64],
    ) -> Result<Self, super::Error> {
        let element_type: ElementType = dtype.parse()?;
        Ok(Self::cast(name, element_type, values))
    }

    #[must_use]
    pub fn zeros(name: impl Into<String>, element_type: ElementType, len: usize) -> Self {
        Self::cast(name, element_type, &vec![0.0; len])
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn data(&self) -> &BufferData {
        &self.data
    }

    #[must_use]
    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of bytes occupied by the elements.
    #[must_use]
    pub fn byte_len(&self) -> u64 {
        (self.len() * self.element_type().size()) as u64
    }

    /// The elements, if the buffer holds elements of type `T`.
    #[must_use]
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice(&self.data)
    }

    #[must_use]
    pub fn to_f64_vec(&self) -> Vec<f64> {
        struct ToF64;
        impl BufferVisitor for ToF64 {
            type Output = Vec<f64>;
            fn visit<T: Element>(self, values: &[T]) -> Vec<f64> {
                values.iter().copied().map(T::to_f64).collect()
            }
        }
        self.data.visit(ToF64)
    }
}

impl std::fmt::Display for TypedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}[{}; {}]",
            self.name,
            self.element_type(),
            self.len()
        )
    }
}
