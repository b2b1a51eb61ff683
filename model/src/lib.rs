#![allow(clippy::missing_errors_doc)]

pub mod argument;
pub mod buffer;
pub mod element;

pub use argument::{Argument, ArgumentKind, ArgumentSchema, Slot, SLOT_BYTES};
pub use buffer::{BufferData, BufferVisitor, TypedBuffer};
pub use element::{Element, ElementType, Wire};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unsupported element type {0:?}")]
    UnsupportedType(String),

    #[error("malformed argument {value:?}: {reason}")]
    MalformedArgument { value: String, reason: String },

    #[error("arguments do not match schema: {reason}")]
    SchemaMismatch { reason: String },

    #[error("no argument slot named {0:?}")]
    UnknownSlot(String),
}
