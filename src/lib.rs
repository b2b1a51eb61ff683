#![allow(
    non_camel_case_types,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]

pub mod artifacts;
pub mod benchmarks;
pub mod config;
pub mod error;
pub mod interleave;
pub mod kernel;
pub mod launch;
pub mod layout;
pub mod memory_map;
pub mod partition;
pub mod replicate;
pub mod sim;
pub mod wire;

pub use config::EncodingConfig;
pub use error::Error;
pub use kernel::{Kernel, KernelDescriptor};
pub use launch::LaunchRecord;
pub use memory_map::MemoryRegionMap;
pub use ndp_model::{Argument, ArgumentKind, ArgumentSchema, ElementType, TypedBuffer};

/// Byte address in the simulated global memory.
pub type address = u64;

#[cfg(test)]
pub mod testing;
