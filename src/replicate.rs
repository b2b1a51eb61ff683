//! Replicated kernels.
//!
//! A replicated kernel shares one instruction body and one pair of memory
//! maps between `count` launches. Replica `r` starts at
//! `base + r * base_offset` and sees argument `i` moved by `r * offset[i]`.

use super::{
    kernel::{Axis, Instances, KernelDescriptor, Transform},
    Error,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replication {
    pub count: usize,
    /// Defaults to the iteration bound.
    pub base_offset: Option<u64>,
    /// Defaults to zero for every argument.
    pub argument_offsets: Option<Vec<i64>>,
}

impl Replication {
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            count,
            base_offset: None,
            argument_offsets: None,
        }
    }

    #[must_use]
    pub fn base_offset(mut self, base_offset: u64) -> Self {
        self.base_offset = Some(base_offset);
        self
    }

    #[must_use]
    pub fn argument_offsets(mut self, offsets: impl IntoIterator<Item = i64>) -> Self {
        self.argument_offsets = Some(offsets.into_iter().collect());
        self
    }

    fn instances(&self, descriptor: &KernelDescriptor) -> Result<Instances, Error> {
        if self.count == 0 {
            return Err(Error::EmptyReplication);
        }
        let num_arguments = descriptor.launch.arguments.len();
        let argument_offsets = match &self.argument_offsets {
            Some(offsets) if offsets.len() != num_arguments => {
                return Err(Error::ReplicaOffsetArity {
                    arguments: num_arguments,
                    offsets: offsets.len(),
                });
            }
            Some(offsets) => offsets.clone(),
            None => vec![0; num_arguments],
        };
        let base_offset = self.base_offset.unwrap_or(descriptor.launch.bound);
        let transforms = (0..self.count as u64)
            .map(|step| Transform::Shift {
                base_offset,
                argument_offsets: argument_offsets.clone(),
                step,
            })
            .collect();
        Instances::new(Axis::Replica, transforms)
    }
}

impl KernelDescriptor {
    /// Expands the kernel into `replication.count` launches on one device.
    pub fn replicate(mut self, replication: &Replication) -> Result<Self, Error> {
        if self.instances.is_some() {
            return Err(Error::AlreadyExpanded { name: self.name });
        }
        let instances = replication.instances(&self)?;
        log::debug!("replicating {} {} times", self.name, instances.len());
        self.instances = Some(instances);
        Ok(self)
    }
}
