//! Kernels partitioned across devices.
//!
//! Every device gets its own base address and argument list and later its
//! own memory maps and launch file.

use super::{
    address,
    config::EncodingConfig,
    kernel::{Axis, Instances, KernelDescriptor, Transform},
    Error,
};
use ndp_model::Argument;

/// Distance between the address spaces of neighbouring devices.
pub const DEVICE_INTERLEAVE: u64 = 0x1000_0000_0000;

#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub base_addrs: Vec<address>,
    pub arguments: Vec<Vec<Argument>>,
}

fn mismatch(reason: String) -> Error {
    Error::PartitionArityMismatch { reason }
}

impl Partition {
    #[must_use]
    pub fn new(base_addrs: Vec<address>, arguments: Vec<Vec<Argument>>) -> Self {
        Self {
            base_addrs,
            arguments,
        }
    }

    /// Partition over `num_devices` devices whose address spaces are
    /// [`DEVICE_INTERLEAVE`] bytes apart.
    ///
    /// `arguments` builds the argument list of a device from its index.
    pub fn interleaved(
        num_devices: usize,
        base_addr: address,
        mut arguments: impl FnMut(usize) -> Vec<Argument>,
    ) -> Self {
        let base_addrs = (0..num_devices as u64)
            .map(|device| base_addr + device * DEVICE_INTERLEAVE)
            .collect();
        let arguments = (0..num_devices).map(&mut arguments).collect();
        Self::new(base_addrs, arguments)
    }

    #[must_use]
    pub fn num_devices(&self) -> usize {
        self.base_addrs.len()
    }

    fn validate(&self, descriptor: &KernelDescriptor) -> Result<(), Error> {
        if self.base_addrs.is_empty() {
            return Err(mismatch("no devices".to_string()));
        }
        if self.base_addrs.len() != self.arguments.len() {
            return Err(mismatch(format!(
                "{} base addresses for {} argument lists",
                self.base_addrs.len(),
                self.arguments.len()
            )));
        }
        let expected = match &descriptor.schema {
            Some(schema) => schema.len(),
            None => self.arguments[0].len(),
        };
        for (device, arguments) in self.arguments.iter().enumerate() {
            if arguments.len() != expected {
                return Err(mismatch(format!(
                    "device {device} has {} arguments, expected {expected}",
                    arguments.len()
                )));
            }
            if let Some(schema) = &descriptor.schema {
                schema
                    .check(arguments)
                    .map_err(|err| mismatch(format!("device {device}: {err}")))?;
            }
        }
        Ok(())
    }
}

impl KernelDescriptor {
    /// Expands the kernel into one instance per device.
    ///
    /// Nothing is produced unless the per device lists agree in length.
    pub fn partition(mut self, partition: Partition, config: &EncodingConfig) -> Result<Self, Error> {
        if self.instances.is_some() {
            return Err(Error::AlreadyExpanded { name: self.name });
        }
        partition.validate(&self)?;
        for (device, &base_addr) in partition.base_addrs.iter().enumerate() {
            if !config.is_stripe_aligned(base_addr) {
                log::warn!(
                    "{}: device {device} base {base_addr:#x} is not aligned to the {} byte stride",
                    self.name,
                    config.stride
                );
            }
        }
        let transforms = partition
            .base_addrs
            .into_iter()
            .zip(partition.arguments)
            .map(|(base_addr, arguments)| Transform::Rebase {
                base_addr,
                arguments,
            })
            .collect();
        let instances = Instances::new(Axis::Device, transforms)?;
        log::debug!("partitioning {} across {} devices", self.name, instances.len());
        self.instances = Some(instances);
        Ok(self)
    }
}
