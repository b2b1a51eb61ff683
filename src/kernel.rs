use super::{
    address, config::EncodingConfig, launch::LaunchRecord, memory_map::MemoryRegionMap,
    wire::write_launch_file, Error,
};
use ndp_model::{Argument, ArgumentSchema};
use serde::{Deserialize, Serialize};

/// What the instances of a kernel stand for.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Axis {
    /// Instances launched back to back on one device, listed in one launch file.
    Replica,
    /// One instance per device, each with its own maps and launch file.
    Device,
}

/// Derives the launch record of one instance from the kernel's launch record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Moves the base by `step * base_offset` and argument `i` by
    /// `step * argument_offsets[i]`.
    Shift {
        base_offset: u64,
        argument_offsets: Vec<i64>,
        step: u64,
    },
    /// Replaces the base and the arguments.
    Rebase {
        base_addr: address,
        arguments: Vec<Argument>,
    },
}

impl Transform {
    #[must_use]
    pub fn apply(&self, launch: &LaunchRecord) -> LaunchRecord {
        match self {
            Self::Shift {
                base_offset,
                argument_offsets,
                step,
            } => LaunchRecord {
                base_addr: launch
                    .base_addr
                    .wrapping_add(base_offset.wrapping_mul(*step)),
                arguments: launch
                    .arguments
                    .iter()
                    .zip(argument_offsets)
                    .map(|(arg, &offset)| arg.shifted(offset, *step))
                    .collect(),
                ..launch.clone()
            },
            Self::Rebase {
                base_addr,
                arguments,
            } => LaunchRecord {
                base_addr: *base_addr,
                arguments: arguments.clone(),
                ..launch.clone()
            },
        }
    }
}

/// Expansion of one kernel into several instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instances {
    axis: Axis,
    transforms: Vec<Transform>,
}

impl Instances {
    /// Fails with [`Error::EmptyReplication`] if `transforms` is empty.
    pub fn new(axis: Axis, transforms: Vec<Transform>) -> Result<Self, Error> {
        if transforms.is_empty() {
            return Err(Error::EmptyReplication);
        }
        Ok(Self { axis, transforms })
    }

    #[must_use]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    #[must_use]
    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

/// Everything the simulator needs to launch a kernel, minus its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelDescriptor {
    pub name: String,
    pub launch: LaunchRecord,
    pub schema: Option<ArgumentSchema>,
    pub instances: Option<Instances>,
}

impl KernelDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, launch: LaunchRecord) -> Self {
        Self {
            name: name.into(),
            launch,
            schema: None,
            instances: None,
        }
    }

    /// Attaches the scratchpad layout the launch arguments must follow.
    pub fn with_schema(mut self, schema: ArgumentSchema) -> Result<Self, Error> {
        schema.check(&self.launch.arguments)?;
        self.schema = Some(schema);
        Ok(self)
    }

    /// Scratchpad address of the argument slot `name`.
    pub fn scratchpad_addr(&self, config: &EncodingConfig, name: &str) -> Result<address, Error> {
        match &self.schema {
            Some(schema) => config.scratchpad_addr(schema, name),
            None => Err(Error::UnknownArgumentSlot(name.to_string())),
        }
    }

    #[must_use]
    pub fn axis(&self) -> Option<Axis> {
        self.instances.as_ref().map(Instances::axis)
    }

    /// Number of devices the kernel runs on.
    #[must_use]
    pub fn num_devices(&self) -> usize {
        match &self.instances {
            Some(instances) if instances.axis() == Axis::Device => instances.len(),
            _ => 1,
        }
    }

    /// Launch records of every instance, in launch order.
    #[must_use]
    pub fn instance_launches(&self) -> Vec<LaunchRecord> {
        match &self.instances {
            None => vec![self.launch.clone()],
            Some(instances) => instances
                .transforms()
                .iter()
                .map(|transform| transform.apply(&self.launch))
                .collect(),
        }
    }

    /// Launch records grouped by device.
    #[must_use]
    pub fn device_launches(&self) -> Vec<Vec<LaunchRecord>> {
        let launches = self.instance_launches();
        match self.axis() {
            Some(Axis::Device) => launches.into_iter().map(|launch| vec![launch]).collect(),
            Some(Axis::Replica) | None => vec![launches],
        }
    }

    /// Encodes one launch file per device.
    ///
    /// Replicas share a file, one line each.
    pub fn encode_launch(&self, config: &EncodingConfig) -> Result<Vec<String>, Error> {
        self.device_launches()
            .iter()
            .map(|launches| {
                let mut out = Vec::new();
                write_launch_file(launches, config, &mut out)?;
                String::from_utf8(out).map_err(|err| Error::Io(std::io::Error::other(err)))
            })
            .collect()
    }
}

/// A benchmark kernel.
///
/// Implementors build the instruction body and the memory maps, the launch
/// files follow from the descriptor.
pub trait Kernel {
    fn descriptor(&self) -> &KernelDescriptor;

    /// Instruction trace passed to the simulator unchanged.
    fn instructions(&self, config: &EncodingConfig) -> Result<String, Error>;

    /// Memory contents before the kernel runs on `device`.
    fn input_map(&self, device: usize) -> Result<MemoryRegionMap, Error>;

    /// Expected memory contents after the kernel ran on `device`.
    fn output_map(&self, device: usize) -> Result<MemoryRegionMap, Error>;

    fn launch_descriptors(&self, config: &EncodingConfig) -> Result<Vec<String>, Error> {
        self.descriptor().encode_launch(config)
    }
}
