use super::{sin_squared, Trace};
use crate::{
    address,
    config::EncodingConfig,
    kernel::{Kernel, KernelDescriptor},
    launch::LaunchRecord,
    memory_map::MemoryRegionMap,
    partition::{Partition, DEVICE_INTERLEAVE},
    Error,
};
use ndp_model::{Argument, ArgumentSchema, TypedBuffer};

pub const INPUT_ADDR: address = 0x0100_0000_0000;
pub const OUTPUT_ADDR: address = 0x0200_0000_0000;

/// Every device adds the shard of its ring neighbour to its own shard.
#[derive(Debug, Clone)]
pub struct ReduceScatter {
    descriptor: KernelDescriptor,
    shards: Vec<Vec<f32>>,
}

fn device_addr(addr: address, device: usize) -> address {
    addr + device as u64 * DEVICE_INTERLEAVE
}

impl ReduceScatter {
    pub fn new(n: usize, num_devices: usize, config: &EncodingConfig) -> Result<Self, Error> {
        let shards: Vec<_> = (0..num_devices).map(|device| sin_squared(n, device * n)).collect();
        let bound = (n * std::mem::size_of::<f32>()) as u64;
        let schema = ArgumentSchema::new().address("neighbour").address("out");
        let launch = LaunchRecord::new(0, INPUT_ADDR, bound).arguments([
            Argument::Address(device_addr(INPUT_ADDR, 1 % num_devices.max(1))),
            Argument::Address(OUTPUT_ADDR),
        ]);
        let partition = Partition::interleaved(num_devices, INPUT_ADDR, |device| {
            let neighbour = (device + 1) % num_devices;
            vec![
                Argument::Address(device_addr(INPUT_ADDR, neighbour)),
                Argument::Address(device_addr(OUTPUT_ADDR, device)),
            ]
        });
        let descriptor = KernelDescriptor::new("reduce_scatter", launch)
            .with_schema(schema)?
            .partition(partition, config)?;
        Ok(Self { descriptor, shards })
    }

    fn neighbour(&self, device: usize) -> usize {
        (device + 1) % self.shards.len()
    }

    fn shard(&self, device: usize) -> Result<&Vec<f32>, Error> {
        self.shards
            .get(device)
            .ok_or_else(|| Error::PartitionArityMismatch {
                reason: format!("no device {device} among {}", self.shards.len()),
            })
    }

    /// Expected output shard of `device`.
    pub fn reference(&self, device: usize) -> Result<Vec<f32>, Error> {
        let own = self.shard(device)?;
        let neighbour = self.shard(self.neighbour(device))?;
        Ok(own.iter().zip(neighbour).map(|(a, b)| a + b).collect())
    }

    fn map_with_output(&self, device: usize, output: Vec<f32>) -> Result<MemoryRegionMap, Error> {
        let neighbour = self.neighbour(device);
        let mut map = MemoryRegionMap::new().with_region(
            device_addr(INPUT_ADDR, device),
            TypedBuffer::new("input", self.shard(device)?.clone()),
        )?;
        // a single device is its own neighbour
        if neighbour != device {
            map = map.with_region(
                device_addr(INPUT_ADDR, neighbour),
                TypedBuffer::new("neighbour", self.shard(neighbour)?.clone()),
            )?;
        }
        map.with_region(device_addr(OUTPUT_ADDR, device), TypedBuffer::new("output", output))
    }
}

impl Kernel for ReduceScatter {
    fn descriptor(&self) -> &KernelDescriptor {
        &self.descriptor
    }

    fn instructions(&self, config: &EncodingConfig) -> Result<String, Error> {
        let descriptor = &self.descriptor;
        let schema = descriptor
            .schema
            .as_ref()
            .ok_or_else(|| Error::UnknownArgumentSlot("neighbour".to_string()))?;
        let mut trace = Trace::new(&descriptor.name, descriptor.launch.kernel_id);
        trace
            .section("KERNELBODY")
            .push("vsetvli 0, 0, e32, m1, 0")
            .load_argument("x1", config, schema, "neighbour")?
            .load_argument("x2", config, schema, "out")?;
        trace
            .push("add x1, x1, OFFSET")
            .push("add x2, x2, OFFSET")
            .push("vle32.v v1, (ADDR)")
            .push("vle32.v v2, (x1)")
            .push("vfadd.vv v3, v1, v2")
            .push("vse32.v v3, (x2)");
        Ok(trace.finish())
    }

    fn input_map(&self, device: usize) -> Result<MemoryRegionMap, Error> {
        let n = self.shard(device)?.len();
        self.map_with_output(device, vec![0.0; n])
    }

    fn output_map(&self, device: usize) -> Result<MemoryRegionMap, Error> {
        self.map_with_output(device, self.reference(device)?)
    }
}
