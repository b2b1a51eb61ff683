use super::{sin_squared, Trace};
use crate::{
    address,
    config::EncodingConfig,
    kernel::{Kernel, KernelDescriptor},
    launch::LaunchRecord,
    memory_map::MemoryRegionMap,
    replicate::Replication,
    Error,
};
use ndp_model::{Argument, ArgumentSchema, TypedBuffer};

pub const INPUT_ADDR: address = 0x100_0000_0000_0000;
pub const OUTPUT_ADDR: address = 0x101_0000_0000_0000;

/// `y = alpha * x`, split into `replicas` back to back launches of `n`
/// elements each.
#[derive(Debug, Clone)]
pub struct Scale {
    descriptor: KernelDescriptor,
    x: Vec<f32>,
    alpha: f32,
}

impl Scale {
    pub fn new(n: usize, replicas: usize, alpha: f32) -> Result<Self, Error> {
        let x = sin_squared(n * replicas, 0);
        let chunk = (n * std::mem::size_of::<f32>()) as u64;
        let launch = LaunchRecord::new(0, INPUT_ADDR, chunk).arguments([
            Argument::Address(OUTPUT_ADDR),
            Argument::Float32(alpha),
        ]);
        let schema = ArgumentSchema::new().address("y").float32("alpha");
        #[allow(clippy::cast_possible_wrap)]
        let replication = Replication::new(replicas).argument_offsets([chunk as i64, 0]);
        let descriptor = KernelDescriptor::new("scale", launch)
            .with_schema(schema)?
            .replicate(&replication)?;
        Ok(Self {
            descriptor,
            x,
            alpha,
        })
    }

    #[must_use]
    pub fn reference(&self) -> Vec<f32> {
        self.x.iter().map(|x| self.alpha * x).collect()
    }
}

impl Kernel for Scale {
    fn descriptor(&self) -> &KernelDescriptor {
        &self.descriptor
    }

    fn instructions(&self, config: &EncodingConfig) -> Result<String, Error> {
        let descriptor = &self.descriptor;
        let schema = descriptor
            .schema
            .as_ref()
            .ok_or_else(|| Error::UnknownArgumentSlot("y".to_string()))?;
        let mut trace = Trace::new(&descriptor.name, descriptor.launch.kernel_id);
        trace
            .section("KERNELBODY")
            .push("vsetvli 0, 0, e32, m1, 0")
            .load_argument("x1", config, schema, "y")?
            .load_float_argument("f1", "x2", config, schema, "alpha")?;
        trace
            .push("add x1, x1, OFFSET")
            .push("vle32.v v1, (ADDR)")
            .push("vfmul.vf v2, v1, f1")
            .push("vse32.v v2, (x1)");
        Ok(trace.finish())
    }

    fn input_map(&self, _device: usize) -> Result<MemoryRegionMap, Error> {
        MemoryRegionMap::new()
            .with_region(INPUT_ADDR, TypedBuffer::new("x", self.x.clone()))?
            .with_region(OUTPUT_ADDR, TypedBuffer::new("y", vec![0.0f32; self.x.len()]))
    }

    fn output_map(&self, _device: usize) -> Result<MemoryRegionMap, Error> {
        MemoryRegionMap::new()
            .with_region(INPUT_ADDR, TypedBuffer::new("x", self.x.clone()))?
            .with_region(OUTPUT_ADDR, TypedBuffer::new("y", self.reference()))
    }
}
