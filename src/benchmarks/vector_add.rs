use super::{sin_squared, Trace};
use crate::{
    address, config::EncodingConfig, kernel::Kernel, kernel::KernelDescriptor,
    launch::LaunchRecord, memory_map::MemoryRegionMap, Error,
};
use ndp_model::{Argument, ArgumentSchema, TypedBuffer};

pub const INPUT_A_ADDR: address = 0x100_0000_0000_0000;
pub const INPUT_B_ADDR: address = 0x101_0000_0000_0000;
pub const OUTPUT_ADDR: address = 0x102_0000_0000_0000;

/// `c = a + b` over float32 vectors.
#[derive(Debug, Clone)]
pub struct VectorAdd {
    descriptor: KernelDescriptor,
    a: Vec<f32>,
    b: Vec<f32>,
}

impl VectorAdd {
    pub fn new(n: usize) -> Result<Self, Error> {
        let a = sin_squared(n, 0);
        let b: Vec<f32> = (0..n)
            .map(|i| {
                let angle = i as f32;
                angle.cos() * angle.cos()
            })
            .collect();
        let bound = (n * std::mem::size_of::<f32>()) as u64;
        let launch = LaunchRecord::new(0, INPUT_A_ADDR, bound).arguments([
            Argument::Address(INPUT_A_ADDR),
            Argument::Address(INPUT_B_ADDR),
            Argument::Address(OUTPUT_ADDR),
        ]);
        let schema = ArgumentSchema::new().address("a").address("b").address("c");
        let descriptor = KernelDescriptor::new("vector_add", launch).with_schema(schema)?;
        Ok(Self { descriptor, a, b })
    }

    #[must_use]
    pub fn reference(&self) -> Vec<f32> {
        self.a.iter().zip(&self.b).map(|(a, b)| a + b).collect()
    }
}

impl Kernel for VectorAdd {
    fn descriptor(&self) -> &KernelDescriptor {
        &self.descriptor
    }

    fn instructions(&self, config: &EncodingConfig) -> Result<String, Error> {
        let descriptor = &self.descriptor;
        let schema = descriptor
            .schema
            .as_ref()
            .ok_or_else(|| Error::UnknownArgumentSlot("a".to_string()))?;
        let mut trace = Trace::new(&descriptor.name, descriptor.launch.kernel_id);
        trace
            .section("KERNELBODY")
            .push("vsetvli 0, 0, e32, m1, 0")
            .load_argument("x1", config, schema, "a")?
            .load_argument("x2", config, schema, "b")?
            .load_argument("x3", config, schema, "c")?;
        trace
            .push("add x1, x1, OFFSET")
            .push("add x2, x2, OFFSET")
            .push("add x3, x3, OFFSET")
            .push("vle32.v v1, (x1)")
            .push("vle32.v v2, (x2)")
            .push("vfadd.vv v2, v1, v2")
            .push("vse32.v v2, (x3)");
        Ok(trace.finish())
    }

    fn input_map(&self, _device: usize) -> Result<MemoryRegionMap, Error> {
        MemoryRegionMap::new()
            .with_region(INPUT_A_ADDR, TypedBuffer::new("a", self.a.clone()))?
            .with_region(INPUT_B_ADDR, TypedBuffer::new("b", self.b.clone()))
    }

    fn output_map(&self, device: usize) -> Result<MemoryRegionMap, Error> {
        self.input_map(device)?
            .with_region(OUTPUT_ADDR, TypedBuffer::new("c", self.reference()))
    }
}
