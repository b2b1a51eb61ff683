use crate::{
    artifacts::{self, ArtifactPaths},
    benchmarks::{self, Benchmark},
    config::EncodingConfig,
    kernel::{Kernel, KernelDescriptor},
    launch::LaunchRecord,
    memory_map::MemoryRegionMap,
    wire::{read_launch_file, read_memory_map, MapOptions},
    Error,
};
use color_eyre::eyre;
use ndp_model::{Argument, TypedBuffer};
use similar_asserts as diff;
use strum::IntoEnumIterator;

/// Kernel sweeping `bound` bytes over a single 256 byte region.
struct Sweep {
    descriptor: KernelDescriptor,
}

impl Sweep {
    fn new(base_addr: u64, bound: u64) -> Self {
        let launch = LaunchRecord::new(0, base_addr, bound).arguments([Argument::Address(0x9000)]);
        Self {
            descriptor: KernelDescriptor::new("sweep", launch),
        }
    }
}

impl Kernel for Sweep {
    fn descriptor(&self) -> &KernelDescriptor {
        &self.descriptor
    }

    fn instructions(&self, _config: &EncodingConfig) -> Result<String, Error> {
        Ok("KERNELBODY:\n".to_string())
    }

    fn input_map(&self, _device: usize) -> Result<MemoryRegionMap, Error> {
        MemoryRegionMap::new().with_region(0x1000, TypedBuffer::new("in", vec![0u8; 256]))
    }

    fn output_map(&self, device: usize) -> Result<MemoryRegionMap, Error> {
        self.input_map(device)
    }
}

#[test]
fn every_benchmark_generates() -> eyre::Result<()> {
    super::init_logging();
    let config = EncodingConfig::default();
    let options = benchmarks::Options {
        size: 64,
        devices: 3,
        replicas: 2,
    };
    for benchmark in Benchmark::iter() {
        let kernel = benchmark.build(&options, &config)?;
        let generated = artifacts::generate(&*kernel, &config)?;
        let want_devices = if benchmark == Benchmark::ReduceScatter { 3 } else { 1 };
        diff::assert_eq!(have: generated.devices.len(), want: want_devices, "{benchmark}");
        assert!(generated.trace.contains("KERNELBODY:"), "{benchmark}");
    }
    Ok(())
}

#[test]
fn artifacts_are_written_per_device() -> eyre::Result<()> {
    let config = EncodingConfig::default();
    let options = benchmarks::Options {
        size: 16,
        devices: 2,
        replicas: 1,
    };
    let kernel = Benchmark::ReduceScatter.build(&options, &config)?;
    let generated = artifacts::generate(&*kernel, &config)?;

    let dir = tempfile::tempdir()?;
    let dirs = generated.write(dir.path())?;
    diff::assert_eq!(have: dirs, want: vec![dir.path().join("0"), dir.path().join("1")]);

    for (device, device_dir) in dirs.iter().enumerate() {
        let paths = ArtifactPaths::new(device_dir, "reduce_scatter");
        diff::assert_eq!(have: std::fs::read_to_string(&paths.kernels_list)?, want: "reduce_scatter");
        diff::assert_eq!(have: std::fs::read_to_string(&paths.trace)?, want: generated.trace.clone());

        let launches = read_launch_file(utils::fs::open_readable(&paths.launch)?, None)?;
        diff::assert_eq!(have: launches, want: kernel.descriptor().device_launches()[device].clone());

        let output = read_memory_map(
            utils::fs::open_readable(&paths.output_map)?,
            &config,
            MapOptions::default(),
        )?;
        let want: Vec<f64> = kernel
            .output_map(device)?
            .iter()
            .last()
            .map(|region| region.buffer.to_f64_vec())
            .unwrap_or_default();
        diff::assert_eq!(have: output.last().map(|region| region.buffer.to_f64_vec()), want: Some(want));
    }
    Ok(())
}

#[test]
fn sweeps_must_stay_in_mapped_memory() -> eyre::Result<()> {
    let config = EncodingConfig::default();
    artifacts::generate(&Sweep::new(0x1000, 0x100), &config)?;
    artifacts::generate(&Sweep::new(0x1080, 0x80), &config)?;

    let err = artifacts::generate(&Sweep::new(0x1000, 0x120), &config).unwrap_err();
    assert!(
        matches!(err, Error::IterationBoundExceedsRegion { covered: 0x100, .. }),
        "{err}"
    );
    let err = artifacts::generate(&Sweep::new(0x2000, 0x20), &config).unwrap_err();
    assert!(matches!(err, Error::BaseAddressUnmapped { base_addr: 0x2000 }), "{err}");
    Ok(())
}

#[test]
fn invalid_config_is_rejected_before_generation() {
    let config = EncodingConfig::default().with_packet_size(24);
    let err = artifacts::generate(&Sweep::new(0x1000, 0x100), &config).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { .. }), "{err}");
}

#[cfg(feature = "local-sim")]
#[test]
fn functional_simulator_accepts_generated_inputs() -> eyre::Result<()> {
    super::init_logging();
    let sim_config = std::env::var("FUNCSIM_CONFIG")
        .map_err(|_| eyre::eyre!("FUNCSIM_CONFIG must point to a simulator config"))?;
    let sim = crate::sim::FuncSim::locate(sim_config)?;
    let config = EncodingConfig::default();
    let kernel = Benchmark::VectorAdd.build(&benchmarks::Options::default(), &config)?;
    let generated = artifacts::generate(&*kernel, &config)?;
    let dir = tempfile::tempdir()?;
    for device_dir in generated.write(dir.path())? {
        sim.run(&device_dir, &generated.kernel_name)?;
    }
    Ok(())
}
