use super::{
    config::EncodingConfig,
    kernel::Kernel,
    layout,
    wire::{encode_memory_map, MapOptions},
    Error,
};
use color_eyre::eyre::{self, WrapErr};
use std::path::{Path, PathBuf};

pub const KERNELS_LIST: &str = "kernelslist.g";

/// Simulator inputs of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceArtifacts {
    pub device: usize,
    pub input_map: String,
    pub output_map: String,
    pub launch: String,
}

/// Everything the functional simulator reads for one kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub kernel_name: String,
    /// Instruction trace shared by all devices.
    pub trace: String,
    pub devices: Vec<DeviceArtifacts>,
}

/// File names of the artifacts of `kernel_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub trace: PathBuf,
    pub input_map: PathBuf,
    pub output_map: PathBuf,
    pub launch: PathBuf,
    pub kernels_list: PathBuf,
}

impl ArtifactPaths {
    #[must_use]
    pub fn new(dir: impl AsRef<Path>, kernel_name: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            trace: dir.join(format!("{kernel_name}.traceg")),
            input_map: dir.join(format!("{kernel_name}_input.data")),
            output_map: dir.join(format!("{kernel_name}_output.data")),
            launch: dir.join(format!("{kernel_name}_launch.txt")),
            kernels_list: dir.join(KERNELS_LIST),
        }
    }
}

/// Directory holding the artifacts of `device`.
#[must_use]
pub fn device_dir(dir: impl AsRef<Path>, device: usize) -> PathBuf {
    dir.as_ref().join(device.to_string())
}

/// Builds and checks the simulator inputs of `kernel`.
///
/// Fails without producing anything if any device fails to encode.
#[tracing::instrument(skip_all, fields(kernel = %kernel.descriptor().name))]
pub fn generate(kernel: &dyn Kernel, config: &EncodingConfig) -> Result<Artifacts, Error> {
    config.validate()?;
    let descriptor = kernel.descriptor();
    layout::check_kernel(kernel, config)?;
    if let Some(packets) = config.min_packets_per_unit(descriptor.launch.bound) {
        log::debug!(
            "{}: every active ndp unit sweeps at least {packets} packet(s)",
            descriptor.name
        );
    }

    let trace = kernel.instructions(config)?;
    let launches = kernel.launch_descriptors(config)?;
    let devices = launches
        .into_iter()
        .enumerate()
        .map(|(device, launch)| {
            let input_map = encode_memory_map(&kernel.input_map(device)?, config, MapOptions::default())?;
            let output_map = encode_memory_map(&kernel.output_map(device)?, config, MapOptions::default())?;
            Ok(DeviceArtifacts {
                device,
                input_map,
                output_map,
                launch,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    log::debug!(
        "generated {} for {} device(s)",
        descriptor.name,
        devices.len()
    );
    Ok(Artifacts {
        kernel_name: descriptor.name.clone(),
        trace,
        devices,
    })
}

impl Artifacts {
    /// Writes the artifacts of every device to `<dir>/<device>/`.
    pub fn write(&self, dir: impl AsRef<Path>) -> eyre::Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut device_dirs = Vec::with_capacity(self.devices.len());
        for device in &self.devices {
            let device_dir = device_dir(dir, device.device);
            utils::fs::create_dirs(&device_dir)?;
            let paths = ArtifactPaths::new(&device_dir, &self.kernel_name);
            let files = [
                (&paths.trace, self.trace.as_str()),
                (&paths.input_map, device.input_map.as_str()),
                (&paths.output_map, device.output_map.as_str()),
                (&paths.launch, device.launch.as_str()),
                (&paths.kernels_list, self.kernel_name.as_str()),
            ];
            for (path, contents) in files {
                utils::fs::write_string(path, contents)
                    .wrap_err_with(|| format!("failed to write {}", path.display()))?;
                log::trace!("wrote {}", path.display());
            }
            device_dirs.push(device_dir);
        }
        log::info!(
            "wrote {} to {}",
            self.kernel_name,
            utils::fs::normalize_path(dir).display()
        );
        Ok(device_dirs)
    }
}
