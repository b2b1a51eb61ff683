use super::{
    address, config::EncodingConfig, kernel::Kernel, launch::LaunchRecord,
    memory_map::MemoryRegionMap, Error,
};
use ndp_model::Argument;
use rangemap::RangeSet;

/// Addresses backed by the regions of the given maps, including row padding.
#[must_use]
pub fn mapped_ranges<'a>(
    maps: impl IntoIterator<Item = &'a MemoryRegionMap>,
    packet_size: u64,
) -> RangeSet<address> {
    let mut mapped = RangeSet::new();
    for map in maps {
        for region in map {
            let range = region.padded_range(packet_size);
            if !range.is_empty() {
                mapped.insert(range);
            }
        }
    }
    mapped
}

/// Checks that the sweep of `launch` stays within mapped memory.
///
/// Address arguments outside of mapped memory only produce a warning, kernels
/// may use them as the origin of computed addresses.
pub fn check_launch(launch: &LaunchRecord, mapped: &RangeSet<address>) -> Result<(), Error> {
    if launch.bound > 0 {
        if !mapped.contains(&launch.base_addr) {
            return Err(Error::BaseAddressUnmapped {
                base_addr: launch.base_addr,
            });
        }
        let sweep = launch.base_addr..launch.base_addr.saturating_add(launch.bound);
        if let Some(gap) = mapped.gaps(&sweep).next() {
            return Err(Error::IterationBoundExceedsRegion {
                base_addr: launch.base_addr,
                bound: launch.bound,
                covered: gap.start - launch.base_addr,
            });
        }
    }
    for (i, arg) in launch.arguments.iter().enumerate() {
        if let Argument::Address(addr) = arg {
            if !mapped.contains(addr) {
                log::warn!(
                    "kernel {}: argument {i} ({addr:#x}) is not in any mapped region",
                    launch.kernel_id
                );
            }
        }
    }
    Ok(())
}

/// Checks every instance of `kernel` against the memory maps of its device.
pub fn check_kernel(kernel: &dyn Kernel, config: &EncodingConfig) -> Result<(), Error> {
    let descriptor = kernel.descriptor();
    for (device, launches) in descriptor.device_launches().iter().enumerate() {
        let input = kernel.input_map(device)?;
        let output = kernel.output_map(device)?;
        let mapped = mapped_ranges([&input, &output], config.packet_size);
        for launch in launches {
            check_launch(launch, &mapped)?;
        }
    }
    Ok(())
}
