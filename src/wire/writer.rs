use super::{DATA_MARKER, META_MARKER};
use crate::{
    address, config::EncodingConfig, interleave::pad_to_multiple, launch::LaunchRecord,
    memory_map::MemoryRegionMap, Error,
};
use itertools::Itertools;
use ndp_model::{BufferVisitor, Element, Wire};
use std::io::Write;

/// Per call overrides of the memory map encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapOptions {
    /// Row width in bytes, defaults to the configured packet size.
    pub packet_size: Option<u64>,
    /// Value padding the last row of every region, cast to the element type.
    pub fill: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            packet_size: None,
            fill: 0.0,
        }
    }
}

impl MapOptions {
    #[must_use]
    pub fn packet_size(mut self, packet_size: u64) -> Self {
        self.packet_size = Some(packet_size);
        self
    }

    #[must_use]
    pub fn fill(mut self, fill: f64) -> Self {
        self.fill = fill;
        self
    }
}

struct Rows<'a, W> {
    writer: &'a mut W,
    base_addr: address,
    packet_size: u64,
    fill: f64,
}

impl<W: Write> BufferVisitor for Rows<'_, W> {
    type Output = std::io::Result<()>;

    fn visit<T: Element>(self, values: &[T]) -> Self::Output {
        let per_row = (self.packet_size as usize) / T::TYPE.size();
        let padding = pad_to_multiple(values.len(), per_row) - values.len();
        let padded = values
            .iter()
            .copied()
            .chain(std::iter::repeat(T::from_f64(self.fill)).take(padding))
            .collect_vec();
        for (row, chunk) in padded.chunks(per_row).enumerate() {
            write!(
                self.writer,
                "{:#x}",
                self.base_addr + row as u64 * self.packet_size
            )?;
            for value in chunk {
                write!(self.writer, " {}", Wire(*value))?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }
}

/// Writes `map` in region order.
///
/// Every region is validated before the first byte is written, so a failing
/// map produces no output.
pub fn write_memory_map(
    map: &MemoryRegionMap,
    config: &EncodingConfig,
    options: MapOptions,
    mut writer: impl Write,
) -> Result<(), Error> {
    let packet_size = options.packet_size.unwrap_or(config.packet_size);
    if !packet_size.is_power_of_two() {
        return Err(Error::InvalidConfig {
            reason: format!("packet size {packet_size} is not a power of two"),
        });
    }

    let mut tags = Vec::with_capacity(map.len());
    for region in map {
        let element_type = region.buffer.element_type();
        let tag = element_type
            .wire_tag()
            .ok_or_else(|| Error::UnsupportedType(element_type.to_string()))?;
        if element_type.size() as u64 > packet_size {
            return Err(Error::InvalidConfig {
                reason: format!(
                    "{element_type} elements do not fit a {packet_size} byte packet"
                ),
            });
        }
        if region.base_addr == 0 || region.base_addr % packet_size != 0 {
            return Err(Error::MisalignedRegion {
                base_addr: region.base_addr,
                packet_size,
            });
        }
        tags.push(tag);
    }

    for (region, tag) in map.iter().zip(tags) {
        log::trace!("encoding {region} as {tag}");
        writeln!(writer, "{META_MARKER}")?;
        writeln!(writer, "{tag}")?;
        writeln!(writer, "{DATA_MARKER}")?;
        region.buffer.data().visit(Rows {
            writer: &mut writer,
            base_addr: region.base_addr,
            packet_size,
            fill: options.fill,
        })?;
    }
    Ok(())
}

/// Encodes `map` into the memory map text format.
pub fn encode_memory_map(
    map: &MemoryRegionMap,
    config: &EncodingConfig,
    options: MapOptions,
) -> Result<String, Error> {
    let mut out = Vec::new();
    write_memory_map(map, config, options, &mut out)?;
    String::from_utf8(out).map_err(|err| Error::Io(std::io::Error::other(err)))
}

/// Writes one launch line per record.
///
/// Lines are separated, not terminated, by newlines.
pub fn write_launch_file<'a>(
    records: impl IntoIterator<Item = &'a LaunchRecord>,
    config: &EncodingConfig,
    mut writer: impl Write,
) -> Result<(), Error> {
    let lines = records
        .into_iter()
        .map(|record| record.encode(config))
        .collect::<Result<Vec<_>, _>>()?;
    write!(writer, "{}", lines.join("\n"))?;
    Ok(())
}
