use super::{DATA_MARKER, META_MARKER, writer::MapOptions};
use crate::{
    address,
    config::EncodingConfig,
    launch::{LaunchRecord, FP32_MARKER},
    Error,
};
use ndp_model::{Argument, ArgumentSchema, Element, ElementType, TypedBuffer, SLOT_BYTES};
use itertools::Itertools;
use std::io::BufRead;

/// A region read back from a memory map.
///
/// The buffer includes the fill values padding the last row.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRegion {
    /// Address of the first row, `None` for regions without rows.
    pub base_addr: Option<address>,
    pub buffer: TypedBuffer,
}

fn parse_error(line: usize, reason: impl Into<String>) -> Error {
    Error::Parse {
        line,
        reason: reason.into(),
    }
}

fn parse_hex(token: &str) -> Option<u64> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u64::from_str_radix(digits, 16).ok()
}

fn parse_values<T: Element>(
    name: String,
    tokens: &[(usize, String)],
) -> Result<TypedBuffer, Error> {
    let values = tokens
        .iter()
        .map(|(line, token)| {
            T::parse_wire(token)
                .ok_or_else(|| parse_error(*line, format!("bad {} value {token:?}", T::TYPE)))
        })
        .collect::<Result<Vec<T>, _>>()?;
    Ok(TypedBuffer::new(name, values))
}

fn decode_buffer(
    name: String,
    element_type: ElementType,
    tokens: &[(usize, String)],
) -> Result<TypedBuffer, Error> {
    use half::f16;
    match element_type {
        ElementType::Int8 => parse_values::<i8>(name, tokens),
        ElementType::UInt8 => parse_values::<u8>(name, tokens),
        ElementType::Int16 => parse_values::<i16>(name, tokens),
        ElementType::UInt16 => parse_values::<u16>(name, tokens),
        ElementType::Int32 => parse_values::<i32>(name, tokens),
        ElementType::UInt32 => parse_values::<u32>(name, tokens),
        ElementType::Int64 => parse_values::<i64>(name, tokens),
        ElementType::UInt64 => parse_values::<u64>(name, tokens),
        ElementType::Float16 => parse_values::<f16>(name, tokens),
        ElementType::Float32 => parse_values::<f32>(name, tokens),
        ElementType::Float64 => parse_values::<f64>(name, tokens),
    }
}

#[derive(Debug)]
struct PendingRegion {
    element_type: ElementType,
    base_addr: Option<address>,
    rows: u64,
    tokens: Vec<(usize, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Meta,
    Data,
}

/// Reads a memory map with the simulator's rules.
///
/// Rows of a region must be contiguous, each holding exactly one packet of
/// elements, starting at a non-zero packet aligned address.
pub fn read_memory_map(
    reader: impl BufRead,
    config: &EncodingConfig,
    options: MapOptions,
) -> Result<Vec<DecodedRegion>, Error> {
    let packet_size = options.packet_size.unwrap_or(config.packet_size);
    if !packet_size.is_power_of_two() {
        return Err(Error::InvalidConfig {
            reason: format!("packet size {packet_size} is not a power of two"),
        });
    }
    let mut regions = Vec::new();
    let mut last_line = 0;
    let mut pending: Option<PendingRegion> = None;
    let mut tag: Option<ElementType> = None;
    let mut state = State::Start;

    let finish = |pending: PendingRegion, regions: &mut Vec<DecodedRegion>| -> Result<(), Error> {
        let name = format!("region{}", regions.len());
        let buffer = decode_buffer(name, pending.element_type, &pending.tokens)?;
        regions.push(DecodedRegion {
            base_addr: pending.base_addr,
            buffer,
        });
        Ok(())
    };

    for (i, line) in reader.lines().enumerate() {
        let line_number = i + 1;
        last_line = line_number;
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == META_MARKER {
            if let Some(done) = pending.take() {
                finish(done, &mut regions)?;
            }
            tag = None;
            state = State::Meta;
            continue;
        }
        if line == DATA_MARKER {
            if state != State::Meta {
                return Err(parse_error(line_number, "data marker without metadata"));
            }
            let element_type =
                tag.ok_or_else(|| parse_error(line_number, "missing type tag"))?;
            pending = Some(PendingRegion {
                element_type,
                base_addr: None,
                rows: 0,
                tokens: Vec::new(),
            });
            state = State::Data;
            continue;
        }
        match state {
            State::Start => {
                return Err(parse_error(line_number, "expected a metadata marker"));
            }
            State::Meta => {
                let element_type = ElementType::from_wire_tag(line).ok_or_else(|| {
                    parse_error(line_number, format!("unknown type tag {line:?}"))
                })?;
                tag = Some(element_type);
            }
            State::Data => {
                let Some(region) = pending.as_mut() else {
                    return Err(parse_error(line_number, "row outside of a region"));
                };
                let mut tokens = line.split_whitespace();
                let addr = tokens
                    .next()
                    .and_then(parse_hex)
                    .ok_or_else(|| parse_error(line_number, "bad row address"))?;
                let base_addr = *region.base_addr.get_or_insert(addr);
                if base_addr == 0 || base_addr % packet_size != 0 {
                    return Err(Error::MisalignedRegion {
                        base_addr,
                        packet_size,
                    });
                }
                let expected = base_addr + region.rows * packet_size;
                if addr != expected {
                    return Err(parse_error(
                        line_number,
                        format!("row address {addr:#x} does not follow {expected:#x}"),
                    ));
                }
                let per_row = packet_size as usize / region.element_type.size();
                let values = tokens
                    .map(|token| (line_number, token.to_string()))
                    .collect_vec();
                if values.len() != per_row {
                    return Err(parse_error(
                        line_number,
                        format!("expected {per_row} values per row, got {}", values.len()),
                    ));
                }
                region.tokens.extend(values);
                region.rows += 1;
            }
        }
    }
    if state == State::Meta {
        return Err(parse_error(last_line, "metadata without data marker"));
    }
    if let Some(done) = pending.take() {
        finish(done, &mut regions)?;
    }
    Ok(regions)
}

/// Parses one launch descriptor line.
///
/// Without a schema, integer tokens read back as addresses. Every token after
/// the `FP32` marker must be a finite float, as the simulator parses them.
pub fn parse_launch_line(
    line: &str,
    schema: Option<&ArgumentSchema>,
) -> Result<LaunchRecord, Error> {
    parse_launch_line_at(1, line, schema)
}

fn parse_launch_line_at(
    line_number: usize,
    line: &str,
    schema: Option<&ArgumentSchema>,
) -> Result<LaunchRecord, Error> {
    let mut tokens = line.split_whitespace();
    let mut field = |name: &str| -> Result<u64, Error> {
        let token = tokens
            .next()
            .ok_or_else(|| parse_error(line_number, format!("missing {name}")))?;
        parse_hex(token)
            .ok_or_else(|| parse_error(line_number, format!("bad {name} {token:?}")))
    };
    let sync = field("sync flag")? != 0;
    let kernel_id = u32::try_from(field("kernel id")?)
        .map_err(|_| parse_error(line_number, "kernel id out of range"))?;
    let base_addr = field("base address")?;
    let bound = field("iteration bound")?;
    let total_scratchpad_size = field("scratchpad size")?;
    let argument_bytes = field("argument size")?;

    let mut arguments = Vec::new();
    let mut floats = false;
    for token in tokens {
        if token == FP32_MARKER {
            if floats {
                return Err(parse_error(line_number, "repeated FP32 marker"));
            }
            floats = true;
            continue;
        }
        let arg = if floats {
            let value: f32 = token
                .parse()
                .ok()
                .filter(|value: &f32| value.is_finite())
                .ok_or_else(|| parse_error(line_number, format!("bad float {token:?}")))?;
            Argument::Float32(value)
        } else {
            let addr = parse_hex(token)
                .ok_or_else(|| parse_error(line_number, format!("bad argument {token:?}")))?;
            Argument::Address(addr)
        };
        arguments.push(arg);
    }

    if argument_bytes != arguments.len() as u64 * SLOT_BYTES {
        return Err(parse_error(
            line_number,
            format!(
                "argument size {argument_bytes:#x} does not match {} arguments",
                arguments.len()
            ),
        ));
    }
    let scratchpad_size = total_scratchpad_size
        .checked_sub(argument_bytes)
        .ok_or_else(|| parse_error(line_number, "scratchpad smaller than its arguments"))?;
    let arguments = match schema {
        Some(schema) => schema.apply(arguments)?,
        None => arguments,
    };
    Ok(LaunchRecord {
        sync,
        kernel_id,
        base_addr,
        bound,
        scratchpad_size,
        arguments,
    })
}

/// Reads every non-empty line of a launch file.
pub fn read_launch_file(
    reader: impl BufRead,
    schema: Option<&ArgumentSchema>,
) -> Result<Vec<LaunchRecord>, Error> {
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(parse_launch_line_at(i + 1, &line, schema)?);
    }
    Ok(records)
}
