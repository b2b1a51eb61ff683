use crate::{
    config::EncodingConfig,
    memory_map::MemoryRegionMap,
    wire::{encode_memory_map, read_memory_map, MapOptions},
    Error,
};
use color_eyre::eyre;
use ndp_model::{ElementType, TypedBuffer};
use similar_asserts as diff;
use strum::IntoEnumIterator;

fn decode(map: &str, config: &EncodingConfig) -> eyre::Result<Vec<(Option<u64>, Vec<f64>)>> {
    let regions = read_memory_map(map.as_bytes(), config, MapOptions::default())?;
    Ok(regions
        .into_iter()
        .map(|region| (region.base_addr, region.buffer.to_f64_vec()))
        .collect())
}

#[test]
fn every_tagged_type_reads_back_padded() -> eyre::Result<()> {
    super::init_logging();
    let config = EncodingConfig::default();
    let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0];
    for element_type in ElementType::iter().filter(|ty| ty.wire_tag().is_some()) {
        let buffer = TypedBuffer::cast("values", element_type, &values);
        let map = MemoryRegionMap::new().with_region(0x2000, buffer)?;
        let encoded = encode_memory_map(&map, &config, MapOptions::default())?;

        let per_row = config.packet_size as usize / element_type.size();
        let mut want = values.to_vec();
        want.resize(values.len().div_ceil(per_row) * per_row, 0.0);

        let decoded = decode(&encoded, &config)?;
        diff::assert_eq!(
            have: decoded,
            want: vec![(Some(0x2000), want)],
            "{element_type}",
        );
    }
    Ok(())
}

#[test]
fn int64_rows_follow_packet_size() -> eyre::Result<()> {
    let config = EncodingConfig::default();
    let map = MemoryRegionMap::new().with_region(
        0x100_0000_0000_0000,
        TypedBuffer::new("a", (0..10i64).map(|i| i * 100).collect()),
    )?;
    let encoded = encode_memory_map(&map, &config, MapOptions::default())?;
    let rows: Vec<_> = encoded.lines().skip(3).collect();
    diff::assert_eq!(
        have: rows,
        want: vec![
            "0x100000000000000 0 100 200 300",
            "0x100000000000020 400 500 600 700",
            "0x100000000000040 800 900 0 0",
        ],
    );
    Ok(())
}

#[test]
fn fill_value_is_cast_to_the_element_type() -> eyre::Result<()> {
    let config = EncodingConfig::default();
    let map = MemoryRegionMap::new().with_region(0x40, TypedBuffer::new("a", vec![1i16, 2, 3]))?;
    let options = MapOptions::default().fill(-1.5);
    let encoded = encode_memory_map(&map, &config, options)?;
    let regions = read_memory_map(encoded.as_bytes(), &config, options)?;
    let mut want = vec![1i16, 2, 3];
    want.resize(16, -1);
    diff::assert_eq!(have: regions[0].buffer.as_slice::<i16>(), want: Some(want.as_slice()));
    Ok(())
}

#[test]
fn empty_buffer_reads_back_empty() -> eyre::Result<()> {
    let config = EncodingConfig::default();
    let map = MemoryRegionMap::new()
        .with_region(0x1000, TypedBuffer::new::<f32>("empty", vec![]))?
        .with_region(0x1000, TypedBuffer::new("a", vec![1.5f32]))?;
    let encoded = encode_memory_map(&map, &config, MapOptions::default())?;
    diff::assert_eq!(
        have: decode(&encoded, &config)?,
        want: vec![
            (None, vec![]),
            (Some(0x1000), vec![1.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
        ],
    );
    Ok(())
}

#[test]
fn untagged_types_are_rejected() -> eyre::Result<()> {
    let config = EncodingConfig::default();
    for element_type in ElementType::iter().filter(|ty| ty.wire_tag().is_none()) {
        let map = MemoryRegionMap::new()
            .with_region(0x1000, TypedBuffer::zeros("a", element_type, 4))?;
        let err = encode_memory_map(&map, &config, MapOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)), "{element_type}: {err}");
    }
    Ok(())
}

#[test]
fn wider_packets_hold_more_elements() -> eyre::Result<()> {
    let config = EncodingConfig::default().with_packet_size(64);
    let map = MemoryRegionMap::new().with_region(0x40, TypedBuffer::new("a", vec![7i32; 20]))?;
    let encoded = encode_memory_map(&map, &config, MapOptions::default())?;
    diff::assert_eq!(have: encoded.lines().count(), want: 3 + 2);
    let decoded = decode(&encoded, &config)?;
    diff::assert_eq!(have: decoded[0].1.len(), want: 32);
    Ok(())
}
