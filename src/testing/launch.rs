use crate::{
    config::EncodingConfig,
    kernel::KernelDescriptor,
    launch::LaunchRecord,
    partition::Partition,
    replicate::Replication,
    wire::{parse_launch_line, read_launch_file},
    Error,
};
use color_eyre::eyre;
use ndp_model::{Argument, ArgumentSchema};
use similar_asserts as diff;

#[test]
fn float_arguments_share_one_marker() -> eyre::Result<()> {
    let record = LaunchRecord::new(0, 0x1000, 0x100).arguments([
        Argument::Address(0x1000),
        Argument::Address(0x2000),
        Argument::Float32(3.5),
        Argument::Float32(4.25),
    ]);
    let line = record.encode(&EncodingConfig::default())?;
    let tokens: Vec<_> = line.split_whitespace().skip(6).collect();
    diff::assert_eq!(have: tokens, want: vec!["0x1000", "0x2000", "FP32", "3.5", "4.25"]);
    Ok(())
}

#[test]
fn replicas_shift_base_and_arguments() -> eyre::Result<()> {
    let launch = LaunchRecord::new(0, 0x8000_0000_0000, 0x1000)
        .arguments([Argument::Address(0x9000_0000_0000)]);
    let descriptor = KernelDescriptor::new("replicated", launch).replicate(
        &Replication::new(3)
            .base_offset(0x1000)
            .argument_offsets([0x2000]),
    )?;
    let encoded = descriptor.encode_launch(&EncodingConfig::default())?;
    diff::assert_eq!(have: encoded.len(), want: 1);
    diff::assert_eq!(
        have: encoded[0],
        want: indoc::indoc! {"
            0 0 0x800000000000 0x1000 0x8 0x8 0x900000000000
            0 0 0x800000001000 0x1000 0x8 0x8 0x900000002000
            0 0 0x800000002000 0x1000 0x8 0x8 0x900000004000"},
    );
    Ok(())
}

#[test]
fn single_replica_is_byte_identical() -> eyre::Result<()> {
    let config = EncodingConfig::default();
    let launch = LaunchRecord::new(2, 0x1000, 0x200)
        .scratchpad_size(0x40)
        .arguments([Argument::Address(0x3000), Argument::Float32(0.25)]);
    let single = launch.encode(&config)?;
    let replicated = KernelDescriptor::new("k", launch)
        .replicate(&Replication::new(1).base_offset(0x200).argument_offsets([0x200, 0]))?
        .encode_launch(&config)?;
    diff::assert_eq!(have: replicated, want: vec![single]);
    Ok(())
}

#[test]
fn partition_arity_mismatch_produces_nothing() {
    let launch = LaunchRecord::new(0, 0x1000, 0x100).arguments([Argument::Address(0x2000)]);
    let partition = Partition::new(
        vec![0x1000, 0x2000],
        vec![
            vec![Argument::Address(0x3000)],
            vec![Argument::Address(0x4000)],
            vec![Argument::Address(0x5000)],
        ],
    );
    let result = KernelDescriptor::new("k", launch).partition(partition, &EncodingConfig::default());
    assert!(matches!(result, Err(Error::PartitionArityMismatch { .. })));
}

#[test]
fn launch_lines_decode_to_typed_records() -> eyre::Result<()> {
    let config = EncodingConfig::default();
    let schema = ArgumentSchema::new()
        .address("src")
        .scalar("offset")
        .float32("alpha");
    let record = LaunchRecord::new(7, 0x4000, 0x800)
        .sync(true)
        .scratchpad_size(0x100)
        .arguments([
            Argument::Address(0x8000),
            Argument::Scalar(-64),
            Argument::Float32(1.0),
        ]);
    let line = record.encode(&config)?;
    diff::assert_eq!(have: parse_launch_line(&line, Some(&schema))?, want: record.clone());

    // without a schema scalars read back as raw slot values
    let untyped = parse_launch_line(&line, None)?;
    diff::assert_eq!(
        have: untyped.arguments[1],
        want: Argument::Address(-64i64 as u64),
    );
    Ok(())
}

#[test]
fn partitioned_launch_files_decode_per_device() -> eyre::Result<()> {
    let config = EncodingConfig::default();
    let launch = LaunchRecord::new(0, 0x1000, 0x100).arguments([Argument::Address(0x2000)]);
    let partition = Partition::interleaved(3, 0x1000, |device| {
        vec![Argument::Address(0x2000 + device as u64)]
    });
    let descriptor = KernelDescriptor::new("k", launch).partition(partition, &config)?;
    let files = descriptor.encode_launch(&config)?;
    diff::assert_eq!(have: files.len(), want: 3);
    for (device, file) in files.iter().enumerate() {
        let records = read_launch_file(file.as_bytes(), None)?;
        diff::assert_eq!(have: records, want: vec![descriptor.instance_launches()[device].clone()]);
    }
    Ok(())
}
