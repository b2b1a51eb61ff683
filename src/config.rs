use super::{address, Error};
use ndp_model::{ArgumentSchema, SLOT_BYTES};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PACKET_SIZE: u64 = 32;
pub const SCRATCHPAD_BASE: address = 0x1000_0000_0000_0000;
pub const SCRATCHPAD_MAX_SIZE: u64 = 0x0100_0000_0000_0000;
pub const DEFAULT_NUM_NDP_UNITS: usize = 32;
pub const DEFAULT_STRIDE: u64 = 256;
pub const MAX_INT_ARGS: usize = 61;
pub const MAX_FLOAT_ARGS: usize = 3;

/// Encoding parameters shared by every encoder entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// Width of one memory map row in bytes.
    pub packet_size: u64,
    /// Address of the scratchpad holding launch arguments.
    pub scratchpad_base: address,
    pub scratchpad_max_size: u64,
    /// Number of NDP units the address space is interleaved across.
    pub num_ndp_units: usize,
    /// Interleaving granularity in bytes.
    pub stride: u64,
    pub max_int_args: usize,
    pub max_float_args: usize,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            packet_size: DEFAULT_PACKET_SIZE,
            scratchpad_base: SCRATCHPAD_BASE,
            scratchpad_max_size: SCRATCHPAD_MAX_SIZE,
            num_ndp_units: DEFAULT_NUM_NDP_UNITS,
            stride: DEFAULT_STRIDE,
            max_int_args: MAX_INT_ARGS,
            max_float_args: MAX_FLOAT_ARGS,
        }
    }
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidConfig {
        reason: reason.into(),
    }
}

impl EncodingConfig {
    #[must_use]
    pub fn with_packet_size(mut self, packet_size: u64) -> Self {
        self.packet_size = packet_size;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !self.packet_size.is_power_of_two() {
            return Err(invalid(format!(
                "packet size {} is not a power of two",
                self.packet_size
            )));
        }
        // stripes are selected with log2(stride) bit masks
        if !self.stride.is_power_of_two() || self.stride < self.packet_size {
            return Err(invalid(format!(
                "stride {} is not a power of two of at least the packet size {}",
                self.stride, self.packet_size
            )));
        }
        if self.num_ndp_units == 0 {
            return Err(invalid("need at least one ndp unit"));
        }
        Ok(())
    }

    /// Scratchpad address of the `index`-th launch argument.
    #[must_use]
    pub fn argument_addr(&self, index: usize) -> address {
        self.scratchpad_base + index as u64 * SLOT_BYTES
    }

    /// Scratchpad address of the argument slot `name`.
    pub fn scratchpad_addr(&self, schema: &ArgumentSchema, name: &str) -> Result<address, Error> {
        Ok(self.scratchpad_base + schema.offset(name)?)
    }

    pub fn from_yaml(config: &str) -> Result<Self, Error> {
        let config: Self = serde_yaml::from_str(config).map_err(|err| invalid(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let reader = utils::fs::open_readable(path.as_ref())?;
        let config: Self = serde_yaml::from_reader(reader).map_err(|err| {
            invalid(format!("{}: {err}", path.as_ref().display()))
        })?;
        config.validate()?;
        Ok(config)
    }
}

static ARGUMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    let key = r"([A-Za-z_][\w\-]*)";
    let value_excluding_comment = r"([^#\n]*[^#\s])";
    let trailing_comment = r"(?:\s*#.*)?";
    let pattern = [
        r"^[ \t]*",
        key,
        r"[ \t]*[ \t=][ \t]*",
        value_excluding_comment,
        trailing_comment,
    ];
    regex::RegexBuilder::new(&pattern.join(""))
        .multi_line(true)
        .build()
        .unwrap()
});

/// Extracts the `key = value` (or `key value`) pairs of a simulator config file.
pub fn extract_arguments(config: &str) -> impl Iterator<Item = (&str, &str)> + '_ {
    ARGUMENT_REGEX.captures_iter(config).filter_map(|cap| {
        let key = cap.get(1)?.as_str().trim();
        let value = cap.get(2)?.as_str().trim();
        Some((key, value))
    })
}

/// Encoding parameters read from a simulator config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorConfig {
    pub encoding: EncodingConfig,
    /// Entries that do not affect encoding.
    pub unknown: Vec<(String, String)>,
}

impl SimulatorConfig {
    pub fn from_config_str(config: impl AsRef<str>) -> Result<Self, Error> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, Error> {
            value
                .parse()
                .map_err(|_| invalid(format!("bad value {value:?} for {key}")))
        }

        let mut encoding = EncodingConfig::default();
        let mut unknown = Vec::new();
        for (key, value) in extract_arguments(config.as_ref()) {
            match key {
                "packet_size" => encoding.packet_size = parse(key, value)?,
                "num_ndp_units" => encoding.num_ndp_units = parse(key, value)?,
                _ => unknown.push((key.to_string(), value.to_string())),
            }
        }
        encoding.validate()?;
        log::debug!(
            "simulator config: packet size {}, {} ndp units ({} other entries)",
            encoding.packet_size,
            encoding.num_ndp_units,
            unknown.len()
        );
        Ok(Self { encoding, unknown })
    }
}

#[cfg(test)]
mod tests {
    use super::{EncodingConfig, SimulatorConfig};
    use crate::Error;
    use ndp_model::ArgumentSchema;
    use similar_asserts as diff;

    #[test]
    fn test_default_is_valid() -> Result<(), Error> {
        let config = EncodingConfig::default();
        config.validate()?;
        diff::assert_eq!(have: config.packet_size, want: 32);
        diff::assert_eq!(have: config.argument_addr(2), want: 0x1000_0000_0000_0010);
        Ok(())
    }

    #[test]
    fn test_validate_rejects_bad_packet_size() {
        let config = EncodingConfig::default().with_packet_size(48);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig { .. })));

        let config = EncodingConfig {
            stride: 48,
            ..EncodingConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_validate_requires_power_of_two_stride() -> Result<(), Error> {
        for stride in [0, 16, 96, 768] {
            let config = EncodingConfig {
                stride,
                ..EncodingConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfig { .. })),
                "stride {stride}"
            );
        }
        for stride in [32, 256, 4096] {
            EncodingConfig {
                stride,
                ..EncodingConfig::default()
            }
            .validate()?;
        }
        Ok(())
    }

    #[test]
    fn test_scratchpad_addr() -> Result<(), Error> {
        let config = EncodingConfig::default();
        let schema = ArgumentSchema::new().address("a").address("b").address("c");
        diff::assert_eq!(
            have: config.scratchpad_addr(&schema, "c")?,
            want: config.scratchpad_base + 16,
        );
        assert!(matches!(
            config.scratchpad_addr(&schema, "d"),
            Err(Error::UnknownArgumentSlot(_))
        ));
        Ok(())
    }

    #[test]
    fn test_from_yaml_fills_defaults() -> Result<(), Error> {
        let config = EncodingConfig::from_yaml("packet_size: 64\nnum_ndp_units: 8\n")?;
        diff::assert_eq!(
            have: config,
            want: EncodingConfig {
                packet_size: 64,
                num_ndp_units: 8,
                ..EncodingConfig::default()
            },
        );
        Ok(())
    }

    #[test]
    fn test_extract_arguments() {
        let config = indoc::indoc! {"
            # functional simulation only
            num_ndp_units = 16
            packet_size 64 # bytes
            functional_sim    1

            ramulator_config = ramulator/hbm.cfg
        "};
        let arguments: Vec<_> = super::extract_arguments(config).collect();
        diff::assert_eq!(
            have: arguments,
            want: vec![
                ("num_ndp_units", "16"),
                ("packet_size", "64"),
                ("functional_sim", "1"),
                ("ramulator_config", "ramulator/hbm.cfg"),
            ],
        );
    }

    #[test]
    fn test_simulator_config() -> Result<(), Error> {
        let config = SimulatorConfig::from_config_str("num_ndp_units 4\nspad_size 4096\n")?;
        diff::assert_eq!(have: config.encoding.num_ndp_units, want: 4);
        diff::assert_eq!(have: config.encoding.packet_size, want: 32);
        diff::assert_eq!(
            have: config.unknown,
            want: vec![("spad_size".to_string(), "4096".to_string())],
        );

        assert!(matches!(
            SimulatorConfig::from_config_str("packet_size abc"),
            Err(Error::InvalidConfig { .. })
        ));
        Ok(())
    }
}
