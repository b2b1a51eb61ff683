use super::{address, config::EncodingConfig, Error};
use ndp_model::{Argument, SLOT_BYTES};
use serde::{Deserialize, Serialize};

/// Token announcing the start of the float32 arguments.
pub const FP32_MARKER: &str = "FP32";

/// Launch parameters of one kernel instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRecord {
    /// Whether the host waits for completion before the next launch.
    pub sync: bool,
    pub kernel_id: u32,
    /// Start of the address range the kernel is launched over.
    pub base_addr: address,
    /// Number of bytes swept from `base_addr`.
    pub bound: u64,
    /// Scratchpad bytes used by the kernel body, excluding the arguments.
    pub scratchpad_size: u64,
    pub arguments: Vec<Argument>,
}

impl LaunchRecord {
    #[must_use]
    pub fn new(kernel_id: u32, base_addr: address, bound: u64) -> Self {
        Self {
            sync: false,
            kernel_id,
            base_addr,
            bound,
            scratchpad_size: 0,
            arguments: Vec::new(),
        }
    }

    #[must_use]
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    #[must_use]
    pub fn scratchpad_size(mut self, scratchpad_size: u64) -> Self {
        self.scratchpad_size = scratchpad_size;
        self
    }

    #[must_use]
    pub fn arguments(mut self, arguments: impl IntoIterator<Item = Argument>) -> Self {
        self.arguments = arguments.into_iter().collect();
        self
    }

    /// Bytes occupied by the arguments in the scratchpad.
    #[must_use]
    pub fn argument_bytes(&self) -> u64 {
        self.arguments.len() as u64 * SLOT_BYTES
    }

    /// Scratchpad size announced to the simulator.
    ///
    /// Saturates, [`LaunchRecord::check_limits`] rejects sizes that overflow.
    #[must_use]
    pub fn total_scratchpad_size(&self) -> u64 {
        self.scratchpad_size.saturating_add(self.argument_bytes())
    }

    /// Position of the `FP32` marker, i.e. the index of the first float argument.
    #[must_use]
    pub fn float_marker_position(&self) -> Option<usize> {
        self.arguments.iter().position(Argument::is_float)
    }

    /// Checks the argument list against the simulator launch limits.
    pub fn check_limits(&self, config: &EncodingConfig) -> Result<(), Error> {
        let num_floats = self.arguments.iter().filter(|arg| arg.is_float()).count();
        if self.arguments.len() > config.max_int_args {
            return Err(Error::TooManyArguments {
                kind: "total",
                count: self.arguments.len(),
                limit: config.max_int_args,
            });
        }
        if num_floats > config.max_float_args {
            return Err(Error::TooManyArguments {
                kind: "float32",
                count: num_floats,
                limit: config.max_float_args,
            });
        }
        // the simulator cannot read `NaN` or `inf` tokens
        if let Some((i, arg)) = self
            .arguments
            .iter()
            .enumerate()
            .find(|(_, arg)| matches!(arg, Argument::Float32(value) if !value.is_finite()))
        {
            return Err(Error::MalformedArgumentList {
                reason: format!("argument {i} ({arg:?}) is not a finite float32"),
            });
        }
        let argument_bytes = self.argument_bytes();
        let too_large = || Error::ScratchpadTooLarge {
            size: self.scratchpad_size,
            argument_bytes,
            limit: config.scratchpad_max_size,
        };
        let total = self
            .scratchpad_size
            .checked_add(argument_bytes)
            .ok_or_else(too_large)?;
        if total > config.scratchpad_max_size {
            return Err(too_large());
        }
        if let Some(first_float) = self.float_marker_position() {
            if self.arguments[first_float..].iter().any(|arg| !arg.is_float()) {
                log::warn!(
                    "kernel {}: integer argument after the {} marker will be read as a float",
                    self.kernel_id,
                    FP32_MARKER,
                );
            }
        }
        Ok(())
    }

    /// Renders the record as one launch descriptor line (without newline).
    pub fn encode(&self, config: &EncodingConfig) -> Result<String, Error> {
        self.check_limits(config)?;
        Ok(self.to_string())
    }
}

/// The launch line format:
///
/// `sync kernel_id 0x<base> 0x<bound> 0x<scratchpad> 0x<argument bytes> [args..]`
///
/// The simulator reads every fixed field as hexadecimal.
impl std::fmt::Display for LaunchRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {:x} {:#x} {:#x} {:#x} {:#x}",
            u8::from(self.sync),
            self.kernel_id,
            self.base_addr,
            self.bound,
            self.total_scratchpad_size(),
            self.argument_bytes(),
        )?;
        let marker = self.float_marker_position();
        for (i, arg) in self.arguments.iter().enumerate() {
            if marker == Some(i) {
                write!(f, " {FP32_MARKER}")?;
            }
            match arg {
                Argument::Address(addr) => write!(f, " {addr:#x}")?,
                Argument::Scalar(value) => write!(f, " {value:#x}")?,
                Argument::Float32(value) => write!(f, " {value:?}")?,
            }
        }
        Ok(())
    }
}
