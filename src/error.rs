use super::address;

/// Structural errors raised while building or encoding kernel descriptors.
///
/// Generation is deterministic, none of these are worth retrying.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("element type {0} has no memory map type tag")]
    UnsupportedType(String),

    #[error("partition arity mismatch: {reason}")]
    PartitionArityMismatch { reason: String },

    #[error("malformed argument list: {reason}")]
    MalformedArgumentList { reason: String },

    #[error("no argument slot named {0:?}")]
    UnknownArgumentSlot(String),

    #[error("kernel {name} is already replicated or partitioned")]
    AlreadyExpanded { name: String },

    #[error("replication needs at least one replica")]
    EmptyReplication,

    #[error("{offsets} argument offsets given for {arguments} arguments")]
    ReplicaOffsetArity { arguments: usize, offsets: usize },

    #[error("{count} {kind} arguments exceed the launch limit of {limit}")]
    TooManyArguments {
        kind: &'static str,
        count: usize,
        limit: usize,
    },

    #[error("scratchpad of {size:#x} bytes plus {argument_bytes:#x} argument bytes exceeds the limit of {limit:#x}")]
    ScratchpadTooLarge {
        size: u64,
        argument_bytes: u64,
        limit: u64,
    },

    #[error("region {name:?} at {base_addr:#x} overlaps region at {existing:#x}")]
    OverlappingRegion {
        name: String,
        base_addr: address,
        existing: address,
    },

    #[error("region base {base_addr:#x} is not a non-zero multiple of the {packet_size} byte packet size")]
    MisalignedRegion { base_addr: address, packet_size: u64 },

    #[error("base address {base_addr:#x} is not mapped by any region")]
    BaseAddressUnmapped { base_addr: address },

    #[error("iteration bound {bound:#x} from {base_addr:#x} exceeds mapped regions ({covered:#x} bytes covered)")]
    IterationBoundExceedsRegion {
        base_addr: address,
        bound: u64,
        covered: u64,
    },

    #[error("invalid encoding config: {reason}")]
    InvalidConfig { reason: String },

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ndp_model::Error> for Error {
    fn from(err: ndp_model::Error) -> Self {
        match err {
            ndp_model::Error::UnsupportedType(name) => Self::UnsupportedType(name),
            ndp_model::Error::MalformedArgument { value, reason } => Self::MalformedArgumentList {
                reason: format!("{value:?}: {reason}"),
            },
            ndp_model::Error::SchemaMismatch { reason } => Self::MalformedArgumentList { reason },
            ndp_model::Error::UnknownSlot(name) => Self::UnknownArgumentSlot(name),
        }
    }
}

impl From<utils::fs::Error> for Error {
    fn from(err: utils::fs::Error) -> Self {
        Self::Io(err.into())
    }
}
