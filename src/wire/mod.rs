//! Text formats read by the functional simulator.
//!
//! Memory maps list typed regions as rows of one packet each:
//!
//! ```text
//! _META_
//! int64
//! _DATA_
//! 0x1000 1 2 3 4
//! 0x1020 5 6 0 0
//! ```
//!
//! Launch files hold one launch descriptor line per kernel instance.

pub mod reader;
pub mod writer;

pub use reader::{parse_launch_line, read_launch_file, read_memory_map, DecodedRegion};
pub use writer::{encode_memory_map, write_launch_file, write_memory_map, MapOptions};

pub const META_MARKER: &str = "_META_";
pub const DATA_MARKER: &str = "_DATA_";
