#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
use std::path::PathBuf;

pub mod fs;

/// Candidate locations of the functional simulator binary.
///
/// `FUNCSIM` points directly at the binary, `NDPSIM_ROOT` at a
/// simulator checkout containing `build/bin/FuncSim`.
#[must_use]
pub fn find_funcsim() -> Vec<PathBuf> {
    let candidates = [
        std::env::var("FUNCSIM").ok().map(PathBuf::from),
        std::env::var("NDPSIM_ROOT")
            .ok()
            .map(|root| PathBuf::from(root).join("build/bin/FuncSim")),
        Some(PathBuf::from("./build/bin/FuncSim")),
        Some(PathBuf::from("/usr/local/bin/FuncSim")),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter(|path| path.is_file())
        .collect()
}
