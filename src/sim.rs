use crate::artifacts::ArtifactPaths;
use color_eyre::eyre::{self, WrapErr};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// How to reach the functional simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncSim {
    pub executable: PathBuf,
    /// Simulator `.config` file.
    pub config: PathBuf,
}

impl FuncSim {
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>, config: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            config: config.into(),
        }
    }

    /// Uses the first simulator binary found by [`utils::find_funcsim`].
    pub fn locate(config: impl Into<PathBuf>) -> eyre::Result<Self> {
        let executable = utils::find_funcsim()
            .into_iter()
            .next()
            .ok_or_else(|| eyre::eyre!("FuncSim not found, set FUNCSIM or NDPSIM_ROOT"))?;
        Ok(Self::new(executable, config))
    }

    /// Command running `kernel_name` from the artifacts in `dir`.
    #[must_use]
    pub fn command(&self, dir: impl AsRef<Path>, kernel_name: &str) -> Command {
        let paths = ArtifactPaths::new(dir, kernel_name);
        let mut cmd = Command::new(&self.executable);
        cmd.arg("--ndp_trace")
            .arg(&paths.trace)
            .arg("--memory_map")
            .arg(&paths.input_map)
            .arg("--target_map")
            .arg(&paths.output_map)
            .arg("--launch_file")
            .arg(&paths.launch)
            .arg("--config")
            .arg(&self.config);
        cmd
    }

    /// Runs the simulator on the artifacts in `dir`.
    ///
    /// The simulator compares the final memory against the target map and
    /// exits with a failure code on mismatch.
    pub fn run(&self, dir: impl AsRef<Path>, kernel_name: &str) -> eyre::Result<Output> {
        let dir = dir.as_ref();
        if !self.config.is_file() {
            eyre::bail!("simulator config {} is not a file", self.config.display());
        }
        let mut cmd = self.command(dir, kernel_name);
        log::debug!("running {:?}", cmd);

        let start = std::time::Instant::now();
        let output = cmd
            .output()
            .wrap_err_with(|| format!("failed to run {}", self.executable.display()))?;
        log::info!("{} on {} took {:?}", kernel_name, dir.display(), start.elapsed());

        if !output.status.success() {
            log::error!("{}", String::from_utf8_lossy(&output.stdout));
            log::error!("{}", String::from_utf8_lossy(&output.stderr));
            eyre::bail!(
                "FuncSim failed for {} in {} with code {:?}",
                kernel_name,
                dir.display(),
                output.status.code()
            );
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::FuncSim;
    use similar_asserts as diff;

    #[test]
    fn test_command_line() {
        let sim = FuncSim::new("build/bin/FuncSim", "config/functional_only/m2ndp.config");
        let cmd = sim.command("out/0", "vector_add");
        let args: Vec<_> = cmd
            .get_args()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect();
        diff::assert_eq!(
            have: args,
            want: vec![
                "--ndp_trace",
                "out/0/vector_add.traceg",
                "--memory_map",
                "out/0/vector_add_input.data",
                "--target_map",
                "out/0/vector_add_output.data",
                "--launch_file",
                "out/0/vector_add_launch.txt",
                "--config",
                "config/functional_only/m2ndp.config",
            ],
        );
        diff::assert_eq!(have: cmd.get_program().to_string_lossy(), want: "build/bin/FuncSim");
    }
}
