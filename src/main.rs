use clap::{Parser, Subcommand};
use color_eyre::eyre::{self, WrapErr};
use console::style;
use itertools::Itertools;
use ndpgen::{
    artifacts,
    benchmarks::{self, Benchmark},
    config::{EncodingConfig, SimulatorConfig},
    sim::FuncSim,
    wire::{self, MapOptions},
};
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

#[derive(Debug, Subcommand)]
enum Command {
    /// Writes the simulator inputs of a benchmark
    Generate {
        benchmark: Benchmark,
        #[arg(short, long, default_value = "./out")]
        output: PathBuf,
        /// Elements per instance
        #[arg(long, default_value_t = 1024)]
        size: usize,
        #[arg(long, default_value_t = 2)]
        devices: usize,
        #[arg(long, default_value_t = 4)]
        replicas: usize,
        /// Run the functional simulator on the generated inputs
        #[arg(long)]
        run: bool,
    },
    /// Summarizes a memory map
    Map {
        path: PathBuf,
    },
    /// Decodes a launch file
    Launch {
        path: PathBuf,
    },
    /// Lists the available benchmarks
    List,
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Options {
    /// Encoding config (yaml) or simulator config file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn load_config(path: Option<&Path>) -> eyre::Result<EncodingConfig> {
    let Some(path) = path else {
        return Ok(EncodingConfig::default());
    };
    let is_yaml = matches!(
        path.extension().and_then(std::ffi::OsStr::to_str),
        Some("yaml" | "yml")
    );
    let config = if is_yaml {
        EncodingConfig::from_yaml_file(path)?
    } else {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        SimulatorConfig::from_config_str(contents)
            .wrap_err_with(|| format!("bad simulator config {}", path.display()))?
            .encoding
    };
    Ok(config)
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let options = Options::parse();
    let config = load_config(options.config.as_deref())?;
    log::debug!("{:?}", config);

    match options.command {
        Command::Generate {
            benchmark,
            output,
            size,
            devices,
            replicas,
            run,
        } => {
            let bench_options = benchmarks::Options {
                size,
                devices,
                replicas,
            };
            let kernel = benchmark.build(&bench_options, &config)?;
            let start = std::time::Instant::now();
            let generated = artifacts::generate(&*kernel, &config)
                .wrap_err_with(|| format!("failed to generate {benchmark}"))?;
            let dirs = generated.write(&output)?;
            println!(
                "generated {} for {} device(s) in {:?}",
                style(&generated.kernel_name).bold(),
                dirs.len(),
                start.elapsed()
            );

            if run {
                let sim_config = options
                    .config
                    .ok_or_else(|| eyre::eyre!("--run needs the simulator config (--config)"))?;
                let sim = FuncSim::locate(sim_config)?;
                for dir in &dirs {
                    sim.run(dir, &generated.kernel_name)?;
                    println!("{} {}", style("PASSED").green(), dir.display());
                }
            }
        }
        Command::Map { path } => {
            let reader = utils::fs::open_readable(&path)?;
            let regions = wire::read_memory_map(reader, &config, MapOptions::default())
                .wrap_err_with(|| format!("failed to read {}", path.display()))?;
            for region in &regions {
                let base = region
                    .base_addr
                    .map_or_else(|| "-".to_string(), |addr| format!("{addr:#x}"));
                println!(
                    "{:>20} {:>8} {:>10} elements ({})",
                    base,
                    region.buffer.element_type(),
                    region.buffer.len(),
                    human_bytes::human_bytes(region.buffer.byte_len() as f64),
                );
            }
        }
        Command::Launch { path } => {
            let reader = utils::fs::open_readable(&path)?;
            let records = wire::read_launch_file(reader, None)
                .wrap_err_with(|| format!("failed to read {}", path.display()))?;
            for record in &records {
                println!("{}", serde_json::to_string(record)?);
            }
        }
        Command::List => {
            println!("{}", Benchmark::iter().join("\n"));
        }
    }
    Ok(())
}
