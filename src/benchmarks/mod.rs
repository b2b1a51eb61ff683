//! Demonstration kernels.

pub mod reduce_scatter;
pub mod scale;
pub mod vector_add;

use crate::{config::EncodingConfig, kernel::Kernel, Error};
use ndp_model::ArgumentSchema;

/// Builder for instruction traces.
///
/// ```text
/// -kernel name = vector_add
/// -kernel id = 0
///
/// KERNELBODY:
/// vsetvli 0, 0, e32, m1, 0
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    lines: Vec<String>,
}

impl Trace {
    #[must_use]
    pub fn new(name: &str, kernel_id: u32) -> Self {
        Self {
            lines: vec![
                format!("-kernel name = {name}"),
                format!("-kernel id = {kernel_id}"),
                String::new(),
            ],
        }
    }

    /// Starts a section such as `INITIALIZER`, `KERNELBODY` or `FINALIZER`.
    pub fn section(&mut self, name: &str) -> &mut Self {
        self.lines.push(format!("{name}:"));
        self
    }

    pub fn push(&mut self, instruction: impl Into<String>) -> &mut Self {
        self.lines.push(instruction.into());
        self
    }

    /// Loads the 64 bit value of argument slot `slot` into `register`.
    pub fn load_argument(
        &mut self,
        register: &str,
        config: &EncodingConfig,
        schema: &ArgumentSchema,
        slot: &str,
    ) -> Result<&mut Self, Error> {
        let addr = config.scratchpad_addr(schema, slot)?;
        self.push(format!("li {register}, {addr}"));
        self.push(format!("ld {register}, ({register})"));
        Ok(self)
    }

    /// Loads the float32 argument slot `slot` into `float_register` via `register`.
    pub fn load_float_argument(
        &mut self,
        float_register: &str,
        register: &str,
        config: &EncodingConfig,
        schema: &ArgumentSchema,
        slot: &str,
    ) -> Result<&mut Self, Error> {
        let addr = config.scratchpad_addr(schema, slot)?;
        self.push(format!("li {register}, {addr}"));
        self.push(format!("flw {float_register}, ({register})"));
        Ok(self)
    }

    #[must_use]
    pub fn finish(&self) -> String {
        let mut trace = self.lines.join("\n");
        trace.push('\n');
        trace
    }
}

/// Deterministic input values in `[0, 1]`.
#[must_use]
pub fn sin_squared(n: usize, phase: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let angle = (i + phase) as f32;
            angle.sin() * angle.sin()
        })
        .collect()
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum Benchmark {
    VectorAdd,
    ReduceScatter,
    Scale,
}

/// Problem sizes shared by the demonstration kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Number of elements per instance.
    pub size: usize,
    pub devices: usize,
    pub replicas: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            size: 1024,
            devices: 2,
            replicas: 4,
        }
    }
}

impl Benchmark {
    pub fn build(self, options: &Options, config: &EncodingConfig) -> Result<Box<dyn Kernel>, Error> {
        let kernel: Box<dyn Kernel> = match self {
            Self::VectorAdd => Box::new(vector_add::VectorAdd::new(options.size)?),
            Self::ReduceScatter => Box::new(reduce_scatter::ReduceScatter::new(
                options.size,
                options.devices,
                config,
            )?),
            Self::Scale => Box::new(scale::Scale::new(options.size, options.replicas, 2.0)?),
        };
        Ok(kernel)
    }
}

#[cfg(test)]
mod tests {
    use super::Trace;
    use crate::{config::EncodingConfig, Error};
    use ndp_model::ArgumentSchema;
    use similar_asserts as diff;

    #[test]
    fn test_trace_builder() -> Result<(), Error> {
        let config = EncodingConfig::default();
        let schema = ArgumentSchema::new().address("x").float32("alpha");
        let mut trace = Trace::new("saxpy", 3);
        trace
            .section("KERNELBODY")
            .load_argument("x1", &config, &schema, "x")?
            .load_float_argument("f1", "x2", &config, &schema, "alpha")?;
        diff::assert_eq!(
            have: trace.finish(),
            want: indoc::indoc! {"
                -kernel name = saxpy
                -kernel id = 3

                KERNELBODY:
                li x1, 1152921504606846976
                ld x1, (x1)
                li x2, 1152921504606846984
                flw f1, (x2)
            "},
        );
        Ok(())
    }
}
