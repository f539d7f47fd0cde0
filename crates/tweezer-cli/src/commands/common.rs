//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use console::style;

use tweezer_compile::{CommutationRule, CompileStats, PipelineConfig};
use tweezer_hal::ExecutionResult;
use tweezer_ir::Circuit;
use tweezer_qasm::{emit, parse_named};

/// Commutation rule as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CommutationArg {
    Disjoint,
    Diagonal,
}

impl From<CommutationArg> for CommutationRule {
    fn from(arg: CommutationArg) -> Self {
        match arg {
            CommutationArg::Disjoint => CommutationRule::Disjoint,
            CommutationArg::Diagonal => CommutationRule::Diagonal,
        }
    }
}

/// Pipeline options. Flags override values loaded from `--config`.
#[derive(Debug, Clone, Default, Args)]
pub struct PipelineArgs {
    /// YAML file with pipeline settings
    #[arg(long)]
    pub config: Option<String>,

    /// Pack commuting operations into shared layers
    #[arg(long)]
    pub parallelize: bool,

    /// Keep loops instead of unrolling them
    #[arg(long)]
    pub no_fold: bool,

    /// Skip operand and parameter checks before lowering
    #[arg(long)]
    pub no_typeinfer: bool,

    /// Merge adjacent rz rotations after lowering
    #[arg(long)]
    pub merge_rotations: bool,

    /// Skip schedule verification
    #[arg(long)]
    pub no_verify: bool,

    /// Commutation rule used by the scheduler
    #[arg(long, value_enum)]
    pub commutation: Option<CommutationArg>,

    /// Bound on rewrite iterations
    #[arg(long)]
    pub max_iterations: Option<usize>,
}

impl PipelineArgs {
    /// Load the config file, if any, then apply command-line overrides.
    pub fn resolve(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => PipelineConfig::default(),
        };

        if self.parallelize {
            config.parallelize = true;
        }
        if self.no_fold {
            config.fold = false;
        }
        if self.no_typeinfer {
            config.typeinfer = false;
        }
        if self.merge_rotations {
            config.merge_rotations = true;
        }
        if self.no_verify {
            config.verify_schedule = false;
        }
        if let Some(rule) = self.commutation {
            config.commutation = rule.into();
        }
        if let Some(max) = self.max_iterations {
            config = config.with_max_iterations(max);
        }

        tracing::debug!(?config, "resolved pipeline configuration");
        Ok(config)
    }
}

/// Read a [`PipelineConfig`] from YAML. Missing keys keep their defaults.
pub fn load_config(path: &str) -> Result<PipelineConfig> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read config: {path}"))?;
    serde_yaml_ng::from_str(&source).with_context(|| format!("Invalid config file: {path}"))
}

/// Load a circuit from a `.qasm` file. The circuit is named after the file.
pub fn load_circuit(path: &str) -> Result<Circuit> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        anyhow::bail!("File not found: {path}");
    }

    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;
    let name = path_obj
        .file_stem()
        .map_or_else(|| "main".to_string(), |s| s.to_string_lossy().into_owned());

    parse_named(&source, &name).with_context(|| format!("Failed to parse {path}"))
}

/// Write a circuit as QASM text.
pub fn save_circuit(circuit: &Circuit, path: &str) -> Result<()> {
    let text = emit(circuit).with_context(|| format!("Failed to emit {}", circuit.name()))?;
    fs::write(path, text).with_context(|| format!("Failed to write file: {path}"))
}

/// Print compilation statistics.
pub fn print_stats(stats: &CompileStats) {
    println!(
        "  Operations: {} -> {} ({} cz)",
        stats.input_operations,
        stats.output_operations,
        style(stats.cz_count).yellow()
    );
    println!(
        "  Schedule: {} layers, widest {}, parallelism {:.2}x",
        stats.layers, stats.max_layer_width, stats.parallelism_factor
    );
}

/// Print execution results as a table.
#[allow(clippy::cast_precision_loss)]
pub fn print_results(result: &ExecutionResult) {
    println!(
        "\n{} Results ({} shots):",
        style("✓").green().bold(),
        result.shots
    );

    let sorted = result.counts.sorted();
    let total = result.counts.total_shots() as f64;

    for (bitstring, count) in sorted.iter().take(16) {
        let prob = **count as f64 / total * 100.0;
        let bar = "█".repeat((prob / 2.0).round() as usize);
        println!(
            "  {}: {:>6} ({:>5.2}%) {}",
            style(bitstring).cyan(),
            count,
            prob,
            style(bar).green()
        );
    }

    if sorted.len() > 16 {
        println!("  ... and {} more outcomes", sorted.len() - 16);
    }

    if let Some(time_ms) = result.execution_time_ms {
        println!("\n  Execution time: {} ms", style(time_ms).yellow());
    }
}
