//! Run command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use tweezer_adapter_sim::SimulatorDevice;
use tweezer_compile::{CompileStats, CompiledProgram, PipelineConfig, compile};
use tweezer_hal::{Device, ExecutionResult};
use tweezer_ir::Circuit;

use super::common::{PipelineArgs, load_circuit, print_results, print_stats};

#[derive(Serialize)]
struct RunReport<'a> {
    shots: u32,
    counts: &'a tweezer_hal::Counts,
    stats: &'a CompileStats,
}

/// Execute the run command.
pub async fn execute(
    input: &str,
    shots: u32,
    seed: Option<u64>,
    json: bool,
    pipeline: &PipelineArgs,
) -> Result<()> {
    let config = pipeline.resolve()?;
    let circuit = load_circuit(input)?;

    if !json {
        println!(
            "{} Running {} on the simulator ({} shots)",
            style("→").cyan().bold(),
            style(input).green(),
            shots
        );
        println!(
            "  Loaded: {} qubits, depth {}",
            circuit.num_qubits(),
            circuit.depth()
        );
    }

    let (program, result) = compile_and_execute(&circuit, &config, shots, seed, !json).await?;

    if json {
        let report = RunReport {
            shots: result.shots,
            counts: &result.counts,
            stats: &program.stats,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_stats(&program.stats);
        print_results(&result);
    }
    Ok(())
}

/// Compile a circuit and run it on a fresh simulator.
pub(crate) async fn compile_and_execute(
    circuit: &Circuit,
    config: &PipelineConfig,
    shots: u32,
    seed: Option<u64>,
    show_progress: bool,
) -> Result<(CompiledProgram, ExecutionResult)> {
    let program = compile(circuit, config)
        .with_context(|| format!("Compilation of {} failed", circuit.name()))?;

    let device = match seed {
        Some(seed) => SimulatorDevice::new().with_seed(seed),
        None => SimulatorDevice::new(),
    };

    let validation = device.validate(&program.schedule).await?;
    if !validation.is_valid() {
        anyhow::bail!("Schedule rejected by {}: {validation}", device.name());
    }

    let spinner = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .context("invalid progress template")?,
        );
        pb.set_message(format!(
            "Executing {} layers...",
            program.schedule.num_layers()
        ));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let result = device.execute(&program.schedule, shots).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    Ok((program, result.context("Execution failed")?))
}
