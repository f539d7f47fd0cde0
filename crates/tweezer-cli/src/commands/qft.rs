//! QFT benchmark: transform a basis state and test the outcomes for
//! uniformity.

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;

use tweezer_compile::CompileStats;
use tweezer_hal::Counts;
use tweezer_ir::Circuit;

use super::common::{PipelineArgs, print_results, print_stats};
use super::run::compile_and_execute;

/// Standard normal quantile for p = 0.001.
const Z_999: f64 = 3.0902;

/// Tabulated χ² critical value for 15 degrees of freedom at p = 0.001.
const CHI_SQUARE_CRITICAL_15: f64 = 37.70;

/// Outcome of the uniformity test.
#[derive(Debug, Serialize)]
pub struct UniformityReport {
    pub bits: String,
    pub shots: u32,
    pub bins: usize,
    pub chi_square: f64,
    pub critical_value: f64,
    pub uniform: bool,
}

#[derive(Serialize)]
struct QftOutput<'a> {
    report: &'a UniformityReport,
    counts: &'a Counts,
    stats: &'a CompileStats,
}

/// Execute the qft command.
pub async fn execute(
    bits: &str,
    looped: bool,
    shots: u32,
    seed: Option<u64>,
    json: bool,
    pipeline: &PipelineArgs,
) -> Result<()> {
    let config = pipeline.resolve()?;
    let circuit = Circuit::qft_from_bitstring(bits, looped)
        .with_context(|| format!("Cannot build a QFT for '{bits}'"))?;

    if !json {
        println!(
            "{} QFT of |{}⟩ ({} form, {} shots)",
            style("→").cyan().bold(),
            style(bits).green(),
            if looped { "looped" } else { "flat" },
            shots
        );
    }

    let (program, result) = compile_and_execute(&circuit, &config, shots, seed, !json).await?;
    let report = uniformity(bits, &result.counts, shots);

    if json {
        let output = QftOutput {
            report: &report,
            counts: &result.counts,
            stats: &program.stats,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_stats(&program.stats);
    print_results(&result);
    println!(
        "\n  χ² = {:.2} over {} bins (critical {:.2} at p = 0.001)",
        report.chi_square, report.bins, report.critical_value
    );
    if report.uniform {
        println!("  {} Outcomes are uniform", style("✓").green().bold());
    } else {
        println!("  {} Outcomes are not uniform", style("✗").red().bold());
    }
    Ok(())
}

/// χ² test of `counts` against the uniform distribution over `2^n` bins.
#[allow(clippy::cast_precision_loss)]
pub fn uniformity(bits: &str, counts: &Counts, shots: u32) -> UniformityReport {
    let width = bits.len();
    let bins = 1_usize << width;
    let chi_square = chi_square_uniform(counts, width, f64::from(shots));
    let critical_value = critical_value(bins - 1);
    UniformityReport {
        bits: bits.to_string(),
        shots,
        bins,
        chi_square,
        critical_value,
        uniform: chi_square < critical_value,
    }
}

#[allow(clippy::cast_precision_loss)]
fn chi_square_uniform(counts: &Counts, width: usize, shots: f64) -> f64 {
    let bins = 1_usize << width;
    let expected = shots / bins as f64;
    (0..bins)
        .map(|i| {
            let observed = counts.get(&format!("{i:0width$b}")) as f64;
            (observed - expected).powi(2) / expected
        })
        .sum()
}

/// χ² critical value at p = 0.001, from the Wilson-Hilferty approximation
/// except where a tabulated value is known.
#[allow(clippy::cast_precision_loss)]
fn critical_value(dof: usize) -> f64 {
    if dof == 15 {
        return CHI_SQUARE_CRITICAL_15;
    }
    let k = dof.max(1) as f64;
    let h = 2.0 / (9.0 * k);
    k * (1.0 - h + Z_999 * h.sqrt()).powi(3)
}
