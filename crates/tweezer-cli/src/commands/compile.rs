//! Compile command implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;

use tweezer_compile::compile;
use tweezer_qasm::emit_schedule;

use super::common::{PipelineArgs, load_circuit, print_stats, save_circuit};

/// Execute the compile command.
pub fn execute(
    input: &str,
    output: Option<&str>,
    schedule_path: Option<&str>,
    json: bool,
    pipeline: &PipelineArgs,
) -> Result<()> {
    let config = pipeline.resolve()?;
    let circuit = load_circuit(input)?;

    if !json {
        println!(
            "{} Compiling {} ({} qubits, {} operations)",
            style("→").cyan().bold(),
            style(input).green(),
            circuit.num_qubits(),
            circuit.len()
        );
    }

    let program = compile(&circuit, &config)
        .with_context(|| format!("Compilation of {} failed", circuit.name()))?;

    let output_path = output.map_or_else(|| default_output(input), PathBuf::from);
    let output_str = output_path.to_string_lossy();
    save_circuit(&program.circuit, &output_str)?;

    if let Some(path) = schedule_path {
        let text = emit_schedule(&program.schedule).context("Failed to emit schedule")?;
        fs::write(path, text).with_context(|| format!("Failed to write file: {path}"))?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&program.stats)?);
        return Ok(());
    }

    print_stats(&program.stats);
    println!(
        "\n{} Wrote {}",
        style("✓").green().bold(),
        style(&output_str).cyan()
    );
    if let Some(path) = schedule_path {
        println!("  Schedule: {}", style(path).cyan());
    }
    Ok(())
}

/// `dir/name.qasm` → `dir/name_compiled.qasm`.
fn default_output(input: &str) -> PathBuf {
    let path = Path::new(input);
    let stem = path
        .file_stem()
        .map_or_else(|| "circuit".to_string(), |s| s.to_string_lossy().into_owned());
    path.with_file_name(format!("{stem}_compiled.qasm"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_keeps_directory() {
        assert_eq!(
            default_output("circuits/qft.qasm"),
            PathBuf::from("circuits/qft_compiled.qasm")
        );
        assert_eq!(default_output("bell"), PathBuf::from("bell_compiled.qasm"));
    }

    #[test]
    fn test_compile_writes_lowered_circuit_and_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pair.qasm");
        fs::write(
            &input,
            "OPENQASM 2.0;\nqreg q[2];\ncreg c[2];\nh q;\ncx q[0], q[1];\nmeasure q -> c;\n",
        )
        .unwrap();
        let layers = dir.path().join("pair.layers.qasm");

        let pipeline = PipelineArgs {
            parallelize: true,
            ..PipelineArgs::default()
        };
        execute(
            &input.to_string_lossy(),
            None,
            Some(&layers.to_string_lossy()),
            true,
            &pipeline,
        )
        .unwrap();

        let lowered = fs::read_to_string(dir.path().join("pair_compiled.qasm")).unwrap();
        let circuit = tweezer_qasm::parse(&lowered).unwrap();
        assert!(
            circuit
                .iter()
                .filter_map(tweezer_ir::Operation::as_gate)
                .all(|g| matches!(g.name(), "u" | "rz" | "cz"))
        );

        let schedule_text = fs::read_to_string(layers).unwrap();
        assert!(schedule_text.contains("// layer 0"));
    }
}
