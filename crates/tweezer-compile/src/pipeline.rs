//! End-to-end pipeline: passes, then scheduling.

use serde::Serialize;
use tracing::{info, instrument};

use tweezer_ir::{Circuit, Schedule};

use crate::config::PipelineConfig;
use crate::error::CompileResult;
use crate::manager::PassManagerBuilder;
use crate::schedule::{SchedulerConfig, schedule, verify_schedule};

/// Summary numbers for one compilation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileStats {
    /// Operations in the input circuit, loops counted once.
    pub input_operations: usize,
    /// Operations in the lowered circuit.
    pub output_operations: usize,
    /// Native two-qubit gates in the lowered circuit.
    pub cz_count: usize,
    /// Number of layers in the schedule.
    pub layers: usize,
    /// Widest layer.
    pub max_layer_width: usize,
    /// Average operations per layer.
    pub parallelism_factor: f64,
}

/// A lowered circuit together with its schedule.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    /// The native, loop-free circuit.
    pub circuit: Circuit,
    /// Its layered schedule.
    pub schedule: Schedule,
    /// Summary numbers.
    pub stats: CompileStats,
}

/// Compile a circuit: type inference, decomposition, folding, scheduling.
///
/// The input is not modified. With `fold` disabled a looped circuit fails
/// at the scheduler with [`CompileError::UnfoldedLoop`](crate::CompileError::UnfoldedLoop).
#[instrument(skip(circuit, config), fields(circuit = %circuit.name()))]
pub fn compile(circuit: &Circuit, config: &PipelineConfig) -> CompileResult<CompiledProgram> {
    let pm = PassManagerBuilder::from_config(config).build();
    let lowered = pm.run(circuit.clone())?;

    let scheduler = SchedulerConfig::from(config);
    let schedule = schedule(&lowered, &scheduler)?;
    if config.verify_schedule {
        verify_schedule(&schedule, &lowered, config.commutation)?;
    }

    let stats = CompileStats {
        input_operations: circuit.len(),
        output_operations: lowered.len(),
        cz_count: lowered.count_ops().get("cz").copied().unwrap_or(0),
        layers: schedule.num_layers(),
        max_layer_width: schedule.max_layer_width(),
        parallelism_factor: schedule.parallelism_factor(),
    };
    info!(
        "Compiled '{}': {} -> {} ops, {} layers",
        circuit.name(),
        stats.input_operations,
        stats.output_operations,
        stats.layers
    );

    Ok(CompiledProgram {
        circuit: lowered,
        schedule,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommutationRule;
    use crate::error::CompileError;
    use tweezer_ir::{Clbit, Qubit};

    #[test]
    fn test_compile_qft_default() {
        let circuit = Circuit::qft_from_bitstring("0101", false).unwrap();
        let program = compile(&circuit, &PipelineConfig::default()).unwrap();

        assert!(
            program
                .circuit
                .iter()
                .filter_map(|op| op.as_gate())
                .all(|g| g.kind.is_native())
        );
        // Pass-through: one layer per operation.
        assert_eq!(program.stats.layers, program.circuit.len());
        assert_eq!(program.stats.cz_count, 18);
    }

    #[test]
    fn test_parallel_schedule_is_shallower() {
        let circuit = Circuit::qft_from_bitstring("0101", true).unwrap();
        let serial = compile(&circuit, &PipelineConfig::default()).unwrap();
        let parallel = compile(
            &circuit,
            &PipelineConfig::default()
                .with_parallelize(true)
                .with_commutation(CommutationRule::Diagonal),
        )
        .unwrap();

        assert_eq!(serial.circuit, parallel.circuit);
        assert!(parallel.stats.layers < serial.stats.layers);
        assert!(parallel.stats.parallelism_factor > 1.0);
    }

    #[test]
    fn test_looped_and_flat_compile_identically() {
        let config = PipelineConfig::default().with_parallelize(true);
        let flat = compile(&Circuit::qft_from_bitstring("0110", false).unwrap(), &config).unwrap();
        let looped = compile(&Circuit::qft_from_bitstring("0110", true).unwrap(), &config).unwrap();
        assert_eq!(flat.circuit.operations(), looped.circuit.operations());
        assert_eq!(flat.schedule.layers(), looped.schedule.layers());
    }

    #[test]
    fn test_fold_disabled_fails_at_scheduler() {
        let circuit = Circuit::qft_looped(3).unwrap();
        let err = compile(&circuit, &PipelineConfig::default().with_fold(false)).unwrap_err();
        assert!(matches!(err, CompileError::UnfoldedLoop { .. }));
    }

    #[test]
    fn test_unknown_resource_never_reaches_pipeline() {
        let mut circuit = Circuit::with_size("qft", 4, 4);
        let err = circuit
            .measure(Qubit::new("q", 0), Clbit::new("c", 5))
            .unwrap_err();
        assert!(CompileError::from(err).is_unknown_resource());
    }
}
