//! Parallelization scheduler.
//!
//! Groups a loop-free circuit into [`Layer`]s of operations that may run at
//! the same time. The parallel mode is a single greedy forward pass:
//!
//! ```text
//!   for each operation:
//!     floor  = max barrier fence over its qubits
//!     L      = latest layer touching any of its resources
//!     join L         if L >= floor and it commutes with all of L
//!     else place at  max(L + 1, floor), appending a layer if needed
//! ```
//!
//! Placed operations never move, so per-qubit program order is kept.
//! Barriers raise the fence of their qubits and are not placed.

mod commutation;
mod verify;

pub use commutation::{commutes, disjoint};
pub use verify::verify_schedule;

use rustc_hash::FxHashMap;
use tracing::{debug, instrument, trace};

use tweezer_ir::{Circuit, Layer, Operation, Qubit, Resource, Schedule};

use crate::config::{CommutationRule, PipelineConfig};
use crate::error::{CompileError, CompileResult};

/// Scheduler settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Pack operations into shared layers. Off means one operation per layer.
    pub parallelize: bool,
    /// Which operations may share a layer.
    pub commutation: CommutationRule,
}

impl SchedulerConfig {
    /// Parallel scheduling with the given commutation rule.
    pub fn parallel(commutation: CommutationRule) -> Self {
        Self {
            parallelize: true,
            commutation,
        }
    }
}

impl From<&PipelineConfig> for SchedulerConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            parallelize: config.parallelize,
            commutation: config.commutation,
        }
    }
}

/// Schedule a loop-free circuit.
#[instrument(skip(circuit, config), fields(circuit = %circuit.name(), parallelize = config.parallelize))]
pub fn schedule(circuit: &Circuit, config: &SchedulerConfig) -> CompileResult<Schedule> {
    if let Some(Operation::Loop(block)) = circuit.iter().find(|op| op.is_loop()) {
        return Err(CompileError::UnfoldedLoop {
            var: block.var.clone(),
        });
    }

    let layers = if config.parallelize {
        parallel_layers(circuit, config.commutation)
    } else {
        circuit.iter().cloned().map(Layer::single).collect()
    };

    let schedule = Schedule::new(circuit, layers);
    debug!(
        "Scheduled {} ops into {} layers (parallelism {:.2})",
        schedule.num_operations(),
        schedule.num_layers(),
        schedule.parallelism_factor()
    );
    Ok(schedule)
}

fn parallel_layers(circuit: &Circuit, rule: CommutationRule) -> Vec<Layer> {
    let mut layers: Vec<Layer> = Vec::new();
    let mut latest: FxHashMap<Resource, usize> = FxHashMap::default();
    let mut fence: FxHashMap<Qubit, usize> = FxHashMap::default();

    for op in circuit.iter() {
        if let Operation::Barrier { qubits } = op {
            for q in qubits {
                fence.insert(q.clone(), layers.len());
            }
            continue;
        }

        let floor = op
            .qubits()
            .iter()
            .filter_map(|q| fence.get(q))
            .max()
            .copied()
            .unwrap_or(0);
        let conflict = op.resources().filter_map(|r| latest.get(&r).copied()).max();

        let target = match conflict {
            Some(l)
                if l >= floor
                    && layers[l]
                        .operations()
                        .iter()
                        .all(|other| commutes(other, op, rule)) =>
            {
                l
            }
            Some(l) => (l + 1).max(floor),
            None => floor,
        };

        if target == layers.len() {
            layers.push(Layer::new());
        }
        trace!("{} -> layer {}", op, target);
        layers[target].push(op.clone());
        for r in op.resources() {
            latest.insert(r, target);
        }
    }

    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use tweezer_ir::{Clbit, LoopBlock, LoopBound};

    fn q(i: u32) -> Qubit {
        Qubit::new("q", i)
    }

    fn widths(schedule: &Schedule) -> Vec<usize> {
        schedule.layers().iter().map(Layer::len).collect()
    }

    #[test]
    fn test_pass_through_keeps_one_op_per_layer() {
        let mut circuit = Circuit::with_size("c", 2, 0);
        circuit
            .h(q(0))
            .unwrap()
            .barrier_all()
            .unwrap()
            .h(q(1))
            .unwrap();

        let schedule = schedule(&circuit, &SchedulerConfig::default()).unwrap();
        assert_eq!(widths(&schedule), vec![1, 1, 1]);
        assert!(schedule.layers()[1].operations()[0].is_barrier());
    }

    #[test]
    fn test_disjoint_ops_share_layers() {
        let mut circuit = Circuit::with_size("c", 4, 0);
        for i in 0..4 {
            circuit.u(0.1, 0.2, 0.3, q(i)).unwrap();
        }
        circuit.cz(q(0), q(1)).unwrap().cz(q(2), q(3)).unwrap();

        let schedule =
            schedule(&circuit, &SchedulerConfig::parallel(CommutationRule::Disjoint)).unwrap();
        assert_eq!(widths(&schedule), vec![4, 2]);
        assert!((schedule.parallelism_factor() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_barrier_fences_later_ops() {
        let mut circuit = Circuit::with_size("c", 2, 0);
        circuit
            .rz(0.1, q(0))
            .unwrap()
            .barrier(vec![q(0), q(1)])
            .unwrap()
            .rz(0.2, q(1))
            .unwrap();

        let schedule =
            schedule(&circuit, &SchedulerConfig::parallel(CommutationRule::Disjoint)).unwrap();
        assert_eq!(widths(&schedule), vec![1, 1]);
        assert_eq!(schedule.layers()[1].operations()[0].qubits(), &[q(1)]);
    }

    #[test]
    fn test_diagonal_rule_packs_phase_gates() {
        let mut circuit = Circuit::with_size("c", 3, 0);
        circuit
            .cz(q(0), q(1))
            .unwrap()
            .cz(q(1), q(2))
            .unwrap()
            .rz(0.5, q(1))
            .unwrap();

        let disjoint =
            schedule(&circuit, &SchedulerConfig::parallel(CommutationRule::Disjoint)).unwrap();
        assert_eq!(disjoint.num_layers(), 3);

        let diagonal =
            schedule(&circuit, &SchedulerConfig::parallel(CommutationRule::Diagonal)).unwrap();
        assert_eq!(diagonal.num_layers(), 1);
        verify_schedule(&diagonal, &circuit, CommutationRule::Diagonal).unwrap();
    }

    #[test]
    fn test_measurements_share_clbits_serially() {
        let mut circuit = Circuit::with_size("c", 2, 1);
        circuit
            .measure(q(0), Clbit::new("c", 0))
            .unwrap()
            .measure(q(1), Clbit::new("c", 0))
            .unwrap();

        let schedule =
            schedule(&circuit, &SchedulerConfig::parallel(CommutationRule::Diagonal)).unwrap();
        assert_eq!(schedule.num_layers(), 2);
    }

    #[test]
    fn test_loops_must_be_folded() {
        let mut circuit = Circuit::with_size("c", 2, 0);
        circuit
            .push_loop(LoopBlock::new("i", LoopBound::range(0, 2), vec![]))
            .unwrap();
        let err = schedule(&circuit, &SchedulerConfig::default()).unwrap_err();
        assert_eq!(err, CompileError::UnfoldedLoop { var: "i".into() });
    }

    #[test]
    fn test_empty_circuit() {
        let circuit = Circuit::with_size("c", 2, 0);
        let schedule =
            schedule(&circuit, &SchedulerConfig::parallel(CommutationRule::Disjoint)).unwrap();
        assert_eq!(schedule.num_layers(), 0);
        assert_eq!(schedule.parallelism_factor(), 0.0);
    }
}
