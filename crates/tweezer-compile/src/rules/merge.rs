//! Rotation merging.

use tweezer_ir::{Gate, GateKind, Operation};

use crate::error::CompileResult;
use crate::rewrite::{RewriteRule, RuleSet};

/// Rule set that merges adjacent `rz` rotations on the same qubit.
pub fn merge_ruleset() -> RuleSet {
    RuleSet::new("merge").with_rule(RewriteRule::new("merge_rz", 2, merge_rz))
}

fn merge_rz(window: &[Operation]) -> CompileResult<Option<Vec<Operation>>> {
    match window {
        [Operation::Gate(a), Operation::Gate(b)]
            if a.kind == GateKind::Rz && b.kind == GateKind::Rz && a.qubits == b.qubits =>
        {
            let angle = a.params.iter().chain(&b.params).sum::<f64>();
            Ok(Some(vec![Operation::Gate(Gate::new(
                GateKind::Rz,
                a.qubits.clone(),
                vec![angle],
            ))]))
        }
        _ => Ok(None),
    }
}
