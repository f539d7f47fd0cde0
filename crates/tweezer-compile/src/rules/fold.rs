//! Loop unrolling.
//!
//! `unroll_loop` replaces a loop whose bounds are compile-time integers with
//! one copy of its body per iteration, the loop variable substituted in
//! every index and angle. Nested loops come back out as loops with the
//! outer variable bound and are unrolled when the engine rescans them.

use tweezer_ir::{IrError, LoopBlock, LoopBound, Operation};

use crate::error::{CompileError, CompileResult};
use crate::rewrite::{RewriteRule, RuleSet};

/// Upper bound on iterations of a single loop.
pub const MAX_UNROLL: usize = 1 << 20;

/// Rule set containing only `unroll_loop`.
pub fn fold_ruleset() -> RuleSet {
    RuleSet::new("fold").with_rule(RewriteRule::new("unroll_loop", 1, unroll_loop))
}

fn unroll_loop(window: &[Operation]) -> CompileResult<Option<Vec<Operation>>> {
    let Some(Operation::Loop(block)) = window.first() else {
        return Ok(None);
    };
    unroll(block).map(Some)
}

/// Unroll one level of a loop block.
pub fn unroll(block: &LoopBlock) -> CompileResult<Vec<Operation>> {
    let values = iteration_values(block)?;
    let mut out = Vec::with_capacity(values.len() * block.body.len());
    for value in values {
        for template in &block.body {
            let op = template
                .bind(&block.var, value)
                .and_then(|t| t.instantiate())
                .map_err(|e| match e {
                    IrError::UnboundVariable(var) => CompileError::UnboundedLoop {
                        reason: format!("'{var}' is not bound inside the loop over '{}'", block.var),
                        var,
                    },
                    IrError::IndexOverflow(expr) => CompileError::UnboundedLoop {
                        var: block.var.clone(),
                        reason: format!("index {expr} overflows"),
                    },
                    other => CompileError::Ir(other),
                })?;
            out.push(op);
        }
    }
    Ok(out)
}

/// The values the loop variable takes, in order.
pub fn iteration_values(block: &LoopBlock) -> CompileResult<Vec<i64>> {
    let unbounded = |reason: String| CompileError::UnboundedLoop {
        var: block.var.clone(),
        reason,
    };

    let (start, stop, step) = match &block.bound {
        LoopBound::Symbolic(name) => {
            return Err(unbounded(format!(
                "bound '{name}' is not known at compile time"
            )));
        }
        LoopBound::Range { start, stop, step } => (start, stop, *step),
    };
    let start = start
        .as_constant()
        .ok_or_else(|| unbounded(format!("start {start} is not a constant")))?;
    let stop = stop
        .as_constant()
        .ok_or_else(|| unbounded(format!("stop {stop} is not a constant")))?;
    if step == 0 {
        return Err(unbounded("step is zero".to_string()));
    }

    // Widened so that extreme bounds cannot overflow.
    let (start_w, stop_w) = (i128::from(start), i128::from(stop));
    let span = if step > 0 { stop_w - start_w } else { start_w - stop_w };
    let count = if span <= 0 {
        0
    } else {
        span.unsigned_abs().div_ceil(u128::from(step.unsigned_abs()))
    };
    if count > MAX_UNROLL as u128 {
        return Err(unbounded(format!(
            "{count} iterations exceed the unroll limit of {MAX_UNROLL}"
        )));
    }

    // Every value lies in the half-open range, so the walk never overflows.
    #[allow(clippy::cast_possible_truncation)]
    let values = std::iter::successors(Some(start), |v| v.checked_add(step))
        .take(count as usize)
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::fixpoint;
    use tweezer_ir::{
        Circuit, GateKind, IndexExpr, ParameterExpression, QubitExpr, Template,
    };

    fn h_on(index: IndexExpr) -> Template {
        Template::gate(GateKind::H, vec![QubitExpr::new("q", index)], Vec::new())
    }

    #[test]
    fn test_iteration_values() {
        let block = LoopBlock::new("i", LoopBound::range(0, 4), Vec::new());
        assert_eq!(iteration_values(&block).unwrap(), vec![0, 1, 2, 3]);

        let stepped = LoopBlock::new(
            "i",
            LoopBound::Range {
                start: 5.into(),
                stop: 0.into(),
                step: -2,
            },
            Vec::new(),
        );
        assert_eq!(iteration_values(&stepped).unwrap(), vec![5, 3, 1]);

        let empty = LoopBlock::new("i", LoopBound::range(3, 3), Vec::new());
        assert!(iteration_values(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_symbolic_bound_is_unbounded() {
        let block = LoopBlock::new("i", LoopBound::Symbolic("n".into()), Vec::new());
        let err = iteration_values(&block).unwrap_err();
        assert!(matches!(err, CompileError::UnboundedLoop { ref var, .. } if var == "i"));

        let open = LoopBlock::new("i", LoopBound::range(0, IndexExpr::var("n")), Vec::new());
        assert!(matches!(
            iteration_values(&open).unwrap_err(),
            CompileError::UnboundedLoop { .. }
        ));
    }

    #[test]
    fn test_zero_step_is_unbounded() {
        let block = LoopBlock::new(
            "i",
            LoopBound::Range {
                start: 0.into(),
                stop: 4.into(),
                step: 0,
            },
            Vec::new(),
        );
        assert!(matches!(
            iteration_values(&block).unwrap_err(),
            CompileError::UnboundedLoop { .. }
        ));
    }

    #[test]
    fn test_extreme_bounds_are_unbounded_not_a_panic() {
        let full = LoopBlock::new("i", LoopBound::range(i64::MIN, i64::MAX), Vec::new());
        let err = iteration_values(&full).unwrap_err();
        assert!(matches!(err, CompileError::UnboundedLoop { ref var, .. } if var == "i"));

        let reversed = LoopBlock::new(
            "i",
            LoopBound::Range {
                start: i64::MAX.into(),
                stop: i64::MIN.into(),
                step: -1,
            },
            Vec::new(),
        );
        assert!(matches!(
            iteration_values(&reversed).unwrap_err(),
            CompileError::UnboundedLoop { .. }
        ));

        // Wide stride over the whole range: four values, no overflow.
        let sparse = LoopBlock::new(
            "i",
            LoopBound::Range {
                start: i64::MIN.into(),
                stop: i64::MAX.into(),
                step: 1 << 62,
            },
            Vec::new(),
        );
        assert_eq!(
            iteration_values(&sparse).unwrap(),
            vec![i64::MIN, -(1 << 62), 0, 1 << 62]
        );
    }

    #[test]
    fn test_overflowing_body_index_is_unbounded() {
        let body = vec![h_on(IndexExpr::var("i").scaled(i64::MAX) + 1)];
        let block = LoopBlock::new("i", LoopBound::range(0, 2), body);
        let err = unroll(&block).unwrap_err();
        assert!(matches!(err, CompileError::UnboundedLoop { ref var, .. } if var == "i"));
    }

    #[test]
    fn test_unroll_binds_indices_and_angles() {
        let body = vec![Template::gate(
            GateKind::Rz,
            vec![QubitExpr::new("q", IndexExpr::var("i"))],
            vec![ParameterExpression::symbol("i") * ParameterExpression::constant(0.5)],
        )];
        let block = LoopBlock::new("i", LoopBound::range(0, 3), body);
        let ops = unroll(&block).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[2].to_string(), "rz(1) q[2]");
    }

    #[test]
    fn test_nested_loops_fold_completely() {
        let inner = LoopBlock::new(
            "k",
            LoopBound::range(IndexExpr::var("j") + 1, 3),
            vec![h_on(IndexExpr::var("k"))],
        );
        let outer = LoopBlock::new("j", LoopBound::range(0, 3), vec![Template::Loop(inner)]);
        let mut circuit = Circuit::with_size("nested", 3, 0);
        circuit.push_loop(outer).unwrap();

        let folded = fixpoint(&circuit, &fold_ruleset()).unwrap().circuit;
        assert!(!folded.has_loops());
        // j=0: k=1,2; j=1: k=2; j=2: none
        let targets: Vec<u32> = folded.iter().map(|op| op.qubits()[0].index).collect();
        assert_eq!(targets, vec![1, 2, 2]);
    }

    #[test]
    fn test_out_of_range_unroll_is_unknown_resource() {
        let block = LoopBlock::new("i", LoopBound::range(0, 2), vec![h_on(IndexExpr::var("i") + 1)]);
        let mut circuit = Circuit::with_size("c", 2, 0);
        circuit.push_loop(block).unwrap();

        let err = fixpoint(&circuit, &fold_ruleset()).unwrap_err();
        assert!(err.is_unknown_resource());
    }

    #[test]
    fn test_looped_qft_unrolls_to_flat_qft() {
        for n in 1..=5 {
            let flat = Circuit::qft(n).unwrap();
            let looped = Circuit::qft_looped(n).unwrap();
            let folded = fixpoint(&looped, &fold_ruleset()).unwrap().circuit;
            assert_eq!(folded.operations(), flat.operations(), "n = {n}");
        }
    }
}
