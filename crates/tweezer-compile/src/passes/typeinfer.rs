//! Type inference: operand and parameter checks ahead of lowering.

use rustc_hash::FxHashSet;
use tracing::debug;

use tweezer_ir::{Circuit, LoopBlock, LoopBound, Operation, Template};

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::rules::native::check_signature;

/// Analysis pass that checks every gate against its kind.
///
/// - qubit and parameter counts match the gate kind
/// - concrete angles are finite
/// - symbolic angles and indices only mention enclosing loop variables
///
/// Custom gates are left for decomposition to reject.
pub struct TypeInference;

impl Pass for TypeInference {
    fn name(&self) -> &'static str {
        "type_inference"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, circuit: Circuit) -> CompileResult<Circuit> {
        let mut checked = 0;
        for op in circuit.iter() {
            match op {
                Operation::Gate(gate) => {
                    check_signature(gate)?;
                    if let Some(value) = gate.params.iter().find(|p| !p.is_finite()) {
                        return Err(CompileError::NonFiniteParameter {
                            gate: gate.name().to_string(),
                            value: *value,
                        });
                    }
                    checked += 1;
                }
                Operation::Loop(block) => {
                    let mut scope = Vec::new();
                    checked += check_block(block, &mut scope)?;
                }
                Operation::Measure { .. } | Operation::Barrier { .. } => {}
            }
        }
        debug!("Checked {} gates", checked);
        Ok(circuit)
    }
}

fn check_block<'a>(block: &'a LoopBlock, scope: &mut Vec<&'a str>) -> CompileResult<usize> {
    if let LoopBound::Range { start, stop, .. } = &block.bound {
        for var in start.vars().chain(stop.vars()) {
            in_scope(var, scope)?;
        }
    }

    scope.push(&block.var);
    let mut checked = 0;
    for template in &block.body {
        match template {
            Template::Gate(gate) => {
                check_signature(gate)?;
                for q in &gate.qubits {
                    for var in q.index.vars() {
                        in_scope(var, scope)?;
                    }
                }
                let mut symbols = FxHashSet::default();
                for p in &gate.params {
                    symbols.extend(p.symbols());
                    if let Some(value) = p.as_f64().filter(|v| !v.is_finite()) {
                        return Err(CompileError::NonFiniteParameter {
                            gate: gate.name().to_string(),
                            value,
                        });
                    }
                }
                for var in &symbols {
                    in_scope(var, scope)?;
                }
                checked += 1;
            }
            Template::Measure { qubit, clbit } => {
                for var in qubit.index.vars().chain(clbit.index.vars()) {
                    in_scope(var, scope)?;
                }
            }
            Template::Barrier { qubits } => {
                for var in qubits.iter().flat_map(|q| q.index.vars()) {
                    in_scope(var, scope)?;
                }
            }
            Template::Loop(inner) => checked += check_block(inner, scope)?,
        }
    }
    scope.pop();
    Ok(checked)
}

fn in_scope(var: &str, scope: &[&str]) -> CompileResult<()> {
    if scope.contains(&var) {
        Ok(())
    } else {
        Err(tweezer_ir::IrError::UnboundVariable(var.to_string()).into())
    }
}
