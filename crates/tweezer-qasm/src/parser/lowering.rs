//! AST-to-Circuit lowering.
//!
//! Every gate, measurement and barrier is first built as a [`Template`];
//! at top level the template is instantiated and pushed, inside a loop it
//! becomes part of the body.

use rustc_hash::FxHashSet;
use tweezer_ir::{
    Circuit, ClbitExpr, GateKind, IndexExpr, IrError, LoopBlock, LoopBound, ParameterExpression,
    QubitExpr, Register, Template,
};

use crate::ast::{ForLoop, GateCall, Operand, Program, Statement};
use crate::error::{ParseError, ParseResult};

/// Lower a program to a circuit called `name`.
pub(super) fn lower_to_circuit(program: &Program, name: &str) -> ParseResult<Circuit> {
    let mut lowerer = Lowerer {
        circuit: Circuit::new(name),
        scope: FxHashSet::default(),
    };
    for stmt in &program.statements {
        lowerer.lower_top(stmt)?;
    }
    Ok(lowerer.circuit)
}

struct Lowerer {
    circuit: Circuit,
    /// Loop variables bound at the current nesting depth.
    scope: FxHashSet<String>,
}

impl Lowerer {
    fn lower_top(&mut self, stmt: &Statement) -> ParseResult<()> {
        match stmt {
            Statement::Include(_) => {}
            Statement::QReg { name, size } => {
                self.circuit.add_qreg(name.clone(), *size)?;
            }
            Statement::CReg { name, size } => {
                self.circuit.add_creg(name.clone(), *size)?;
            }
            Statement::For(f) => {
                let block = self.lower_loop(f)?;
                self.circuit.push_loop(block)?;
            }
            _ => {
                for template in self.lower_body(stmt)? {
                    let op = template.instantiate()?;
                    self.circuit.push(op)?;
                }
            }
        }
        Ok(())
    }

    /// Templates for one body statement. Broadcasts expand here.
    fn lower_body(&mut self, stmt: &Statement) -> ParseResult<Vec<Template>> {
        match stmt {
            Statement::Gate(call) => self.lower_gate(call),
            Statement::Measure { qubit, clbit } => {
                let qubits = self.qubit_operand(qubit)?;
                let clbits = self.clbit_operand(clbit)?;
                if qubits.len() != clbits.len() {
                    return Err(ParseError::BroadcastMismatch {
                        statement: format!("measure {qubit} -> {clbit}"),
                        sizes: vec![len_u32(&qubits), len_u32(&clbits)],
                    });
                }
                Ok(qubits
                    .into_iter()
                    .zip(clbits)
                    .map(|(qubit, clbit)| Template::Measure { qubit, clbit })
                    .collect())
            }
            Statement::Barrier(operands) => {
                let mut qubits = Vec::new();
                for operand in operands {
                    qubits.extend(self.qubit_operand(operand)?);
                }
                Ok(vec![Template::Barrier { qubits }])
            }
            Statement::For(f) => Ok(vec![Template::Loop(self.lower_loop(f)?)]),
            Statement::Include(_) | Statement::QReg { .. } | Statement::CReg { .. } => {
                Err(ParseError::UnexpectedToken {
                    line: 0,
                    expected: "gate, measure, barrier or for".into(),
                    found: "declaration inside loop".into(),
                })
            }
        }
    }

    fn lower_gate(&self, call: &GateCall) -> ParseResult<Vec<Template>> {
        let kind = GateKind::from_name(canonical_name(&call.name));
        for param in &call.params {
            self.check_param(param, &call.name)?;
        }

        let operands = call
            .operands
            .iter()
            .map(|op| Ok((op.index.is_none(), self.qubit_operand(op)?)))
            .collect::<ParseResult<Vec<_>>>()?;

        // Whole-register operands broadcast element-wise; indexed ones repeat.
        let sizes: Vec<u32> = operands
            .iter()
            .filter(|(whole, _)| *whole)
            .map(|(_, qubits)| len_u32(qubits))
            .collect();
        let width = match sizes.first() {
            None => 1,
            Some(&first) if sizes.iter().all(|s| *s == first) => first as usize,
            Some(_) => {
                let shown: Vec<String> = call.operands.iter().map(ToString::to_string).collect();
                return Err(ParseError::BroadcastMismatch {
                    statement: format!("{} {}", call.name, shown.join(", ")),
                    sizes,
                });
            }
        };

        Ok((0..width)
            .map(|i| {
                let qubits = operands
                    .iter()
                    .map(|(whole, qubits)| {
                        if *whole {
                            qubits[i].clone()
                        } else {
                            qubits[0].clone()
                        }
                    })
                    .collect();
                Template::gate(kind.clone(), qubits, call.params.clone())
            })
            .collect())
    }

    fn lower_loop(&mut self, f: &ForLoop) -> ParseResult<LoopBlock> {
        if let LoopBound::Range { start, stop, .. } = &f.bound {
            self.check_index(start)?;
            self.check_index(stop)?;
        }

        let shadowing = !self.scope.insert(f.var.clone());
        let body = f
            .body
            .iter()
            .map(|stmt| self.lower_body(stmt))
            .collect::<ParseResult<Vec<_>>>();
        if !shadowing {
            self.scope.remove(&f.var);
        }

        let body = body?.into_iter().flatten().collect();
        Ok(LoopBlock::new(f.var.clone(), f.bound.clone(), body))
    }

    fn qubit_operand(&self, operand: &Operand) -> ParseResult<Vec<QubitExpr>> {
        let reg = self.register(self.circuit.qreg(&operand.register), operand)?;
        Ok(self
            .indices(reg, operand)?
            .into_iter()
            .map(|index| QubitExpr::new(reg.name.clone(), index))
            .collect())
    }

    fn clbit_operand(&self, operand: &Operand) -> ParseResult<Vec<ClbitExpr>> {
        let reg = self.register(self.circuit.creg(&operand.register), operand)?;
        Ok(self
            .indices(reg, operand)?
            .into_iter()
            .map(|index| ClbitExpr::new(reg.name.clone(), index))
            .collect())
    }

    fn register<'a>(
        &self,
        found: Option<&'a Register>,
        operand: &Operand,
    ) -> ParseResult<&'a Register> {
        found.ok_or_else(|| ParseError::UndefinedRegister(operand.register.clone()))
    }

    fn indices(&self, reg: &Register, operand: &Operand) -> ParseResult<Vec<IndexExpr>> {
        match &operand.index {
            Some(index) => {
                self.check_index(index)?;
                Ok(vec![index.clone()])
            }
            None => Ok((0..i64::from(reg.size)).map(IndexExpr::constant).collect()),
        }
    }

    fn check_index(&self, index: &IndexExpr) -> ParseResult<()> {
        match index.vars().find(|v| !self.scope.contains(*v)) {
            Some(free) => Err(IrError::UnboundVariable(free.to_string()).into()),
            None => Ok(()),
        }
    }

    fn check_param(&self, param: &ParameterExpression, gate: &str) -> ParseResult<()> {
        let mut free: Vec<String> = param
            .symbols()
            .into_iter()
            .filter(|s| !self.scope.contains(s))
            .collect();
        free.sort();
        if let Some(name) = free.into_iter().next() {
            return Err(IrError::UnboundVariable(name).into());
        }
        if !param.is_symbolic() && !param.as_f64().is_some_and(f64::is_finite) {
            return Err(ParseError::InvalidParameter {
                gate: gate.to_string(),
                expression: param.to_string(),
            });
        }
        Ok(())
    }
}

/// Map the OpenQASM 2 built-ins `U` and `CX` onto the gate library.
fn canonical_name(name: &str) -> &str {
    match name {
        "U" => "u",
        "CX" => "cx",
        other => other,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn len_u32<T>(items: &[T]) -> u32 {
    items.len() as u32
}
