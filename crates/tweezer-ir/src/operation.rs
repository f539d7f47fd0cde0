//! Operations, loop blocks and loop-body templates.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, GateKind, TemplateGate};
use crate::index::{ClbitExpr, IndexExpr, QubitExpr};
use crate::parameter::ParameterExpression;
use crate::qubit::{Clbit, Qubit};

/// Something an operation occupies while it runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    /// A qubit.
    Qubit(Qubit),
    /// A classical bit.
    Clbit(Clbit),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Qubit(q) => write!(f, "{q}"),
            Resource::Clbit(c) => write!(f, "{c}"),
        }
    }
}

/// A single step of a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// A gate application.
    Gate(Gate),
    /// Measurement of one qubit into one classical bit.
    Measure {
        /// Measured qubit.
        qubit: Qubit,
        /// Destination bit.
        clbit: Clbit,
    },
    /// Ordering fence over a set of qubits.
    Barrier {
        /// Fenced qubits.
        qubits: Vec<Qubit>,
    },
    /// A block repeated over an iteration variable.
    Loop(LoopBlock),
}

impl Operation {
    /// Create a gate operation.
    pub fn gate(kind: GateKind, qubits: Vec<Qubit>, params: Vec<f64>) -> Self {
        Operation::Gate(Gate::new(kind, qubits, params))
    }

    /// Create a measurement.
    pub fn measure(qubit: Qubit, clbit: Clbit) -> Self {
        Operation::Measure { qubit, clbit }
    }

    /// Create a barrier.
    pub fn barrier(qubits: Vec<Qubit>) -> Self {
        Operation::Barrier { qubits }
    }

    /// Short name of the operation.
    pub fn name(&self) -> &str {
        match self {
            Operation::Gate(g) => g.name(),
            Operation::Measure { .. } => "measure",
            Operation::Barrier { .. } => "barrier",
            Operation::Loop(_) => "for",
        }
    }

    /// Qubits the operation touches directly. Loops report none.
    pub fn qubits(&self) -> &[Qubit] {
        match self {
            Operation::Gate(g) => &g.qubits,
            Operation::Measure { qubit, .. } => std::slice::from_ref(qubit),
            Operation::Barrier { qubits } => qubits,
            Operation::Loop(_) => &[],
        }
    }

    /// Classical bits the operation writes.
    pub fn clbits(&self) -> &[Clbit] {
        match self {
            Operation::Measure { clbit, .. } => std::slice::from_ref(clbit),
            _ => &[],
        }
    }

    /// Qubits and classical bits, in that order.
    pub fn resources(&self) -> impl Iterator<Item = Resource> + '_ {
        self.qubits()
            .iter()
            .cloned()
            .map(Resource::Qubit)
            .chain(self.clbits().iter().cloned().map(Resource::Clbit))
    }

    /// Returns the gate if this is a gate operation.
    pub fn as_gate(&self) -> Option<&Gate> {
        match self {
            Operation::Gate(g) => Some(g),
            _ => None,
        }
    }

    /// Whether this is a gate.
    pub fn is_gate(&self) -> bool {
        matches!(self, Operation::Gate(_))
    }

    /// Whether this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self, Operation::Measure { .. })
    }

    /// Whether this is a barrier.
    pub fn is_barrier(&self) -> bool {
        matches!(self, Operation::Barrier { .. })
    }

    /// Whether this is a loop block.
    pub fn is_loop(&self) -> bool {
        matches!(self, Operation::Loop(_))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Gate(g) => write!(f, "{g}"),
            Operation::Measure { qubit, clbit } => write!(f, "measure {qubit} -> {clbit}"),
            Operation::Barrier { qubits } => {
                let qs: Vec<String> = qubits.iter().map(ToString::to_string).collect();
                write!(f, "barrier {}", qs.join(", "))
            }
            Operation::Loop(block) => write!(f, "{block}"),
        }
    }
}

/// Iteration range of a loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoopBound {
    /// Half-open range `start..stop` walked with `step`.
    Range {
        /// First value.
        start: IndexExpr,
        /// Exclusive end.
        stop: IndexExpr,
        /// Increment, may be negative.
        step: i64,
    },
    /// A bound only known at run time.
    Symbolic(String),
}

impl LoopBound {
    /// `start..stop` with step 1.
    pub fn range(start: impl Into<IndexExpr>, stop: impl Into<IndexExpr>) -> Self {
        LoopBound::Range {
            start: start.into(),
            stop: stop.into(),
            step: 1,
        }
    }

    /// Substitute a variable in both ends.
    pub fn bind(&self, name: &str, value: i64) -> IrResult<Self> {
        Ok(match self {
            LoopBound::Range { start, stop, step } => LoopBound::Range {
                start: start.bind(name, value)?,
                stop: stop.bind(name, value)?,
                step: *step,
            },
            LoopBound::Symbolic(s) => LoopBound::Symbolic(s.clone()),
        })
    }
}

impl fmt::Display for LoopBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopBound::Range { start, stop, step } if *step == 1 => write!(f, "[{start}:{stop}]"),
            LoopBound::Range { start, stop, step } => write!(f, "[{start}:{step}:{stop}]"),
            LoopBound::Symbolic(s) => write!(f, "{s}"),
        }
    }
}

/// A block of templates repeated once per value of `var`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopBlock {
    /// Iteration variable.
    pub var: String,
    /// Iteration range.
    pub bound: LoopBound,
    /// Body, in program order.
    pub body: Vec<Template>,
}

impl LoopBlock {
    /// Create a loop block.
    pub fn new(var: impl Into<String>, bound: LoopBound, body: Vec<Template>) -> Self {
        Self {
            var: var.into(),
            bound,
            body,
        }
    }

    /// Substitute an enclosing variable. The loop's own variable shadows it.
    pub fn bind(&self, name: &str, value: i64) -> IrResult<Self> {
        let bound = self.bound.bind(name, value)?;
        let body = if name == self.var {
            self.body.clone()
        } else {
            self.body
                .iter()
                .map(|t| t.bind(name, value))
                .collect::<IrResult<_>>()?
        };
        Ok(Self {
            var: self.var.clone(),
            bound,
            body,
        })
    }

    /// Every qubit and classical reference in the body, nested loops included.
    pub fn references(&self) -> Vec<TemplateRef<'_>> {
        let mut out = Vec::new();
        collect_refs(&self.body, &mut out);
        out
    }

    /// Total template count, nested bodies included.
    pub fn template_count(&self) -> usize {
        self.body
            .iter()
            .map(|t| match t {
                Template::Loop(inner) => 1 + inner.template_count(),
                _ => 1,
            })
            .sum()
    }
}

impl fmt::Display for LoopBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "for {} in {} {{ {} ops }}",
            self.var,
            self.bound,
            self.template_count()
        )
    }
}

/// A reference made from inside a loop body.
#[derive(Debug, Clone, Copy)]
pub enum TemplateRef<'a> {
    /// A qubit reference.
    Qubit(&'a QubitExpr),
    /// A classical bit reference.
    Clbit(&'a ClbitExpr),
}

fn collect_refs<'a>(body: &'a [Template], out: &mut Vec<TemplateRef<'a>>) {
    for t in body {
        match t {
            Template::Gate(g) => out.extend(g.qubits.iter().map(TemplateRef::Qubit)),
            Template::Measure { qubit, clbit } => {
                out.push(TemplateRef::Qubit(qubit));
                out.push(TemplateRef::Clbit(clbit));
            }
            Template::Barrier { qubits } => out.extend(qubits.iter().map(TemplateRef::Qubit)),
            Template::Loop(inner) => collect_refs(&inner.body, out),
        }
    }
}

/// An operation inside a loop body, with symbolic indices and angles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Template {
    /// A gate application.
    Gate(TemplateGate),
    /// Measurement.
    Measure {
        /// Measured qubit.
        qubit: QubitExpr,
        /// Destination bit.
        clbit: ClbitExpr,
    },
    /// Ordering fence.
    Barrier {
        /// Fenced qubits.
        qubits: Vec<QubitExpr>,
    },
    /// A nested loop.
    Loop(LoopBlock),
}

impl Template {
    /// Create a gate template.
    pub fn gate(
        kind: GateKind,
        qubits: Vec<QubitExpr>,
        params: Vec<ParameterExpression>,
    ) -> Self {
        Template::Gate(Gate::new(kind, qubits, params))
    }

    /// Short name of the template.
    pub fn name(&self) -> &str {
        match self {
            Template::Gate(g) => g.name(),
            Template::Measure { .. } => "measure",
            Template::Barrier { .. } => "barrier",
            Template::Loop(_) => "for",
        }
    }

    /// Substitute a loop variable everywhere in the template.
    pub fn bind(&self, name: &str, value: i64) -> IrResult<Self> {
        #[allow(clippy::cast_precision_loss)]
        let fvalue = value as f64;
        Ok(match self {
            Template::Gate(g) => Template::Gate(Gate::new(
                g.kind.clone(),
                g.qubits
                    .iter()
                    .map(|q| q.bind(name, value))
                    .collect::<IrResult<_>>()?,
                g.params.iter().map(|p| p.bind(name, fvalue)).collect(),
            )),
            Template::Measure { qubit, clbit } => Template::Measure {
                qubit: qubit.bind(name, value)?,
                clbit: clbit.bind(name, value)?,
            },
            Template::Barrier { qubits } => Template::Barrier {
                qubits: qubits
                    .iter()
                    .map(|q| q.bind(name, value))
                    .collect::<IrResult<_>>()?,
            },
            Template::Loop(block) => Template::Loop(block.bind(name, value)?),
        })
    }

    /// Turn a fully bound template into an operation.
    ///
    /// Nested loops come back as [`Operation::Loop`]; anything else must be
    /// free of variables.
    pub fn instantiate(&self) -> IrResult<Operation> {
        match self {
            Template::Gate(g) => {
                let qubits = g
                    .qubits
                    .iter()
                    .map(QubitExpr::resolve)
                    .collect::<IrResult<Vec<_>>>()?;
                let params = g
                    .params
                    .iter()
                    .map(|p| {
                        p.as_f64().ok_or_else(|| {
                            let mut free: Vec<String> = p.symbols().into_iter().collect();
                            free.sort();
                            IrError::UnboundVariable(free.into_iter().next().unwrap_or_default())
                        })
                    })
                    .collect::<IrResult<Vec<_>>>()?;
                Ok(Operation::gate(g.kind.clone(), qubits, params))
            }
            Template::Measure { qubit, clbit } => {
                Ok(Operation::measure(qubit.resolve()?, clbit.resolve()?))
            }
            Template::Barrier { qubits } => Ok(Operation::barrier(
                qubits
                    .iter()
                    .map(QubitExpr::resolve)
                    .collect::<IrResult<Vec<_>>>()?,
            )),
            Template::Loop(block) => Ok(Operation::Loop(block.clone())),
        }
    }
}

impl From<&Operation> for Template {
    fn from(op: &Operation) -> Self {
        match op {
            Operation::Gate(g) => Template::gate(
                g.kind.clone(),
                g.qubits.iter().map(QubitExpr::from).collect(),
                g.params.iter().copied().map(ParameterExpression::from).collect(),
            ),
            Operation::Measure { qubit, clbit } => Template::Measure {
                qubit: QubitExpr::from(qubit),
                clbit: ClbitExpr::new(clbit.register.clone(), i64::from(clbit.index)),
            },
            Operation::Barrier { qubits } => Template::Barrier {
                qubits: qubits.iter().map(QubitExpr::from).collect(),
            },
            Operation::Loop(block) => Template::Loop(block.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(i: u32) -> Qubit {
        Qubit::new("q", i)
    }

    #[test]
    fn test_operation_resources() {
        let m = Operation::measure(q(1), Clbit::new("c", 1));
        let res: Vec<_> = m.resources().collect();
        assert_eq!(
            res,
            vec![
                Resource::Qubit(q(1)),
                Resource::Clbit(Clbit::new("c", 1))
            ]
        );
        let cz = Operation::gate(GateKind::CZ, vec![q(0), q(1)], vec![]);
        assert_eq!(cz.qubits().len(), 2);
        assert!(cz.clbits().is_empty());
    }

    #[test]
    fn test_operation_display() {
        let op = Operation::gate(GateKind::Rz, vec![q(2)], vec![0.25]);
        assert_eq!(op.to_string(), "rz(0.25) q[2]");
        let m = Operation::measure(q(0), Clbit::new("c", 0));
        assert_eq!(m.to_string(), "measure q[0] -> c[0]");
    }

    #[test]
    fn test_template_bind_and_instantiate() {
        let t = Template::gate(
            GateKind::CP,
            vec![
                QubitExpr::new("q", IndexExpr::var("k")),
                QubitExpr::new("q", IndexExpr::var("j")),
            ],
            vec![
                ParameterExpression::pi()
                    / ParameterExpression::constant(2.0).pow(
                        ParameterExpression::symbol("k") - ParameterExpression::symbol("j"),
                    ),
            ],
        );
        let half = t.bind("j", 0).unwrap();
        assert_eq!(half.instantiate(), Err(IrError::UnboundVariable("k".into())));

        let op = half.bind("k", 2).unwrap().instantiate().unwrap();
        let gate = op.as_gate().unwrap();
        assert_eq!(gate.qubits, vec![q(2), q(0)]);
        assert!((gate.params[0] - std::f64::consts::PI / 4.0).abs() < 1e-15);
    }

    #[test]
    fn test_loop_var_shadows_outer_binding() {
        let inner = LoopBlock::new(
            "i",
            LoopBound::range(0, 2),
            vec![Template::gate(
                GateKind::H,
                vec![QubitExpr::new("q", IndexExpr::var("i"))],
                vec![],
            )],
        );
        let bound = inner.bind("i", 5).unwrap();
        assert_eq!(bound.body, inner.body);
    }

    #[test]
    fn test_constant_params_are_bit_exact() {
        let angle = 0.1_f64 + 0.2_f64;
        let op = Operation::gate(GateKind::Rx, vec![q(0)], vec![angle]);
        let back = Template::from(&op).instantiate().unwrap();
        assert_eq!(back.as_gate().unwrap().params[0].to_bits(), angle.to_bits());
    }
}
