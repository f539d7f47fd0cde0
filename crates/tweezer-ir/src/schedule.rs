//! Layered programs: the output of scheduling.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::circuit::Circuit;
use crate::error::IrResult;
use crate::operation::Operation;
use crate::qubit::{Clbit, Qubit, Register};

/// Operations that execute concurrently.
///
/// Members are kept in placement order so emission is deterministic, but
/// carry no ordering among themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    operations: Vec<Operation>,
}

impl Layer {
    /// Create an empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// A layer holding one operation.
    pub fn single(op: Operation) -> Self {
        Self {
            operations: vec![op],
        }
    }

    /// Add an operation to the layer.
    pub fn push(&mut self, op: Operation) {
        self.operations.push(op);
    }

    /// Operations in placement order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the layer is empty.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Whether any member touches `qubit`.
    pub fn touches(&self, qubit: &Qubit) -> bool {
        self.operations.iter().any(|op| op.qubits().contains(qubit))
    }
}

/// A totally ordered sequence of layers together with the register layout
/// of the circuit it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    name: String,
    qregs: Vec<Register>,
    cregs: Vec<Register>,
    layers: Vec<Layer>,
}

impl Schedule {
    /// Wrap layers computed for `circuit`.
    pub fn new(circuit: &Circuit, layers: Vec<Layer>) -> Self {
        Self {
            name: circuit.name().to_string(),
            qregs: circuit.qregs().to_vec(),
            cregs: circuit.cregs().to_vec(),
            layers,
        }
    }

    /// Circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Quantum registers.
    pub fn qregs(&self) -> &[Register] {
        &self.qregs
    }

    /// Classical registers.
    pub fn cregs(&self) -> &[Register] {
        &self.cregs
    }

    /// All qubits in register order.
    pub fn qubits(&self) -> Vec<Qubit> {
        self.qregs.iter().flat_map(Register::qubits).collect()
    }

    /// All classical bits in register order.
    pub fn clbits(&self) -> Vec<Clbit> {
        self.cregs.iter().flat_map(Register::clbits).collect()
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.qregs.iter().map(|r| r.size as usize).sum()
    }

    /// Number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.cregs.iter().map(|r| r.size as usize).sum()
    }

    /// The layers, in execution order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of layers.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Total number of scheduled operations.
    pub fn num_operations(&self) -> usize {
        self.layers.iter().map(Layer::len).sum()
    }

    /// Width of the widest layer.
    pub fn max_layer_width(&self) -> usize {
        self.layers.iter().map(Layer::len).max().unwrap_or(0)
    }

    /// Average operations per layer.
    #[allow(clippy::cast_precision_loss)]
    pub fn parallelism_factor(&self) -> f64 {
        if self.layers.is_empty() {
            return 0.0;
        }
        self.num_operations() as f64 / self.layers.len() as f64
    }

    /// Operations layer by layer, each layer in placement order.
    pub fn flatten(&self) -> impl Iterator<Item = &Operation> {
        self.layers.iter().flat_map(|l| l.operations.iter())
    }

    /// Flatten into a linear circuit over the same registers.
    pub fn to_circuit(&self) -> IrResult<Circuit> {
        Circuit::from_operations(
            self.name.clone(),
            self.qregs.clone(),
            self.cregs.clone(),
            self.flatten().cloned(),
        )
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Schedule '{}':", self.name)?;
        writeln!(f, "  Layers: {}", self.num_layers())?;
        writeln!(f, "  Operations: {}", self.num_operations())?;
        writeln!(f, "  Parallelism: {:.2}x", self.parallelism_factor())?;
        for (i, layer) in self.layers.iter().enumerate() {
            let ops: Vec<String> = layer.operations.iter().map(ToString::to_string).collect();
            writeln!(f, "  [{i}] {}", ops.join(" | "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateKind;

    #[test]
    fn test_schedule_stats() {
        let circuit = Circuit::with_size("s", 2, 0);
        let q0 = Qubit::new("q", 0);
        let q1 = Qubit::new("q", 1);
        let mut first = Layer::new();
        first.push(Operation::gate(GateKind::U, vec![q0.clone()], vec![1.0, 0.0, 0.0]));
        first.push(Operation::gate(GateKind::Rz, vec![q1.clone()], vec![0.5]));
        let second = Layer::single(Operation::gate(GateKind::CZ, vec![q0.clone(), q1], vec![]));

        let schedule = Schedule::new(&circuit, vec![first, second]);
        assert_eq!(schedule.num_layers(), 2);
        assert_eq!(schedule.num_operations(), 3);
        assert_eq!(schedule.max_layer_width(), 2);
        assert!((schedule.parallelism_factor() - 1.5).abs() < 1e-12);
        assert!(schedule.layers()[0].touches(&q0));

        let flat = schedule.to_circuit().unwrap();
        assert_eq!(flat.len(), 3);
        assert_eq!(flat.operations()[2].name(), "cz");
    }
}
