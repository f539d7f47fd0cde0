//! High-level circuit container and builder API.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::sync::OnceLock;

use crate::dag::DependencyGraph;
use crate::error::{IrError, IrResult};
use crate::gate::GateKind;
use crate::index::{IndexExpr, QubitExpr};
use crate::operation::{LoopBlock, LoopBound, Operation, Resource, Template, TemplateRef};
use crate::parameter::ParameterExpression;
use crate::qubit::{Clbit, Qubit, Register};

/// A quantum circuit: declared registers plus an ordered operation list.
///
/// Every operation is validated against the declared registers before it
/// is appended, so a `Circuit` never holds a reference to an undeclared
/// qubit or bit. Deserialization goes through the same checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "CircuitData")]
pub struct Circuit {
    name: String,
    qregs: Vec<Register>,
    cregs: Vec<Register>,
    operations: Vec<Operation>,
    /// Lazily built qubit → operation-indices map.
    #[serde(skip)]
    qubit_index: OnceLock<FxHashMap<Qubit, Vec<usize>>>,
}

/// Wire form of a [`Circuit`] before validation.
#[derive(Deserialize)]
struct CircuitData {
    name: String,
    qregs: Vec<Register>,
    cregs: Vec<Register>,
    operations: Vec<Operation>,
}

impl TryFrom<CircuitData> for Circuit {
    type Error = IrError;

    fn try_from(data: CircuitData) -> IrResult<Self> {
        Circuit::from_operations(data.name, data.qregs, data.cregs, data.operations)
    }
}

impl PartialEq for Circuit {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.qregs == other.qregs
            && self.cregs == other.cregs
            && self.operations == other.operations
    }
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a circuit with a quantum register `q` and a classical register `c`.
    ///
    /// Zero-sized registers are omitted.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        if num_qubits > 0 {
            circuit.qregs.push(Register::new("q", num_qubits));
        }
        if num_clbits > 0 {
            circuit.cregs.push(Register::new("c", num_clbits));
        }
        circuit
    }

    /// Build a circuit in one step.
    ///
    /// Either every operation validates and the circuit is returned, or
    /// the first error is returned and nothing is built.
    pub fn from_operations(
        name: impl Into<String>,
        qregs: Vec<Register>,
        cregs: Vec<Register>,
        operations: impl IntoIterator<Item = Operation>,
    ) -> IrResult<Self> {
        let mut circuit = Self::new(name);
        for reg in qregs {
            circuit.add_qreg(reg.name, reg.size)?;
        }
        for reg in cregs {
            circuit.add_creg(reg.name, reg.size)?;
        }
        for op in operations {
            circuit.push(op)?;
        }
        Ok(circuit)
    }

    /// A new circuit with the same name and registers but different operations.
    pub fn with_operations(&self, operations: impl IntoIterator<Item = Operation>) -> IrResult<Self> {
        Self::from_operations(
            self.name.clone(),
            self.qregs.clone(),
            self.cregs.clone(),
            operations,
        )
    }

    /// Declare a quantum register.
    pub fn add_qreg(&mut self, name: impl Into<String>, size: u32) -> IrResult<&mut Self> {
        let reg = self.checked_register(name.into(), size)?;
        self.qregs.push(reg);
        self.invalidate();
        Ok(self)
    }

    /// Declare a classical register.
    pub fn add_creg(&mut self, name: impl Into<String>, size: u32) -> IrResult<&mut Self> {
        let reg = self.checked_register(name.into(), size)?;
        self.cregs.push(reg);
        self.invalidate();
        Ok(self)
    }

    fn checked_register(&self, name: String, size: u32) -> IrResult<Register> {
        if size == 0 {
            return Err(IrError::EmptyRegister(name));
        }
        if self.qreg(&name).is_some() || self.creg(&name).is_some() {
            return Err(IrError::DuplicateRegister(name));
        }
        Ok(Register::new(name, size))
    }

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Quantum registers in declaration order.
    pub fn qregs(&self) -> &[Register] {
        &self.qregs
    }

    /// Classical registers in declaration order.
    pub fn cregs(&self) -> &[Register] {
        &self.cregs
    }

    /// Look up a quantum register.
    pub fn qreg(&self, name: &str) -> Option<&Register> {
        self.qregs.iter().find(|r| r.name == name)
    }

    /// Look up a classical register.
    pub fn creg(&self, name: &str) -> Option<&Register> {
        self.cregs.iter().find(|r| r.name == name)
    }

    /// All declared qubits in register order.
    pub fn qubits(&self) -> Vec<Qubit> {
        self.qregs.iter().flat_map(Register::qubits).collect()
    }

    /// All declared classical bits in register order.
    pub fn clbits(&self) -> Vec<Clbit> {
        self.cregs.iter().flat_map(Register::clbits).collect()
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.qregs.iter().map(|r| r.size as usize).sum()
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.cregs.iter().map(|r| r.size as usize).sum()
    }

    /// Whether a qubit is declared.
    pub fn has_qubit(&self, qubit: &Qubit) -> bool {
        self.qreg(&qubit.register)
            .is_some_and(|r| r.contains(qubit.index))
    }

    /// Whether a classical bit is declared.
    pub fn has_clbit(&self, clbit: &Clbit) -> bool {
        self.creg(&clbit.register)
            .is_some_and(|r| r.contains(clbit.index))
    }

    /// Position of a qubit in the flat register order.
    pub fn qubit_offset(&self, qubit: &Qubit) -> Option<usize> {
        let mut offset = 0;
        for reg in &self.qregs {
            if reg.name == qubit.register {
                return reg.contains(qubit.index).then(|| offset + qubit.index as usize);
            }
            offset += reg.size as usize;
        }
        None
    }

    /// Position of a classical bit in the flat register order.
    pub fn clbit_offset(&self, clbit: &Clbit) -> Option<usize> {
        let mut offset = 0;
        for reg in &self.cregs {
            if reg.name == clbit.register {
                return reg.contains(clbit.index).then(|| offset + clbit.index as usize);
            }
            offset += reg.size as usize;
        }
        None
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Check an operation against the declared registers.
    pub fn validate(&self, op: &Operation) -> IrResult<()> {
        let unknown = |resource: String| IrError::UnknownResource {
            resource,
            operation: Some(op.to_string()),
        };

        if let Operation::Loop(block) = op {
            return self.validate_loop(block, op);
        }

        let mut seen = FxHashSet::default();
        for q in op.qubits() {
            if !self.has_qubit(q) {
                return Err(unknown(q.to_string()));
            }
            if op.is_gate() && !seen.insert(q) {
                return Err(IrError::DuplicateQubit {
                    qubit: q.to_string(),
                    operation: Some(op.to_string()),
                });
            }
        }
        for c in op.clbits() {
            if !self.has_clbit(c) {
                return Err(unknown(c.to_string()));
            }
        }
        Ok(())
    }

    fn validate_loop(&self, block: &LoopBlock, op: &Operation) -> IrResult<()> {
        for r in block.references() {
            let (reg, shown) = match r {
                TemplateRef::Qubit(q) => (self.qreg(&q.register), (q.to_string(), &q.index)),
                TemplateRef::Clbit(c) => (self.creg(&c.register), (c.to_string(), &c.index)),
            };
            let in_range = match (reg, shown.1.as_constant()) {
                (None, _) => false,
                (Some(reg), Some(i)) => u32::try_from(i).is_ok_and(|i| reg.contains(i)),
                (Some(_), None) => true,
            };
            if !in_range {
                return Err(IrError::UnknownResource {
                    resource: shown.0,
                    operation: Some(op.to_string()),
                });
            }
        }
        Ok(())
    }

    /// Append an operation after validating it.
    ///
    /// On error the circuit is left unchanged.
    pub fn push(&mut self, op: Operation) -> IrResult<&mut Self> {
        self.validate(&op)?;
        self.operations.push(op);
        self.invalidate();
        Ok(self)
    }

    /// Append a loop block.
    pub fn push_loop(&mut self, block: LoopBlock) -> IrResult<&mut Self> {
        self.push(Operation::Loop(block))
    }

    /// Operations in program order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Iterate operations in program order.
    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    /// Consume the circuit, returning its operations.
    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    /// Number of operations at top level.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the circuit has no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Whether any top-level operation is a loop block.
    pub fn has_loops(&self) -> bool {
        self.operations.iter().any(Operation::is_loop)
    }

    /// Count operations by name.
    pub fn count_ops(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for op in &self.operations {
            *counts.entry(op.name().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Resources an operation may touch.
    ///
    /// Loop blocks conservatively claim every bit of each register their
    /// body mentions.
    pub fn footprint(&self, op: &Operation) -> Vec<Resource> {
        match op {
            Operation::Loop(block) => {
                let mut qregs = FxHashSet::default();
                let mut cregs = FxHashSet::default();
                for r in block.references() {
                    match r {
                        TemplateRef::Qubit(q) => qregs.insert(q.register.as_str()),
                        TemplateRef::Clbit(c) => cregs.insert(c.register.as_str()),
                    };
                }
                let qubits = self
                    .qregs
                    .iter()
                    .filter(|r| qregs.contains(r.name.as_str()))
                    .flat_map(Register::qubits)
                    .map(Resource::Qubit);
                let clbits = self
                    .cregs
                    .iter()
                    .filter(|r| cregs.contains(r.name.as_str()))
                    .flat_map(Register::clbits)
                    .map(Resource::Clbit);
                qubits.chain(clbits).collect()
            }
            _ => op.resources().collect(),
        }
    }

    /// Qubit → indices of operations referencing it, built on first use.
    pub fn qubit_index(&self) -> &FxHashMap<Qubit, Vec<usize>> {
        self.qubit_index.get_or_init(|| {
            let mut index: FxHashMap<Qubit, Vec<usize>> = FxHashMap::default();
            for (i, op) in self.operations.iter().enumerate() {
                for r in self.footprint(op) {
                    if let Resource::Qubit(q) = r {
                        let entry = index.entry(q).or_default();
                        if entry.last() != Some(&i) {
                            entry.push(i);
                        }
                    }
                }
            }
            index
        })
    }

    /// Indices of the operations touching `qubit`, in program order.
    pub fn ops_on(&self, qubit: &Qubit) -> &[usize] {
        self.qubit_index().get(qubit).map_or(&[], Vec::as_slice)
    }

    fn invalidate(&mut self) {
        self.qubit_index.take();
    }

    /// Dependency graph over the top-level operations.
    pub fn dependency_graph(&self) -> DependencyGraph {
        DependencyGraph::build(self)
    }

    /// Circuit depth, ignoring barriers.
    pub fn depth(&self) -> usize {
        self.dependency_graph().depth()
    }

    // =========================================================================
    // Gate builders
    // =========================================================================

    fn gate(&mut self, kind: GateKind, qubits: Vec<Qubit>, params: Vec<f64>) -> IrResult<&mut Self> {
        self.push(Operation::gate(kind, qubits, params))
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, q: Qubit) -> IrResult<&mut Self> {
        self.gate(GateKind::H, vec![q], vec![])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, q: Qubit) -> IrResult<&mut Self> {
        self.gate(GateKind::X, vec![q], vec![])
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, q: Qubit) -> IrResult<&mut Self> {
        self.gate(GateKind::Y, vec![q], vec![])
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, q: Qubit) -> IrResult<&mut Self> {
        self.gate(GateKind::Z, vec![q], vec![])
    }

    /// Apply S gate.
    pub fn s(&mut self, q: Qubit) -> IrResult<&mut Self> {
        self.gate(GateKind::S, vec![q], vec![])
    }

    /// Apply T gate.
    pub fn t(&mut self, q: Qubit) -> IrResult<&mut Self> {
        self.gate(GateKind::T, vec![q], vec![])
    }

    /// Apply Rx rotation.
    pub fn rx(&mut self, theta: f64, q: Qubit) -> IrResult<&mut Self> {
        self.gate(GateKind::Rx, vec![q], vec![theta])
    }

    /// Apply Ry rotation.
    pub fn ry(&mut self, theta: f64, q: Qubit) -> IrResult<&mut Self> {
        self.gate(GateKind::Ry, vec![q], vec![theta])
    }

    /// Apply Rz rotation.
    pub fn rz(&mut self, theta: f64, q: Qubit) -> IrResult<&mut Self> {
        self.gate(GateKind::Rz, vec![q], vec![theta])
    }

    /// Apply phase gate.
    pub fn p(&mut self, lambda: f64, q: Qubit) -> IrResult<&mut Self> {
        self.gate(GateKind::P, vec![q], vec![lambda])
    }

    /// Apply U(θ, φ, λ).
    pub fn u(&mut self, theta: f64, phi: f64, lambda: f64, q: Qubit) -> IrResult<&mut Self> {
        self.gate(GateKind::U, vec![q], vec![theta, phi, lambda])
    }

    /// Apply CNOT.
    pub fn cx(&mut self, control: Qubit, target: Qubit) -> IrResult<&mut Self> {
        self.gate(GateKind::CX, vec![control, target], vec![])
    }

    /// Apply controlled-Y.
    pub fn cy(&mut self, control: Qubit, target: Qubit) -> IrResult<&mut Self> {
        self.gate(GateKind::CY, vec![control, target], vec![])
    }

    /// Apply controlled-Z.
    pub fn cz(&mut self, q1: Qubit, q2: Qubit) -> IrResult<&mut Self> {
        self.gate(GateKind::CZ, vec![q1, q2], vec![])
    }

    /// Apply controlled phase.
    pub fn cp(&mut self, lambda: f64, control: Qubit, target: Qubit) -> IrResult<&mut Self> {
        self.gate(GateKind::CP, vec![control, target], vec![lambda])
    }

    /// Apply controlled Rz.
    pub fn crz(&mut self, theta: f64, control: Qubit, target: Qubit) -> IrResult<&mut Self> {
        self.gate(GateKind::CRz, vec![control, target], vec![theta])
    }

    /// Apply SWAP.
    pub fn swap(&mut self, q1: Qubit, q2: Qubit) -> IrResult<&mut Self> {
        self.gate(GateKind::Swap, vec![q1, q2], vec![])
    }

    /// Apply Toffoli.
    pub fn ccx(&mut self, c1: Qubit, c2: Qubit, target: Qubit) -> IrResult<&mut Self> {
        self.gate(GateKind::CCX, vec![c1, c2, target], vec![])
    }

    /// Measure a qubit into a classical bit.
    pub fn measure(&mut self, qubit: Qubit, clbit: Clbit) -> IrResult<&mut Self> {
        self.push(Operation::measure(qubit, clbit))
    }

    /// Measure qubit i into classical bit i, in flat register order.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        let pairs: Vec<_> = self.qubits().into_iter().zip(self.clbits()).collect();
        for (q, c) in pairs {
            self.measure(q, c)?;
        }
        Ok(self)
    }

    /// Barrier over the given qubits.
    pub fn barrier(&mut self, qubits: Vec<Qubit>) -> IrResult<&mut Self> {
        self.push(Operation::barrier(qubits))
    }

    /// Barrier over every declared qubit.
    pub fn barrier_all(&mut self) -> IrResult<&mut Self> {
        let qubits = self.qubits();
        self.barrier(qubits)
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Apply X to every qubit of `q` whose character in `bits` is `1`.
    ///
    /// Character i addresses `q[i]`.
    pub fn prepare_bitstring(&mut self, bits: &str) -> IrResult<&mut Self> {
        if !bits.chars().all(|c| c == '0' || c == '1') {
            return Err(IrError::InvalidBitstring(bits.to_string()));
        }
        for (i, c) in bits.chars().enumerate() {
            if c == '1' {
                self.x(Qubit::new("q", checked_u32(i)?))?;
            }
        }
        Ok(self)
    }

    /// Create a QFT circuit (without measurements).
    pub fn qft(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size("qft", n, 0);
        circuit.append_qft(n)?;
        Ok(circuit)
    }

    fn append_qft(&mut self, n: u32) -> IrResult<()> {
        let q = |i: u32| Qubit::new("q", i);
        for j in 0..n {
            self.h(q(j))?;
            for k in (j + 1)..n {
                self.cp(qft_angle(k - j), q(k), q(j))?;
            }
        }
        for i in 0..n / 2 {
            self.swap(q(i), q(n - 1 - i))?;
        }
        Ok(())
    }

    /// The same QFT expressed with loop blocks.
    ///
    /// The inner rotation loop's start depends on the outer variable.
    pub fn qft_looped(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size("qft", n, 0);
        circuit.append_qft_looped(n)?;
        Ok(circuit)
    }

    fn append_qft_looped(&mut self, n: u32) -> IrResult<()> {
        if n == 0 {
            return Ok(());
        }
        let n = i64::from(n);
        let qj = QubitExpr::new("q", IndexExpr::var("j"));
        let qk = QubitExpr::new("q", IndexExpr::var("k"));
        let angle = ParameterExpression::pi()
            / ParameterExpression::constant(2.0)
                .pow(ParameterExpression::symbol("k") - ParameterExpression::symbol("j"));

        let rotations = LoopBlock::new(
            "k",
            LoopBound::range(IndexExpr::var("j") + 1, n),
            vec![Template::gate(GateKind::CP, vec![qk, qj.clone()], vec![angle])],
        );
        self.push_loop(LoopBlock::new(
            "j",
            LoopBound::range(0, n),
            vec![
                Template::gate(GateKind::H, vec![qj], vec![]),
                Template::Loop(rotations),
            ],
        ))?;

        if n / 2 > 0 {
            let mirrored = IndexExpr::constant(n - 1) - IndexExpr::var("i");
            self.push_loop(LoopBlock::new(
                "i",
                LoopBound::range(0, n / 2),
                vec![Template::gate(
                    GateKind::Swap,
                    vec![
                        QubitExpr::new("q", IndexExpr::var("i")),
                        QubitExpr::new("q", mirrored),
                    ],
                    vec![],
                )],
            ))?;
        }
        Ok(())
    }

    /// QFT applied to a prepared basis state, followed by full measurement.
    pub fn qft_from_bitstring(bits: &str, looped: bool) -> IrResult<Self> {
        let n = checked_u32(bits.len())?;
        let mut circuit = Self::with_size(format!("qft_{bits}"), n, n);
        circuit.prepare_bitstring(bits)?;
        if looped {
            circuit.append_qft_looped(n)?;
        } else {
            circuit.append_qft(n)?;
        }
        circuit.measure_all()?;
        Ok(circuit)
    }
}

/// `π / 2^d`, computed the same way an unrolled `pi / 2 ** d` evaluates.
fn qft_angle(d: u32) -> f64 {
    PI / 2.0_f64.powf(f64::from(d))
}

fn checked_u32(value: usize) -> IrResult<u32> {
    u32::try_from(value).map_err(|_| IrError::InvalidBitstring(format!("length {value}")))
}
