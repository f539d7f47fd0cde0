//! Gate kinds and gate applications.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parameter::ParameterExpression;
use crate::qubit::Qubit;

/// Gate kinds understood by the pipeline.
///
/// The canonical library is what circuit builders write; the native subset
/// (`U`, `Rz`, `CZ`) is what a neutral-atom device executes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateKind {
    // Single-qubit gates
    /// Identity gate.
    Id,
    /// Hadamard gate.
    H,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// Rotation around X axis.
    Rx,
    /// Rotation around Y axis.
    Ry,
    /// Rotation around Z axis (native).
    Rz,
    /// Phase gate.
    P,
    /// Universal single-qubit gate U(θ, φ, λ) (native).
    U,

    // Two-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate (native).
    CZ,
    /// Controlled phase gate.
    CP,
    /// Controlled rotation around Z.
    CRz,
    /// SWAP gate.
    Swap,

    // Three-qubit gates
    /// Toffoli (CCX) gate.
    CCX,

    /// A gate the pipeline has no semantics for.
    Custom(String),
}

impl GateKind {
    /// Canonical lower-case name, as written in circuit text.
    pub fn name(&self) -> &str {
        match self {
            GateKind::Id => "id",
            GateKind::H => "h",
            GateKind::X => "x",
            GateKind::Y => "y",
            GateKind::Z => "z",
            GateKind::S => "s",
            GateKind::Sdg => "sdg",
            GateKind::T => "t",
            GateKind::Tdg => "tdg",
            GateKind::Rx => "rx",
            GateKind::Ry => "ry",
            GateKind::Rz => "rz",
            GateKind::P => "p",
            GateKind::U => "u",
            GateKind::CX => "cx",
            GateKind::CY => "cy",
            GateKind::CZ => "cz",
            GateKind::CP => "cp",
            GateKind::CRz => "crz",
            GateKind::Swap => "swap",
            GateKind::CCX => "ccx",
            GateKind::Custom(name) => name,
        }
    }

    /// Look a gate up by name. Unknown names become [`GateKind::Custom`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "id" | "i" => GateKind::Id,
            "h" => GateKind::H,
            "x" => GateKind::X,
            "y" => GateKind::Y,
            "z" => GateKind::Z,
            "s" => GateKind::S,
            "sdg" => GateKind::Sdg,
            "t" => GateKind::T,
            "tdg" => GateKind::Tdg,
            "rx" => GateKind::Rx,
            "ry" => GateKind::Ry,
            "rz" => GateKind::Rz,
            "p" | "u1" => GateKind::P,
            "u" | "u3" => GateKind::U,
            "cx" | "cnot" => GateKind::CX,
            "cy" => GateKind::CY,
            "cz" => GateKind::CZ,
            "cp" | "cu1" | "cphase" => GateKind::CP,
            "crz" => GateKind::CRz,
            "swap" => GateKind::Swap,
            "ccx" | "toffoli" => GateKind::CCX,
            other => GateKind::Custom(other.to_string()),
        }
    }

    /// Number of qubits the gate acts on, if known.
    pub fn num_qubits(&self) -> Option<usize> {
        match self {
            GateKind::Id
            | GateKind::H
            | GateKind::X
            | GateKind::Y
            | GateKind::Z
            | GateKind::S
            | GateKind::Sdg
            | GateKind::T
            | GateKind::Tdg
            | GateKind::Rx
            | GateKind::Ry
            | GateKind::Rz
            | GateKind::P
            | GateKind::U => Some(1),
            GateKind::CX
            | GateKind::CY
            | GateKind::CZ
            | GateKind::CP
            | GateKind::CRz
            | GateKind::Swap => Some(2),
            GateKind::CCX => Some(3),
            GateKind::Custom(_) => None,
        }
    }

    /// Number of real parameters the gate takes, if known.
    pub fn num_params(&self) -> Option<usize> {
        match self {
            GateKind::Rx | GateKind::Ry | GateKind::Rz | GateKind::P => Some(1),
            GateKind::CP | GateKind::CRz => Some(1),
            GateKind::U => Some(3),
            GateKind::Custom(_) => None,
            _ => Some(0),
        }
    }

    /// Whether the gate is part of the neutral-atom native set.
    pub fn is_native(&self) -> bool {
        matches!(self, GateKind::U | GateKind::Rz | GateKind::CZ)
    }

    /// Whether the gate is diagonal in the computational basis.
    ///
    /// Diagonal gates commute with each other regardless of which qubits
    /// they share.
    pub fn is_diagonal(&self) -> bool {
        matches!(
            self,
            GateKind::Id
                | GateKind::Z
                | GateKind::S
                | GateKind::Sdg
                | GateKind::T
                | GateKind::Tdg
                | GateKind::Rz
                | GateKind::P
                | GateKind::CZ
                | GateKind::CP
                | GateKind::CRz
        )
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A gate applied to operands.
///
/// `Q` is the qubit operand type and `P` the parameter type: concrete
/// circuits use `Gate<Qubit, f64>`, loop bodies use symbolic operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate<Q = Qubit, P = f64> {
    /// Which gate.
    pub kind: GateKind,
    /// Target qubits, in gate order (controls first).
    pub qubits: Vec<Q>,
    /// Real parameters.
    pub params: Vec<P>,
}

impl<Q, P> Gate<Q, P> {
    /// Create a gate application.
    pub fn new(kind: GateKind, qubits: Vec<Q>, params: Vec<P>) -> Self {
        Self {
            kind,
            qubits,
            params,
        }
    }

    /// Gate name.
    pub fn name(&self) -> &str {
        self.kind.name()
    }
}

impl<Q: fmt::Display, P: fmt::Display> fmt::Display for Gate<Q, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
            write!(f, "({})", params.join(", "))?;
        }
        let qubits: Vec<String> = self.qubits.iter().map(ToString::to_string).collect();
        write!(f, " {}", qubits.join(", "))
    }
}

/// A gate as written inside a loop body.
pub type TemplateGate = Gate<crate::index::QubitExpr, ParameterExpression>;
