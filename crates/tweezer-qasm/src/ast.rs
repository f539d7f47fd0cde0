//! Abstract syntax tree of the dialect.
//!
//! Expressions are parsed straight into the IR's [`IndexExpr`] and
//! [`ParameterExpression`], so the tree carries no separate expression type.

use serde::{Deserialize, Serialize};
use tweezer_ir::{IndexExpr, LoopBound, ParameterExpression};

/// A parsed program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Version from the `OPENQASM` header.
    pub version: String,
    /// Statements in source order.
    pub statements: Vec<Statement>,
}

/// A statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `include "file";`, accepted and ignored.
    Include(String),

    /// `qreg name[size];`
    QReg { name: String, size: u32 },

    /// `creg name[size];`
    CReg { name: String, size: u32 },

    /// Gate application.
    Gate(GateCall),

    /// `measure q -> c;`
    Measure { qubit: Operand, clbit: Operand },

    /// `barrier q[0], q[1];`
    Barrier(Vec<Operand>),

    /// `for i in [start:stop] { ... }`
    For(ForLoop),
}

/// A gate call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateCall {
    /// Gate name as written.
    pub name: String,
    /// Parameter expressions.
    pub params: Vec<ParameterExpression>,
    /// Operands.
    pub operands: Vec<Operand>,
}

/// A register operand: a whole register or one indexed element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operand {
    pub register: String,
    pub index: Option<IndexExpr>,
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.index {
            Some(index) => write!(f, "{}[{index}]", self.register),
            None => write!(f, "{}", self.register),
        }
    }
}

/// A counted loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForLoop {
    /// Iteration variable.
    pub var: String,
    /// Half-open iteration range, or a symbolic bound.
    pub bound: LoopBound,
    /// Loop body.
    pub body: Vec<Statement>,
}
