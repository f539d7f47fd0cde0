//! Tweezer Circuit Intermediate Representation
//!
//! This crate provides the data structures shared by every stage of the
//! Tweezer neutral-atom compilation pipeline.
//!
//! # Overview
//!
//! A [`Circuit`] is an ordered list of [`Operation`]s over declared
//! registers. Operation order is the only source of dependency before
//! scheduling; [`DependencyGraph`] derives the resource edges from it on
//! demand. Passes never mutate a circuit in place: each produces a new one.
//!
//! # Core Components
//!
//! - **Resources**: [`Qubit`], [`Clbit`] identified by register name and index
//! - **Gates**: [`GateKind`] (canonical library plus the native `u`/`rz`/`cz`
//!   set) applied through [`Gate`]
//! - **Loops**: [`LoopBlock`] bodies of [`Template`]s whose indices are
//!   affine [`IndexExpr`]s and whose angles are [`ParameterExpression`]s
//! - **Schedules**: [`Schedule`] / [`Layer`], the layered output handed to a
//!   device
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use tweezer_ir::{Circuit, Qubit};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2, 2);
//! circuit.h(Qubit::new("q", 0)).unwrap();
//! circuit.cx(Qubit::new("q", 0), Qubit::new("q", 1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.depth(), 3);
//! ```
//!
//! # Example: Undeclared resources are rejected
//!
//! ```rust
//! use tweezer_ir::{Circuit, Clbit, IrError, Qubit};
//!
//! let mut circuit = Circuit::with_size("qft", 4, 4);
//! let err = circuit.measure(Qubit::new("q", 0), Clbit::new("c", 5)).unwrap_err();
//! assert!(matches!(err, IrError::UnknownResource { .. }));
//! assert!(circuit.is_empty());
//! ```

pub mod circuit;
pub mod dag;
pub mod error;
pub mod gate;
pub mod index;
pub mod operation;
pub mod parameter;
pub mod qubit;
pub mod schedule;

pub use circuit::Circuit;
pub use dag::DependencyGraph;
pub use error::{IrError, IrResult};
pub use gate::{Gate, GateKind, TemplateGate};
pub use index::{ClbitExpr, IndexExpr, QubitExpr};
pub use operation::{LoopBlock, LoopBound, Operation, Resource, Template, TemplateRef};
pub use parameter::{Angle, ParameterExpression};
pub use qubit::{Clbit, Qubit, Register};
pub use schedule::{Layer, Schedule};
