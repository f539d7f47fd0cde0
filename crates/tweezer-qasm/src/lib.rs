//! Textual Circuit Format for Tweezer
//!
//! A subset of `OpenQASM` 2.0 extended with counted `for` loops, so looped
//! circuits can be written, read back and inspected after each pass.
//!
//! # Supported Features
//!
//! | Feature | Example |
//! |---------|---------|
//! | Version declaration | `OPENQASM 2.0;` |
//! | Include (ignored) | `include "qelib1.inc";` |
//! | Registers | `qreg q[4];`, `creg c[4];` |
//! | Gates with parameters | `cp(pi / 2) q[1], q[0];` |
//! | Register broadcast | `h q;`, `measure q -> c;` |
//! | Barriers | `barrier q[0], q[1];`, `barrier q;` |
//! | Loops | `for i in [0:4] { ... }`, `for i in [0:2:8] { ... }` |
//! | Affine indices | `q[i + 1]`, `q[-i + 3]`, `q[2*i]` |
//!
//! Loop ranges are half-open: `[start:stop]` visits `start..stop`, and
//! `[start:step:stop]` walks with `step`. Inside a loop, the loop variable
//! may appear in indices and in parameter expressions.
//!
//! Constant parameters are printed with the shortest representation that
//! reads back to the same `f64`, so emit followed by parse is lossless.
//!
//! # Example: Parsing
//!
//! ```rust
//! use tweezer_qasm::parse;
//!
//! let circuit = parse(r#"
//!     OPENQASM 2.0;
//!     include "qelib1.inc";
//!     qreg q[2];
//!     creg c[2];
//!     h q[0];
//!     cx q[0], q[1];
//!     measure q -> c;
//! "#).unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.len(), 4);
//! ```
//!
//! # Example: Round-Trip of a Looped QFT
//!
//! ```rust
//! use tweezer_ir::Circuit;
//! use tweezer_qasm::{emit, parse};
//!
//! let looped = Circuit::qft_looped(4).unwrap();
//! let text = emit(&looped).unwrap();
//! assert!(text.contains("for j in [0:4] {"));
//!
//! let reparsed = parse(&text).unwrap();
//! assert_eq!(reparsed.operations(), looped.operations());
//! ```
//!
//! # Example: Emitting a Schedule
//!
//! ```rust
//! use tweezer_compile::{PipelineConfig, compile};
//! use tweezer_ir::Circuit;
//! use tweezer_qasm::emit_schedule;
//!
//! let circuit = Circuit::qft_from_bitstring("01", false).unwrap();
//! let program = compile(&circuit, &PipelineConfig::default().with_parallelize(true)).unwrap();
//!
//! let text = emit_schedule(&program.schedule).unwrap();
//! assert_eq!(
//!     text.matches("barrier q[0], q[1];").count(),
//!     program.schedule.num_layers() - 1
//! );
//! ```

mod ast;
mod emitter;
mod error;
mod lexer;
mod parser;

pub use emitter::{emit, emit_schedule};
pub use error::{ParseError, ParseResult};
pub use parser::{DEFAULT_CIRCUIT_NAME, parse, parse_ast, parse_named};

/// Syntax tree types returned by [`parse_ast`].
pub mod syntax {
    pub use crate::ast::*;
}
