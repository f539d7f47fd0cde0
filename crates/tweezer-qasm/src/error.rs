//! Error types for the QASM parser and emitter.

use thiserror::Error;

/// Errors that can occur while reading or writing circuit text.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Lexer error (invalid token).
    #[error("Lexer error at position {position}: {message}")]
    LexerError { position: usize, message: String },

    /// Unexpected token.
    #[error("Unexpected token at line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        line: usize,
        expected: String,
        found: String,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of input: {0}")]
    UnexpectedEof(String),

    /// A statement names a register that was never declared.
    #[error("Undefined register: {0}")]
    UndefinedRegister(String),

    /// Only `OPENQASM 2.0` is accepted.
    #[error("Invalid OPENQASM version: {0}")]
    InvalidVersion(String),

    /// Broadcast operands of different sizes.
    #[error("Cannot broadcast '{statement}': register sizes {sizes:?} differ")]
    BroadcastMismatch { statement: String, sizes: Vec<u32> },

    /// A constant parameter expression has no finite value.
    #[error("Parameter of '{gate}' does not evaluate: {expression}")]
    InvalidParameter { gate: String, expression: String },

    /// IR error during circuit construction.
    #[error("Circuit error: {0}")]
    Ir(#[from] tweezer_ir::IrError),

    /// The circuit cannot be written as text.
    #[error("Cannot emit: {0}")]
    Emit(String),
}

/// Result type for parsing and emission.
pub type ParseResult<T> = Result<T, ParseError>;
