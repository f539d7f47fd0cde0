//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum IrError {
    /// An operation references a qubit or classical bit that is not declared.
    #[error("Unknown resource {resource}{}", format_op_context(.operation))]
    UnknownResource {
        /// The offending resource, e.g. `c[5]`.
        resource: String,
        /// Operation that referenced it.
        operation: Option<String>,
    },

    /// A register with this name already exists.
    #[error("Register '{0}' is already declared")]
    DuplicateRegister(String),

    /// Registers must hold at least one bit.
    #[error("Register '{0}' must not be empty")]
    EmptyRegister(String),

    /// The same qubit appears twice in one operation.
    #[error("Duplicate qubit {qubit} in operation{}", format_op_context(.operation))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: String,
        /// Operation that referenced it.
        operation: Option<String>,
    },

    /// A loop variable is still free where a concrete value is required.
    #[error("Variable '{0}' is unbound")]
    UnboundVariable(String),

    /// Index arithmetic left the `i64` range.
    #[error("Index expression {0} overflows")]
    IndexOverflow(String),

    /// Bit-string input contained something other than `0` / `1`.
    #[error("Invalid bit string '{0}'")]
    InvalidBitstring(String),
}

/// Helper function to format optional operation context.
#[allow(clippy::ref_option)]
fn format_op_context(operation: &Option<String>) -> String {
    match operation {
        Some(name) => format!(" (operation: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
