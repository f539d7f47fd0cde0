//! Error types for the compilation crate.

use thiserror::Error;
use tweezer_ir::IrError;

/// Errors raised by passes, rule sets and the scheduler.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR layer, including unknown resources.
    #[error(transparent)]
    Ir(#[from] IrError),

    /// A gate kind is neither native nor covered by a decomposition rule.
    #[error("Gate '{gate}' is not supported by the native gate set (operation: {operation})")]
    UnsupportedGate {
        /// Gate name.
        gate: String,
        /// The offending operation.
        operation: String,
    },

    /// A rewrite did not settle within its iteration bound.
    #[error("Rule set '{ruleset}' did not reach a fixpoint within {iterations} iterations")]
    NonTerminatingRewrite {
        /// Name of the rule set.
        ruleset: String,
        /// The bound that was exceeded.
        iterations: usize,
    },

    /// A loop has no static iteration bound.
    #[error("Loop over '{var}' cannot be unrolled: {reason}")]
    UnboundedLoop {
        /// Loop variable.
        var: String,
        /// Why the bound is not static.
        reason: String,
    },

    /// The scheduler was handed a circuit that still contains loops.
    #[error("Loop over '{var}' must be folded before scheduling")]
    UnfoldedLoop {
        /// Loop variable.
        var: String,
    },

    /// Gate applied to the wrong number of qubits.
    #[error("Gate '{gate}' requires {expected} qubits, got {found}")]
    ArityMismatch {
        /// Gate name.
        gate: String,
        /// Expected qubit count.
        expected: usize,
        /// Actual qubit count.
        found: usize,
    },

    /// Gate given the wrong number of parameters.
    #[error("Gate '{gate}' takes {expected} parameters, got {found}")]
    ParameterMismatch {
        /// Gate name.
        gate: String,
        /// Expected parameter count.
        expected: usize,
        /// Actual parameter count.
        found: usize,
    },

    /// NaN or infinite rotation angle.
    #[error("Gate '{gate}' has non-finite parameter {value}")]
    NonFiniteParameter {
        /// Gate name.
        gate: String,
        /// The offending value.
        value: f64,
    },

    /// A produced schedule broke an ordering or commutation guarantee.
    #[error("Schedule violation: {0}")]
    ScheduleViolation(String),
}

impl CompileError {
    /// Whether this error reports an undeclared qubit or bit.
    pub fn is_unknown_resource(&self) -> bool {
        matches!(self, CompileError::Ir(IrError::UnknownResource { .. }))
    }
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
