//! Pass trait and types for compilation passes.

use tweezer_ir::Circuit;

use crate::error::CompileResult;

/// The kind of compilation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Checks the circuit and hands it back unchanged.
    Analysis,
    /// Produces a new circuit.
    Transformation,
}

/// A compilation pass: one `Circuit -> Circuit` step of the pipeline.
///
/// Passes take ownership of their input and return a new circuit, so no
/// two stages ever alias the same circuit.
pub trait Pass: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Get the kind of this pass.
    fn kind(&self) -> PassKind;

    /// Run the pass.
    fn run(&self, circuit: Circuit) -> CompileResult<Circuit>;

    /// Check if this pass should run on the given circuit.
    fn should_run(&self, _circuit: &Circuit) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Identity;

    impl Pass for Identity {
        fn name(&self) -> &'static str {
            "identity"
        }

        fn kind(&self) -> PassKind {
            PassKind::Analysis
        }

        fn run(&self, circuit: Circuit) -> CompileResult<Circuit> {
            Ok(circuit)
        }
    }

    #[test]
    fn test_pass_kind() {
        let pass = Identity;
        assert_eq!(pass.kind(), PassKind::Analysis);
        assert_eq!(pass.name(), "identity");
        assert!(pass.should_run(&Circuit::new("c")));
    }
}
