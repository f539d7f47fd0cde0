//! Rule-set driven passes: native decomposition, loop folding and rotation
//! merging.

use tracing::debug;

use tweezer_ir::Circuit;

use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::rewrite::{DEFAULT_MAX_ITERATIONS, RewriteEngine};
use crate::rules::{fold_ruleset, merge_ruleset, native_ruleset};

/// Rewrite every gate into `{u, rz, cz}`, loop bodies included.
pub struct NativeDecomposition {
    engine: RewriteEngine,
}

impl NativeDecomposition {
    /// Create the pass with the given iteration bound.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            engine: RewriteEngine::new(native_ruleset()).with_max_iterations(max_iterations),
        }
    }
}

impl Default for NativeDecomposition {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS)
    }
}

impl Pass for NativeDecomposition {
    fn name(&self) -> &'static str {
        "native_decomposition"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: Circuit) -> CompileResult<Circuit> {
        let result = self.engine.fixpoint(&circuit)?;
        debug!(
            "Decomposed {} ops into {} ({} rewrites)",
            circuit.len(),
            result.circuit.len(),
            result.rewrite_count
        );
        Ok(result.circuit)
    }
}

/// Unroll every loop with static bounds.
pub struct FoldLoops {
    engine: RewriteEngine,
}

impl FoldLoops {
    /// Create the pass with the given iteration bound.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            engine: RewriteEngine::new(fold_ruleset()).with_max_iterations(max_iterations),
        }
    }
}

impl Default for FoldLoops {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS)
    }
}

impl Pass for FoldLoops {
    fn name(&self) -> &'static str {
        "fold_loops"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: Circuit) -> CompileResult<Circuit> {
        let result = self.engine.fixpoint(&circuit)?;
        debug!("Unrolled to {} ops", result.circuit.len());
        Ok(result.circuit)
    }

    fn should_run(&self, circuit: &Circuit) -> bool {
        circuit.has_loops()
    }
}

/// Merge runs of `rz` on the same qubit.
pub struct MergeRotations {
    engine: RewriteEngine,
}

impl MergeRotations {
    /// Create the pass with the given iteration bound.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            engine: RewriteEngine::new(merge_ruleset()).with_max_iterations(max_iterations),
        }
    }
}

impl Default for MergeRotations {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS)
    }
}

impl Pass for MergeRotations {
    fn name(&self) -> &'static str {
        "merge_rotations"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: Circuit) -> CompileResult<Circuit> {
        let result = self.engine.fixpoint(&circuit)?;
        debug!("Merged {} rotation pairs", result.rewrite_count);
        Ok(result.circuit)
    }
}
