//! Pass manager for orchestrating compilation.

use tracing::{debug, info, instrument};

use tweezer_ir::Circuit;

use crate::config::PipelineConfig;
use crate::error::CompileResult;
use crate::pass::Pass;
use crate::passes::{FoldLoops, MergeRotations, NativeDecomposition, TypeInference};
use crate::rewrite::DEFAULT_MAX_ITERATIONS;

/// Manages and executes a sequence of compilation passes.
pub struct PassManager {
    /// The passes to execute, in order.
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Run all passes, threading the circuit from one to the next.
    #[instrument(skip(self, circuit), fields(circuit = %circuit.name()))]
    pub fn run(&self, circuit: Circuit) -> CompileResult<Circuit> {
        info!(
            "Running pass manager with {} passes on circuit with {} qubits",
            self.passes.len(),
            circuit.num_qubits()
        );

        let mut current = circuit;
        for pass in &self.passes {
            if pass.should_run(&current) {
                debug!("Running pass: {}", pass.name());
                current = pass.run(current)?;
                debug!("Pass {} completed, ops: {}", pass.name(), current.len());
            } else {
                debug!("Skipping pass: {}", pass.name());
            }
        }

        info!("Pass manager completed, ops: {}", current.len());

        Ok(current)
    }

    /// Names of the passes, in run order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for the standard pass sequence.
///
/// Order: type inference, native decomposition, loop folding, rotation
/// merging. Decomposition lowers loop bodies in place, so folding only
/// ever copies native templates.
pub struct PassManagerBuilder {
    typeinfer: bool,
    fold: bool,
    merge_rotations: bool,
    max_iterations: usize,
}

impl PassManagerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            typeinfer: true,
            fold: true,
            merge_rotations: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Take every switch from a pipeline configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new()
            .with_typeinfer(config.typeinfer)
            .with_fold(config.fold)
            .with_merge_rotations(config.merge_rotations)
            .with_max_iterations(config.max_iterations)
    }

    /// Enable or disable type inference.
    #[must_use]
    pub fn with_typeinfer(mut self, typeinfer: bool) -> Self {
        self.typeinfer = typeinfer;
        self
    }

    /// Enable or disable loop folding.
    #[must_use]
    pub fn with_fold(mut self, fold: bool) -> Self {
        self.fold = fold;
        self
    }

    /// Enable or disable rotation merging.
    #[must_use]
    pub fn with_merge_rotations(mut self, merge_rotations: bool) -> Self {
        self.merge_rotations = merge_rotations;
        self
    }

    /// Set the rewrite iteration bound for every rule-set pass.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Build the pass manager.
    pub fn build(self) -> PassManager {
        let mut pm = PassManager::new();

        if self.typeinfer {
            pm.add_pass(TypeInference);
        }

        pm.add_pass(NativeDecomposition::new(self.max_iterations));

        if self.fold {
            pm.add_pass(FoldLoops::new(self.max_iterations));
        }

        if self.merge_rotations {
            pm.add_pass(MergeRotations::new(self.max_iterations));
        }

        pm
    }
}

impl Default for PassManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
