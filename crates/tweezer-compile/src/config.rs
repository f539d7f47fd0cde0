//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::rewrite::DEFAULT_MAX_ITERATIONS;

/// When two operations may share a layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommutationRule {
    /// Only operations on disjoint resources.
    #[default]
    Disjoint,
    /// Disjoint operations, plus diagonal gates sharing qubits.
    Diagonal,
}

/// Switches for the compilation pipeline.
///
/// Missing fields take their defaults when deserialized, so a YAML file
/// only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Unroll loops before scheduling.
    pub fold: bool,
    /// Check operand and parameter types before decomposition.
    pub typeinfer: bool,
    /// Pack commuting operations into shared layers.
    pub parallelize: bool,
    /// Bound on rewrite iterations.
    pub max_iterations: usize,
    /// Commutation rule used by the scheduler.
    pub commutation: CommutationRule,
    /// Merge adjacent `rz` rotations after lowering.
    pub merge_rotations: bool,
    /// Check the schedule against the circuit before returning it.
    pub verify_schedule: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fold: true,
            typeinfer: true,
            parallelize: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            commutation: CommutationRule::Disjoint,
            merge_rotations: false,
            verify_schedule: true,
        }
    }
}

impl PipelineConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable loop folding.
    #[must_use]
    pub fn with_fold(mut self, fold: bool) -> Self {
        self.fold = fold;
        self
    }

    /// Enable or disable type inference.
    #[must_use]
    pub fn with_typeinfer(mut self, typeinfer: bool) -> Self {
        self.typeinfer = typeinfer;
        self
    }

    /// Enable or disable parallel scheduling.
    #[must_use]
    pub fn with_parallelize(mut self, parallelize: bool) -> Self {
        self.parallelize = parallelize;
        self
    }

    /// Set the rewrite iteration bound.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Set the commutation rule.
    #[must_use]
    pub fn with_commutation(mut self, commutation: CommutationRule) -> Self {
        self.commutation = commutation;
        self
    }

    /// Enable or disable rotation merging.
    #[must_use]
    pub fn with_merge_rotations(mut self, merge_rotations: bool) -> Self {
        self.merge_rotations = merge_rotations;
        self
    }

    /// Enable or disable schedule verification.
    #[must_use]
    pub fn with_verify_schedule(mut self, verify_schedule: bool) -> Self {
        self.verify_schedule = verify_schedule;
        self
    }
}
