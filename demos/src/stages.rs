//! Stage-by-stage execution of the pass pipeline.

use std::time::{Duration, Instant};

use tweezer_compile::passes::{FoldLoops, MergeRotations, NativeDecomposition, TypeInference};
use tweezer_compile::{CompileResult, Pass, PipelineConfig};
use tweezer_hal::Counts;
use tweezer_ir::Circuit;

/// Snapshot of the circuit after one pass.
#[derive(Debug, Clone)]
pub struct Stage {
    /// Pass name, or `input` for the starting circuit.
    pub name: String,
    /// Circuit produced by the pass.
    pub circuit: Circuit,
    /// Time the pass took.
    pub elapsed: Duration,
}

impl Stage {
    /// Count of top-level operations.
    pub fn len(&self) -> usize {
        self.circuit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circuit.is_empty()
    }
}

/// Run the passes `config` enables, in pipeline order, keeping every
/// intermediate circuit.
pub fn walk_pipeline(circuit: Circuit, config: &PipelineConfig) -> CompileResult<Vec<Stage>> {
    let mut passes: Vec<Box<dyn Pass>> = Vec::new();
    if config.typeinfer {
        passes.push(Box::new(TypeInference));
    }
    passes.push(Box::new(NativeDecomposition::new(config.max_iterations)));
    if config.fold {
        passes.push(Box::new(FoldLoops::new(config.max_iterations)));
    }
    if config.merge_rotations {
        passes.push(Box::new(MergeRotations::new(config.max_iterations)));
    }

    let mut stages = vec![Stage {
        name: "input".into(),
        circuit,
        elapsed: Duration::ZERO,
    }];
    for pass in &passes {
        let input = stages[stages.len() - 1].circuit.clone();
        let start = Instant::now();
        let output = pass.run(input)?;
        tracing::debug!("{} finished in {:?}", pass.name(), start.elapsed());
        stages.push(Stage {
            name: pass.name().to_string(),
            circuit: output,
            elapsed: start.elapsed(),
        });
    }
    Ok(stages)
}

/// χ² statistic of `counts` against the uniform distribution over all
/// `width`-bit outcomes.
#[allow(clippy::cast_precision_loss)]
pub fn chi_square_uniform(counts: &Counts, width: usize) -> f64 {
    let bins = 1_usize << width;
    let expected = counts.total_shots() as f64 / bins as f64;
    (0..bins)
        .map(|i| {
            let observed = counts.get(&format!("{i:0width$b}")) as f64;
            (observed - expected).powi(2) / expected
        })
        .sum()
}
