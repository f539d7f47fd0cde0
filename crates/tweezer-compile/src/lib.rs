//! Tweezer Compilation Pipeline
//!
//! This crate lowers circuits to the neutral-atom native gate set
//! `{u, rz, cz}` and groups the result into parallel layers.
//!
//! # Overview
//!
//! Compilation is a fixed sequence of pure `Circuit -> Circuit` passes
//! followed by the scheduler:
//! 1. **Type inference**: operand, parameter and loop-scope checks
//! 2. **Native decomposition**: rule-set rewrite to `{u, rz, cz}`, loop
//!    bodies included
//! 3. **Loop folding**: unroll every statically bounded loop
//! 4. **Scheduling**: pass-through, or greedy layering of commuting
//!    operations
//!
//! # Architecture
//!
//! ```text
//! Input Circuit
//!       │
//!       ▼
//! ┌─────────────┐
//! │ PassManager │ ◄── PipelineConfig (fold, typeinfer, max_iterations, ...)
//! └─────────────┘
//!       │
//!       ├── TypeInference
//!       ├── NativeDecomposition   (RewriteEngine + native_ruleset)
//!       ├── FoldLoops             (RewriteEngine + fold_ruleset)
//!       └── MergeRotations        (optional)
//!       │
//!       ▼
//! ┌─────────────┐
//! │  schedule   │ ◄── SchedulerConfig (parallelize, commutation)
//! └─────────────┘
//!       │
//!       ▼
//! Schedule (layers)
//! ```
//!
//! # Example: Compiling a QFT
//!
//! ```rust
//! use tweezer_compile::{PipelineConfig, compile};
//! use tweezer_ir::Circuit;
//!
//! let circuit = Circuit::qft_from_bitstring("0101", true).unwrap();
//! let config = PipelineConfig::default().with_parallelize(true);
//!
//! let program = compile(&circuit, &config).unwrap();
//! assert!(!program.circuit.has_loops());
//! assert!(program.schedule.num_layers() < program.circuit.len());
//! ```
//!
//! # Rule Sets
//!
//! | Rule set | Rules | Used by |
//! |----------|-------|---------|
//! | `native` | one identity per canonical gate, then `reject_unsupported` | [`passes::NativeDecomposition`] |
//! | `fold` | `unroll_loop` | [`passes::FoldLoops`] |
//! | `merge` | `merge_rz` | [`passes::MergeRotations`] |

pub mod config;
pub mod error;
pub mod manager;
pub mod pass;
pub mod passes;
pub mod pipeline;
pub mod rewrite;
pub mod rules;
pub mod schedule;

pub use config::{CommutationRule, PipelineConfig};
pub use error::{CompileError, CompileResult};
pub use manager::{PassManager, PassManagerBuilder};
pub use pass::{Pass, PassKind};
pub use pipeline::{CompileStats, CompiledProgram, compile};
pub use rewrite::{RewriteEngine, RewriteResult, RewriteRule, RuleSet, fixpoint, rewrite};
pub use rules::{decompose, fold_ruleset, merge_ruleset, native_ruleset};
pub use schedule::{SchedulerConfig, commutes, schedule, verify_schedule};
