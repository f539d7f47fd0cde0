//! Built-in compilation passes.
//!
//! - [`TypeInference`]: analysis, rejects malformed gates early
//! - [`NativeDecomposition`], [`FoldLoops`], [`MergeRotations`]: rule-set
//!   driven transformations

pub mod lowering;
pub mod typeinfer;

pub use lowering::{FoldLoops, MergeRotations, NativeDecomposition};
pub use typeinfer::TypeInference;
