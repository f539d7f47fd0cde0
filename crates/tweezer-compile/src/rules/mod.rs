//! Built-in rule sets.

pub mod fold;
pub mod merge;
pub mod native;

pub use fold::fold_ruleset;
pub use merge::merge_ruleset;
pub use native::{decompose, native_ruleset};
