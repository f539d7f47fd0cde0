//! Tweezer Demo Suite
//!
//! Walks a QFT through the pass pipeline one stage at a time, the way one
//! would step through it interactively:
//!
//! - **Build**: a looped QFT of a basis state
//! - **Passes**: type inference, native decomposition, loop folding and
//!   optional rotation merging, each timed and inspectable as text
//! - **Schedule**: layers of commuting operations
//! - **Execute**: sample on the statevector simulator and test the
//!   outcomes for uniformity
//!
//! ```rust
//! use tweezer_compile::PipelineConfig;
//! use tweezer_demos::stages::walk_pipeline;
//! use tweezer_ir::Circuit;
//!
//! let circuit = Circuit::qft_from_bitstring("01", true).unwrap();
//! let stages = walk_pipeline(circuit, &PipelineConfig::default()).unwrap();
//!
//! let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
//! assert_eq!(names, ["input", "type_inference", "native_decomposition", "fold_loops"]);
//! assert!(!stages.last().unwrap().circuit.has_loops());
//! ```

pub mod stages;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Create a spinner for long-running demo steps.
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        pb.set_style(template);
    }
    pb.set_message(message.to_string());
    pb
}

/// Print a demo header.
pub fn print_header(title: &str) {
    println!();
    println!("{}", style("═".repeat(60)).cyan());
    println!("{}", style(format!("  {title}")).cyan().bold());
    println!("{}", style("═".repeat(60)).cyan());
    println!();
}

/// Print a demo section.
pub fn print_section(title: &str) {
    println!();
    println!("{}", style(format!("▶ {title}")).green().bold());
    println!("{}", style("─".repeat(40)).dim());
}

/// Print a result line.
pub fn print_result(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", style(format!("{label}:")).dim(), value);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print a failure message.
pub fn print_failure(message: &str) {
    println!("{} {}", style("✗").red().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("ℹ").blue(), message);
}
