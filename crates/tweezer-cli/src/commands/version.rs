//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - neutral-atom circuit compilation",
        style("Tweezer").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  tweezer-ir        Circuit IR with loop blocks");
    println!("  tweezer-compile   Rewrite passes and layer scheduler");
    println!("  tweezer-qasm      Textual circuit format");
    println!("  tweezer-hal       Device abstraction");
    println!("  tweezer-adapter-sim  Statevector simulator");
    println!();
    println!("Native gates: {}", style("u, rz, cz").green());
}
