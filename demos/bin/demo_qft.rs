//! QFT Pipeline Demo
//!
//! Builds a looped QFT of a basis state, steps it through every pass,
//! schedules it for parallel execution and checks on the simulator that
//! the measured outcomes are uniform.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tweezer_adapter_sim::SimulatorDevice;
use tweezer_compile::{CommutationRule, PipelineConfig, SchedulerConfig, schedule};
use tweezer_demos::stages::{chi_square_uniform, walk_pipeline};
use tweezer_demos::{
    create_spinner, print_failure, print_header, print_info, print_result, print_section,
    print_success,
};
use tweezer_hal::Device;
use tweezer_ir::Circuit;
use tweezer_qasm::{emit, emit_schedule};

/// χ² critical value for 15 degrees of freedom at p = 0.001.
const CHI_SQUARE_CRITICAL_15: f64 = 37.70;

#[derive(Parser, Debug)]
#[command(name = "demo-qft")]
#[command(about = "Step a QFT through the neutral-atom pass pipeline")]
struct Args {
    /// Basis state to transform
    #[arg(default_value = "0101")]
    bits: String,

    /// Number of shots
    #[arg(short, long, default_value = "10000")]
    shots: u32,

    /// Seed for reproducible sampling
    #[arg(long, default_value = "2024")]
    seed: u64,

    /// Let diagonal gates share layers on common qubits
    #[arg(long)]
    diagonal: bool,

    /// Merge adjacent rz rotations after lowering
    #[arg(long)]
    merge_rotations: bool,

    /// Print the circuit text after every pass
    #[arg(long)]
    show_qasm: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args).await {
        print_failure(&format!("Demo failed: {e}"));
        std::process::exit(1);
    }
}

async fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    print_header("QFT on a Neutral-Atom Array");

    let commutation = if args.diagonal {
        CommutationRule::Diagonal
    } else {
        CommutationRule::Disjoint
    };
    let config = PipelineConfig::default()
        .with_parallelize(true)
        .with_commutation(commutation)
        .with_merge_rotations(args.merge_rotations);

    print_section("Circuit");
    let circuit = Circuit::qft_from_bitstring(&args.bits, true)?;
    print_result("Input state", format!("|{}⟩", args.bits));
    print_result("Qubits", circuit.num_qubits());
    print_result("Top-level operations", circuit.len());
    if args.show_qasm {
        println!("{}", emit(&circuit)?);
    }

    print_section("Passes");
    let stages = walk_pipeline(circuit, &config)?;
    for stage in &stages[1..] {
        print_result(
            &stage.name,
            format!(
                "{} ops, loops: {}, {:.2?}",
                stage.len(),
                stage.circuit.has_loops(),
                stage.elapsed
            ),
        );
        if args.show_qasm {
            println!("{}", emit(&stage.circuit)?);
        }
    }
    let lowered = &stages[stages.len() - 1].circuit;
    for (gate, count) in lowered.count_ops() {
        print_result(&format!("  {gate}"), count);
    }

    print_section("Schedule");
    let layers = schedule(lowered, &SchedulerConfig::from(&config))?;
    print_result("Commutation", format!("{commutation:?}"));
    print_result("Layers", layers.num_layers());
    print_result("Widest layer", layers.max_layer_width());
    print_result("Parallelism", format!("{:.2}x", layers.parallelism_factor()));
    if args.show_qasm {
        println!("{}", emit_schedule(&layers)?);
    }

    print_section("Execution");
    let device = SimulatorDevice::new().with_seed(args.seed);
    let spinner = create_spinner(&format!("Sampling {} shots...", args.shots));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    let result = device.execute(&layers, args.shots).await;
    spinner.finish_and_clear();
    let result = result?;

    let width = args.bits.len();
    let chi2 = chi_square_uniform(&result.counts, width);
    print_result("Distinct outcomes", result.counts.len());
    print_result("χ²", format!("{chi2:.2}"));

    println!();
    if width == 4 {
        print_result("Critical value (p = 0.001)", CHI_SQUARE_CRITICAL_15);
        if chi2 < CHI_SQUARE_CRITICAL_15 {
            print_success("Outcomes are uniform");
        } else {
            print_failure("Outcomes are not uniform");
        }
    } else {
        print_info("Critical value is tabulated for 4-qubit inputs only");
    }
    Ok(())
}
