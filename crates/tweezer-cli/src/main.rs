//! Tweezer Command-Line Interface
//!
//! Compiles circuits in the Tweezer QASM dialect for neutral-atom arrays,
//! runs them on the local simulator, and checks the QFT benchmark.
//!
//! ```text
//! tweezer compile -i qft.qasm --parallelize --schedule qft.layers.qasm
//! tweezer run -i qft.qasm --shots 4096 --seed 7
//! tweezer qft 0101 --shots 10000 --json
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::PipelineArgs;
use commands::{compile, qft, run, version};

/// Tweezer - neutral-atom circuit compilation
#[derive(Parser)]
#[command(name = "tweezer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lower a circuit to the native gate set and schedule it
    Compile {
        /// Input file (.qasm)
        #[arg(short, long)]
        input: String,

        /// Output file for the lowered circuit
        #[arg(short, long)]
        output: Option<String>,

        /// Also write the layered schedule to this file
        #[arg(long)]
        schedule: Option<String>,

        /// Print compilation statistics as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Compile a circuit and run it on the simulator
    Run {
        /// Input file (.qasm)
        #[arg(short, long)]
        input: String,

        /// Number of shots
        #[arg(short, long, default_value = "1024")]
        shots: u32,

        /// Seed for reproducible sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Print counts as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Run the QFT of a basis state and test the outcomes for uniformity
    Qft {
        /// Basis state to transform, e.g. 0101
        bits: String,

        /// Build the QFT with loop blocks instead of a flat gate list
        #[arg(long)]
        looped: bool,

        /// Number of shots
        #[arg(short, long, default_value = "10000")]
        shots: u32,

        /// Seed for reproducible sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Compile {
            input,
            output,
            schedule,
            json,
            pipeline,
        } => compile::execute(&input, output.as_deref(), schedule.as_deref(), json, &pipeline),

        Commands::Run {
            input,
            shots,
            seed,
            json,
            pipeline,
        } => run::execute(&input, shots, seed, json, &pipeline).await,

        Commands::Qft {
            bits,
            looped,
            shots,
            seed,
            json,
            pipeline,
        } => qft::execute(&bits, looped, shots, seed, json, &pipeline).await,

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
