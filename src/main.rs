//! memsym - TLB / linear page table trace simulator
//!
//! Usage: memsym [OPTIONS] <STRATEGY> <INPUT_TRACE> <OUTPUT_TRACE>
//!
//! Arguments:
//!   STRATEGY      - TLB replacement strategy, FIFO or LRU
//!   INPUT_TRACE   - Instruction trace to execute
//!   OUTPUT_TRACE  - File receiving one line per executed outcome
//!
//! Options:
//!   -v, --verbose  Print debug diagnostics to stderr (RUST_LOG overrides)
//!   -h, --help     Print help information

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use memsym::io::{read_trace, TraceLog};
use memsym::{SimError, Simulator, Strategy};

#[derive(Parser)]
#[command(name = "memsym")]
#[command(about = "Simulates a TLB in front of per-process linear page tables")]
#[command(version)]
struct Cli {
    /// TLB replacement strategy (FIFO or LRU)
    strategy: Strategy,

    /// Input trace file
    input_trace: PathBuf,

    /// Output trace file
    output_trace: PathBuf,

    /// Print detailed diagnostics
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    // Run the simulator and handle any errors
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main logic separated from main() for cleaner error handling
fn run(cli: &Cli) -> Result<(), SimError> {
    info!(
        "strategy {}, trace {}, output {}",
        cli.strategy,
        cli.input_trace.display(),
        cli.output_trace.display()
    );

    let trace = read_trace(&cli.input_trace)?;
    let mut log = TraceLog::create(&cli.output_trace)?;

    let mut sim = Simulator::new(cli.strategy);
    let result = sim.run(&trace, &mut log);
    sim.dump_state();

    let summary = result?;
    info!(
        "{} instructions executed, {} lines written to {}",
        summary.instructions,
        summary.log_lines,
        cli.output_trace.display()
    );
    Ok(())
}
