//! DICE CLI: runs gate-level arcade circuit simulations from the command line.
//!
//! Provides `dice run` for running a built-in board (optionally dumping a
//! state trace), `dice demos` for listing the boards, and `dice trace` for
//! hashing, comparing and printing state dumps.

#![warn(missing_docs)]

mod demos;
mod pipeline;
mod run;
mod trace;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// DICE, a discrete integrated circuit emulator.
#[derive(Parser, Debug)]
#[command(name = "dice", version, about = "Discrete-logic arcade board simulator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a `dice.toml` file or the directory holding it.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a built-in board.
    Run(RunArgs),
    /// List the built-in boards.
    Demos,
    /// Inspect state dumps.
    #[command(subcommand)]
    Trace(TraceCommand),
}

/// Arguments for the `dice run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Name of the board to run (see `dice demos`).
    pub demo: String,

    /// Simulated time to run for (e.g., "500us", "2ms", "1s").
    #[arg(long, default_value = "100ms")]
    pub time: String,

    /// Dump the state of every chip into DIR, sampled as `[recorder] mode` says.
    #[arg(long, value_name = "DIR", conflicts_with = "dump_state_frame")]
    pub dump_state: Option<String>,

    /// Dump the state of every chip at each video frame into DIR.
    #[arg(long, value_name = "DIR")]
    pub dump_state_frame: Option<String>,

    /// Run as fast as possible instead of pacing against the wall clock.
    #[arg(long)]
    pub no_throttle: bool,

    /// Output format for diagnostics and the run summary.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// `dice trace` subcommands.
#[derive(Subcommand, Debug)]
pub enum TraceCommand {
    /// Print the content hash of a dump's trace.
    Hash {
        /// Dump directory.
        dir: String,
    },
    /// Compare two dumps and report the first difference.
    Diff {
        /// First dump directory.
        left: String,
        /// Second dump directory.
        right: String,
    },
    /// Print the records of a dump.
    Show {
        /// Dump directory.
        dir: String,
        /// Maximum number of records to print.
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a settings file or its directory.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Run(ref args) => run::run(args, &global),
        Command::Demos => demos::list(&global),
        Command::Trace(ref cmd) => trace::run(cmd, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Default log filter for the given flags; `RUST_LOG` overrides it.
fn default_filter(global: &GlobalArgs) -> &'static str {
    if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    }
}

/// Installs the `tracing` subscriber writing to stderr.
fn init_logging(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(global)));
    // A subscriber may already be installed when running under a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(global.color)
        .with_target(false)
        .try_init();
}
