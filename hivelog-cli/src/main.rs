//! hivelog CLI - Command-line interface
//!
//! Commands:
//! - parse: Parse a directory of game logs into JSON documents
//! - replay: Reconstruct the board of one game as a timeline

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod parse_cmd;
mod replay_cmd;

#[derive(Parser)]
#[command(name = "hivelog")]
#[command(about = "Hive game log parser and board reconstructor")]
#[command(version)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse every game log under a directory
    Parse(parse_cmd::ParseArgs),
    /// Replay one game and print its board timeline
    Replay(replay_cmd::ReplayArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Parse(args) => parse_cmd::run(args),
        Commands::Replay(args) => replay_cmd::run(args),
    }
}

/// Logs go to stderr so JSON output on stdout stays clean
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
