//! Parse command - turn a directory of game logs into stored documents
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_config(), parse_logs(), report_results()
//! - Level 3: make_progress_bar()
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use hivelog_batch::{discover_logs, process_logs, BatchConfig, BatchReport, GameError, GameOutcome, JsonDirSink};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct ParseArgs {
    /// Directory searched recursively for game logs
    #[arg(value_name = "DIR")]
    pub input: PathBuf,

    /// Directory receiving one JSON document per game
    #[arg(long, short, value_name = "DIR")]
    pub out: PathBuf,

    /// Batch configuration JSON file; flags below override it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Worker threads (0 = one per core)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Log file extension
    #[arg(long)]
    pub extension: Option<String>,

    /// Skip games already in the output directory
    #[arg(long)]
    pub skip_existing: bool,

    /// Keep games that use a detached destination after the first move
    #[arg(long)]
    pub keep_detached: bool,

    /// Store games without replaying them first
    #[arg(long)]
    pub no_replay_check: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub quiet: bool,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run parse command
///
/// 1. Build the batch configuration
/// 2. Parse every log into the output directory
/// 3. Report results
pub fn run(args: ParseArgs) -> Result<()> {
    let config = load_config(&args)?;

    tracing::info!(
        "Parsing logs under {} into {} ({} threads)",
        args.input.display(),
        args.out.display(),
        config.threads
    );

    let report = parse_logs(&args, &config)?;

    report_results(&report, &args)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Config file (if any) with command-line overrides applied
fn load_config(args: &ParseArgs) -> Result<BatchConfig> {
    let mut config = match &args.config {
        Some(path) => BatchConfig::load(path)
            .with_context(|| format!("Failed to load batch config: {}", path.display()))?,
        None => BatchConfig::default(),
    };

    if let Some(threads) = args.threads {
        config = config.with_threads(threads);
    }
    if let Some(extension) = &args.extension {
        config = config.with_extension(extension.as_str());
    }
    if args.skip_existing {
        config = config.with_skip_existing(true);
    }
    if args.keep_detached {
        config = config.with_drop_detached(false);
    }
    if args.no_replay_check {
        config = config.with_replay_check(false);
    }
    Ok(config)
}

/// Discover and parse all logs
fn parse_logs(args: &ParseArgs, config: &BatchConfig) -> Result<BatchReport> {
    let paths = discover_logs(&args.input, &config.extension)
        .with_context(|| format!("Failed to read log directory: {}", args.input.display()))?;
    let sink = JsonDirSink::create(&args.out)
        .with_context(|| format!("Failed to create output directory: {}", args.out.display()))?;

    let bar = make_progress_bar(paths.len() as u64, args.quiet);
    let progress = |_: &Result<GameOutcome, GameError>| bar.inc(1);
    let report = process_logs(&args.input, &paths, config, &sink, Some(&progress))
        .context("Batch run failed")?;
    bar.finish_and_clear();

    Ok(report)
}

/// Report batch results
fn report_results(report: &BatchReport, args: &ParseArgs) -> Result<()> {
    if args.json {
        let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        print_text_report(report);
    }
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn make_progress_bar(len: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} games {elapsed_precise}") {
        bar.set_style(style);
    }
    bar
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn percent(part: usize, whole: usize) -> f32 {
    if whole > 0 {
        part as f32 / whole as f32 * 100.0
    } else {
        0.0
    }
}

/// Print report as text
fn print_text_report(report: &BatchReport) {
    let processed = report.stored + report.rejected + report.failed;

    println!("\n=== Batch Results ===");
    println!("Discovered:  {}", report.discovered);
    println!("Stored:      {} ({:.1}%)", report.stored, percent(report.stored, processed));
    println!("Skipped:     {}", report.skipped);
    println!("Rejected:    {} ({:.1}%)", report.rejected, percent(report.rejected, processed));
    println!("Failed:      {}", report.failed);
    println!("Moves:       {}", report.moves);

    if !report.rejections.is_empty() {
        println!("\nRejections:");
        for (kind, count) in &report.rejections {
            println!("  {:<24} {}", format!("{:?}", kind), count);
        }
    }

    if !report.failures.is_empty() {
        println!("\nGames not stored:");
        for failure in &report.failures {
            println!("  {}: {}", failure.key, failure.message);
        }
    }
    println!("\nFinished at {}", report.finished_at.to_rfc3339());
}

// ============================================================================
// TESTS
// ============================================================================
