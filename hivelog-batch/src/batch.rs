//! Batch parsing - many game logs on a worker pool
//!
//! Level 2 - Phase-level implementation

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use hivelog_core::RejectionKind;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::runner::{GameError, GameOutcome, GameRunner};
use crate::sink::GameSink;
use crate::source::{discover_logs, game_key};

/// Called once per finished game, from worker threads
pub type ProgressFn<'a> = &'a (dyn Fn(&Result<GameOutcome, GameError>) + Sync);

/// A game that did not make it into the sink
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedGame {
    pub key: String,
    /// `None` for I/O and sink failures
    pub kind: Option<RejectionKind>,
    pub message: String,
}

/// Summary of a batch run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Logs found under the root
    pub discovered: usize,
    pub stored: usize,
    pub skipped: usize,
    /// Games rejected by parsing, replay or the detached check
    pub rejected: usize,
    /// Games lost to I/O or sink errors
    pub failed: usize,
    /// Moves across all stored games
    pub moves: usize,
    pub rejections: BTreeMap<RejectionKind, usize>,
    pub failures: Vec<FailedGame>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    /// Create empty report
    pub fn empty() -> Self {
        Self {
            discovered: 0,
            stored: 0,
            skipped: 0,
            rejected: 0,
            failed: 0,
            moves: 0,
            rejections: BTreeMap::new(),
            failures: Vec::new(),
            finished_at: Utc::now(),
        }
    }

    /// Fraction of processed games that were stored
    pub fn acceptance_rate(&self) -> f32 {
        let processed = self.stored + self.rejected + self.failed;
        if processed == 0 {
            0.0
        } else {
            self.stored as f32 / processed as f32
        }
    }
}

/// Parse every log under `root` into `sink` (Level 1 orchestration)
pub fn run_batch(
    root: &Path,
    config: &BatchConfig,
    sink: &dyn GameSink,
    progress: Option<ProgressFn<'_>>,
) -> Result<BatchReport, BatchError> {
    let paths = discover_logs(root, &config.extension)?;
    process_logs(root, &paths, config, sink, progress)
}

/// Parse the given logs in parallel (Level 2 phase)
///
/// Keys are the paths relative to `root`.
pub fn process_logs(
    root: &Path,
    paths: &[PathBuf],
    config: &BatchConfig,
    sink: &dyn GameSink,
    progress: Option<ProgressFn<'_>>,
) -> Result<BatchReport, BatchError> {
    tracing::info!(logs = paths.len(), threads = config.threads, "starting batch");
    if paths.is_empty() {
        return Ok(BatchReport::empty());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;
    let runner = GameRunner::new(config, sink);
    let results = pool.install(|| execute_games_parallel(root, paths, &runner, progress));

    let report = aggregate_results(paths.len(), results);
    tracing::info!(
        stored = report.stored,
        skipped = report.skipped,
        rejected = report.rejected,
        failed = report.failed,
        "batch finished"
    );
    Ok(report)
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// Run every game on the current pool
fn execute_games_parallel(
    root: &Path,
    paths: &[PathBuf],
    runner: &GameRunner<'_>,
    progress: Option<ProgressFn<'_>>,
) -> Vec<Result<GameOutcome, GameError>> {
    paths
        .par_iter()
        .map(|path| {
            let result = runner.run(&game_key(root, path), path);
            if let Err(e) = &result {
                tracing::warn!(key = %e.key, error = %e.source, "game rejected");
            }
            if let Some(report) = progress {
                report(&result);
            }
            result
        })
        .collect()
}

/// Aggregate game results into a batch report
fn aggregate_results(discovered: usize, results: Vec<Result<GameOutcome, GameError>>) -> BatchReport {
    let mut report = BatchReport::empty();
    report.discovered = discovered;

    for result in results {
        match result {
            Ok(GameOutcome::Stored { moves, .. }) => {
                report.stored += 1;
                report.moves += moves;
            }
            Ok(GameOutcome::Skipped { .. }) => report.skipped += 1,
            Err(e) => {
                let kind = e.source.rejection();
                match kind {
                    Some(kind) => {
                        report.rejected += 1;
                        *report.rejections.entry(kind).or_insert(0) += 1;
                    }
                    None => report.failed += 1,
                }
                report.failures.push(FailedGame {
                    key: e.key,
                    kind,
                    message: e.source.to_string(),
                });
            }
        }
    }

    // Workers finish out of order
    report.failures.sort_by(|a, b| a.key.cmp(&b.key));
    report.finished_at = Utc::now();
    report
}
