//! hivelog batch - Parsing many game logs into a persistence sink
//!
//! This crate provides the batch pipeline around hivelog-core:
//! - Log discovery and Latin-1 loading
//! - Per-game parse, replay check and derived flags
//! - Parallel processing on a rayon pool
//! - JSON-file and in-memory sinks
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run_batch (orchestration)
//! - Level 2: process_logs (phases)
//! - Level 3: GameRunner::run (steps)
//! - Level 4: sources, sinks, configuration

mod batch;
mod config;
mod error;
mod runner;
mod sink;
mod source;

pub use batch::{process_logs, run_batch, BatchReport, FailedGame, ProgressFn};
pub use config::BatchConfig;
pub use error::BatchError;
pub use runner::{GameError, GameFailure, GameOutcome, GameRunner};
pub use sink::{GameDocument, GameSink, JsonDirSink, MemorySink};
pub use source::{discover_logs, game_key, read_log_lines};
