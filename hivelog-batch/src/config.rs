//! Configuration types for batch parsing
//!
//! Level 4 - Utilities and configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BatchError;

/// Batch run configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads (0 = one per core)
    pub threads: usize,
    /// File extension of game logs, without the dot
    pub extension: String,
    /// Replay every parsed game and reject those that fail
    pub replay_check: bool,
    /// Reject games that use a detached destination after the first move
    pub drop_detached: bool,
    /// Skip games the sink already holds
    pub skip_existing: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            extension: "sgf".to_string(),
            replay_check: true,
            drop_detached: true,
            skip_existing: false,
        }
    }
}

impl BatchConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self, BatchError> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Set worker thread count
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set log file extension
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn with_replay_check(mut self, replay_check: bool) -> Self {
        self.replay_check = replay_check;
        self
    }

    pub fn with_drop_detached(mut self, drop_detached: bool) -> Self {
        self.drop_detached = drop_detached;
        self
    }

    pub fn with_skip_existing(mut self, skip_existing: bool) -> Self {
        self.skip_existing = skip_existing;
        self
    }
}
