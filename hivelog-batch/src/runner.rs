//! Game runner - processes single game logs
//!
//! Level 3 - Step-level implementation

use std::path::Path;

use hivelog_core::{
    has_detached_destination, parse_game, replay, GameFlags, ParseError, RejectionKind, ReplayError,
};
use thiserror::Error;

use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::sink::{GameDocument, GameSink};
use crate::source::read_log_lines;

/// What happened to one game that was not rejected
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameOutcome {
    /// Parsed and persisted
    Stored { key: String, moves: usize, flags: GameFlags },
    /// Already in the sink
    Skipped { key: String },
}

impl GameOutcome {
    pub fn key(&self) -> &str {
        match self {
            GameOutcome::Stored { key, .. } | GameOutcome::Skipped { key } => key,
        }
    }
}

/// Why a single game did not make it into the sink
#[derive(Debug, Error)]
pub enum GameFailure {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error("detached destination after the first move")]
    Detached,

    #[error(transparent)]
    Batch(#[from] BatchError),
}

impl GameFailure {
    /// Rejection tag, or `None` for I/O and sink failures
    pub fn rejection(&self) -> Option<RejectionKind> {
        match self {
            GameFailure::Parse(e) => Some(e.kind()),
            GameFailure::Replay(e) => Some(e.kind()),
            GameFailure::Detached => Some(RejectionKind::DetachedDestination),
            GameFailure::Batch(_) => None,
        }
    }
}

/// A failed game, tagged with its key
#[derive(Debug, Error)]
#[error("{key}: {source}")]
pub struct GameError {
    pub key: String,
    pub source: GameFailure,
}

/// Runs the per-game pipeline against a shared sink
pub struct GameRunner<'a> {
    config: &'a BatchConfig,
    sink: &'a dyn GameSink,
}

impl<'a> GameRunner<'a> {
    pub fn new(config: &'a BatchConfig, sink: &'a dyn GameSink) -> Self {
        Self { config, sink }
    }

    pub fn config(&self) -> &BatchConfig {
        self.config
    }

    /// Process one log file stored under `key`
    pub fn run(&self, key: &str, path: &Path) -> Result<GameOutcome, GameError> {
        self.run_inner(key, || read_log_lines(path))
            .map_err(|source| GameError { key: key.to_string(), source })
    }

    /// Process lines already in memory
    pub fn run_lines(&self, key: &str, lines: &[String]) -> Result<GameOutcome, GameError> {
        self.run_inner(key, || Ok(lines.to_vec()))
            .map_err(|source| GameError { key: key.to_string(), source })
    }

    fn run_inner<F>(&self, key: &str, load: F) -> Result<GameOutcome, GameFailure>
    where
        F: FnOnce() -> Result<Vec<String>, BatchError>,
    {
        if self.config.skip_existing && self.sink.contains(key)? {
            tracing::debug!(key, "already stored, skipping");
            return Ok(GameOutcome::Skipped { key: key.to_string() });
        }

        let lines = load()?;
        let parsed = parse_game(&lines)?;

        if self.config.drop_detached && has_detached_destination(&parsed.moves) {
            return Err(GameFailure::Detached);
        }
        if self.config.replay_check {
            replay(&parsed.moves)?;
        }

        let flags = GameFlags::from_moves(&parsed.moves);
        let document = GameDocument::new(key, &parsed.moves).with_flags(flags);
        self.sink.store_document(key, &document)?;

        tracing::debug!(key, moves = parsed.moves.len(), "game stored");
        Ok(GameOutcome::Stored {
            key: key.to_string(),
            moves: parsed.moves.len(),
            flags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::sink::MemorySink;

    /// Fails the first store, refuses field updates
    #[derive(Default)]
    struct CrashingSink {
        inner: MemorySink,
        crashed: AtomicBool,
    }

    fn crash() -> BatchError {
        BatchError::Io(std::io::Error::new(std::io::ErrorKind::Other, "crash"))
    }

    impl GameSink for CrashingSink {
        fn contains(&self, key: &str) -> Result<bool, BatchError> {
            self.inner.contains(key)
        }

        fn store_document(&self, key: &str, document: &GameDocument) -> Result<(), BatchError> {
            if !self.crashed.swap(true, Ordering::SeqCst) {
                return Err(crash());
            }
            self.inner.store_document(key, document)
        }

        fn update_fields(&self, _key: &str, _fields: &[(&str, bool)]) -> Result<(), BatchError> {
            Err(crash())
        }
    }

    fn lines(body: &[&str]) -> Vec<String> {
        ["(;", "SU[hive]", "; P0[0 start P0]", "; P0[1 Pick W 1 wL]"]
            .iter()
            .chain(body)
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_stores_moves_and_flags() {
        let sink = MemorySink::new();
        let config = BatchConfig::default();
        let runner = GameRunner::new(&config, &sink);

        let outcome = runner
            .run_lines("g1", &lines(&["; P0[2 dropb wL N 13 .]", "; P1[3 dropb bM O 13 wL-]"]))
            .unwrap();
        assert_eq!(
            outcome,
            GameOutcome::Stored {
                key: "g1".to_string(),
                moves: 2,
                flags: GameFlags { ladybug: true, mosquito: true, pillbug: false },
            }
        );

        let doc = sink.get("g1").unwrap();
        assert_eq!(doc["moves"].as_array().map(Vec::len), Some(2));
        assert_eq!(doc["pillbug"], false);
    }

    #[test]
    fn test_rejected_game_not_stored() {
        let sink = MemorySink::new();
        let config = BatchConfig::default();
        let runner = GameRunner::new(&config, &sink);

        let err = runner
            .run_lines("bad", &lines(&["; P0[2 dropb wL N 13 .]", "; P0[3 juggle]"]))
            .unwrap_err();
        assert_eq!(err.key, "bad");
        assert_eq!(err.source.rejection(), Some(RejectionKind::UnclassifiedLine));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_detached_policy() {
        let body = ["; P0[2 dropb wL N 13 .]", "; P1[3 dropb bQ O 13 .]"];
        let sink = MemorySink::new();

        let strict = BatchConfig::default().with_replay_check(false);
        let err = GameRunner::new(&strict, &sink).run_lines("d", &lines(&body)).unwrap_err();
        assert_eq!(err.source.rejection(), Some(RejectionKind::DetachedDestination));

        let lenient = BatchConfig::default()
            .with_drop_detached(false)
            .with_replay_check(false);
        assert!(GameRunner::new(&lenient, &sink).run_lines("d", &lines(&body)).is_ok());
    }

    #[test]
    fn test_replay_check_rejects_unknown_reference() {
        let sink = MemorySink::new();
        let config = BatchConfig::default();
        let err = GameRunner::new(&config, &sink)
            .run_lines("r", &lines(&["; P0[2 dropb wL N 13 .]", "; P1[3 dropb bQ O 13 wA3-]"]))
            .unwrap_err();
        assert_eq!(err.source.rejection(), Some(RejectionKind::UnresolvedReference));
    }

    #[test]
    fn test_skip_existing() {
        let sink = MemorySink::new();
        let config = BatchConfig::default().with_skip_existing(true);
        let runner = GameRunner::new(&config, &sink);
        let game = lines(&["; P0[2 dropb wL N 13 .]"]);

        assert!(matches!(runner.run_lines("s", &game), Ok(GameOutcome::Stored { .. })));
        assert_eq!(
            runner.run_lines("s", &game).unwrap(),
            GameOutcome::Skipped { key: "s".to_string() }
        );
    }

    #[test]
    fn test_game_written_with_flags_in_one_step() {
        let sink = CrashingSink::default();
        let config = BatchConfig::default().with_skip_existing(true);
        let runner = GameRunner::new(&config, &sink);
        let game = lines(&["; P0[2 dropb wL N 13 .]"]);

        // A failed write leaves nothing behind that a rerun would skip
        let err = runner.run_lines("c", &game).unwrap_err();
        assert!(matches!(err.source, GameFailure::Batch(BatchError::Io(_))));
        assert!(!sink.contains("c").unwrap());

        assert!(matches!(runner.run_lines("c", &game), Ok(GameOutcome::Stored { .. })));
        let doc = sink.inner.get("c").unwrap();
        assert_eq!(doc["ladybug"], true);
        assert_eq!(doc["mosquito"], false);
        assert_eq!(doc["moves"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_missing_file_is_not_a_rejection() {
        let sink = MemorySink::new();
        let config = BatchConfig::default();
        let err = GameRunner::new(&config, &sink)
            .run("gone", Path::new("/definitely/not/here.sgf"))
            .unwrap_err();
        assert!(matches!(err.source, GameFailure::Batch(BatchError::Io(_))));
        assert_eq!(err.source.rejection(), None);
    }
}
