//! hivelog core - Hive game log parsing and board reconstruction
//!
//! This crate turns boardspace-style Hive logs into structured moves and
//! replays them onto a hex board:
//! - Piece identity and notation (`wA1`, `bQ`)
//! - HECS hex geometry
//! - Line classification and per-game seat color inference
//! - Versioned move grammar and the game log state machine
//! - Board replay with stack settling

pub mod piece;
pub mod hecs;
pub mod error;
pub mod record;
pub mod classify;
pub mod player;
pub mod grammar;
pub mod parser;
pub mod replay;

// Re-exports for convenient access
pub use piece::{Color, PieceId, PieceKind, PIECE_KINDS, RESERVED_PIECE_MARKER};
pub use hecs::{Direction, HexCoordinate, DIRECTIONS, ORIGIN};
pub use error::{ParseError, RejectionKind, ReplayError};
pub use record::{has_detached_destination, GameFlags, MoveRecord, PASS_TOKEN};
pub use classify::{classify, LineKind, LogLine};
pub use player::{PlayerColorAssignment, PlayerColorResolver};
pub use grammar::{clean_destination, MoveAction, MoveTokenParser, NotationVersion};
pub use parser::{parse_game, GameLogParser, ParsedGame, ParserState};
pub use replay::{replay, BoardOccupancy, BoardReconstructor, Destination, TimelineStep};
