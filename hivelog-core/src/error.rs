//! Error taxonomy for parsing and replaying one game
//!
//! Every variant is fatal for the game it came from and for nothing else.

use serde::{Deserialize, Serialize};

use crate::piece::PieceId;

/// Why a game log could not be turned into a move list
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: unclassified line {content:?}")]
    UnclassifiedLine { line: usize, content: String },

    #[error("line {line}: malformed move {content:?} ({reason})")]
    MalformedMove {
        line: usize,
        content: String,
        reason: String,
    },

    #[error("line {line}: no color token in pick {content:?}")]
    AmbiguousPick { line: usize, content: String },

    #[error("line {line}: cannot tell who passed in {content:?}")]
    AmbiguousPass { line: usize, content: String },

    #[error("line {line}: player {player_id} has no color yet")]
    UnassignedPlayer { line: usize, player_id: u8 },

    #[error("line {line}: unknown-piece placeholder in {content:?}")]
    ReservedPieceToken { line: usize, content: String },

    #[error("line {line}: log continues past a segment marker {content:?}")]
    MultiPartLog { line: usize, content: String },

    #[error("no start marker in log")]
    MissingStart,
}

impl ParseError {
    /// 1-based line the failure points at, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::UnclassifiedLine { line, .. }
            | ParseError::MalformedMove { line, .. }
            | ParseError::AmbiguousPick { line, .. }
            | ParseError::AmbiguousPass { line, .. }
            | ParseError::UnassignedPlayer { line, .. }
            | ParseError::ReservedPieceToken { line, .. }
            | ParseError::MultiPartLog { line, .. } => Some(*line),
            ParseError::MissingStart => None,
        }
    }

    pub fn kind(&self) -> RejectionKind {
        match self {
            ParseError::UnclassifiedLine { .. } => RejectionKind::UnclassifiedLine,
            ParseError::MalformedMove { .. } => RejectionKind::MalformedMove,
            ParseError::AmbiguousPick { .. } => RejectionKind::AmbiguousPick,
            ParseError::AmbiguousPass { .. } => RejectionKind::AmbiguousPass,
            ParseError::UnassignedPlayer { .. } => RejectionKind::UnassignedPlayer,
            ParseError::ReservedPieceToken { .. } => RejectionKind::ReservedPieceToken,
            ParseError::MultiPartLog { .. } => RejectionKind::MultiPartLog,
            ParseError::MissingStart => RejectionKind::MissingStart,
        }
    }
}

/// Why a move list could not be placed on the board
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error("move {move_index}: {reference} is not on the board")]
    UnresolvedReference { move_index: usize, reference: PieceId },

    #[error("move {move_index}: malformed destination {token:?}")]
    MalformedDestination { move_index: usize, token: String },

    #[error("move {move_index}: destination {token:?} lacks a color prefix")]
    MissingColorPrefix { move_index: usize, token: String },

    #[error("move {move_index}: no destination")]
    MissingDestination { move_index: usize },

    #[error("move {move_index}: detached destination after the first placement")]
    DetachedDestination { move_index: usize },
}

impl ReplayError {
    pub fn move_index(&self) -> usize {
        match self {
            ReplayError::UnresolvedReference { move_index, .. }
            | ReplayError::MalformedDestination { move_index, .. }
            | ReplayError::MissingColorPrefix { move_index, .. }
            | ReplayError::MissingDestination { move_index }
            | ReplayError::DetachedDestination { move_index } => *move_index,
        }
    }

    pub fn kind(&self) -> RejectionKind {
        match self {
            ReplayError::UnresolvedReference { .. } => RejectionKind::UnresolvedReference,
            ReplayError::MalformedDestination { .. } => RejectionKind::MalformedDestination,
            ReplayError::MissingColorPrefix { .. } => RejectionKind::MissingColorPrefix,
            ReplayError::MissingDestination { .. } => RejectionKind::MissingDestination,
            ReplayError::DetachedDestination { .. } => RejectionKind::DetachedDestination,
        }
    }
}

/// Flat tag for counting rejections across many games
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    UnclassifiedLine,
    MalformedMove,
    AmbiguousPick,
    AmbiguousPass,
    UnassignedPlayer,
    ReservedPieceToken,
    MultiPartLog,
    MissingStart,
    UnresolvedReference,
    MalformedDestination,
    MissingColorPrefix,
    MissingDestination,
    DetachedDestination,
}
