//! Structured move records and flags derived from them

use serde::{Deserialize, Serialize};

use crate::piece::{Color, PieceId, PieceKind};

/// Destination token carried by a pass
pub const PASS_TOKEN: &str = "pass";

/// Destination token of a placement with no reference piece
pub const DETACHED_TOKEN: &str = ".";

/// One move of a game, as read from the log
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// 0-based position in the game's move list
    pub turn_index: usize,
    pub player: Color,
    /// `None` for a pass
    #[serde(rename = "piece_moved")]
    pub piece: Option<PieceId>,
    /// Relative destination such as `wG1-`, `\wQ` or `bA2`
    #[serde(rename = "destination")]
    pub destination_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagonal: Option<i32>,
}

impl MoveRecord {
    pub fn pass(turn_index: usize, player: Color) -> Self {
        Self {
            turn_index,
            player,
            piece: None,
            destination_token: Some(PASS_TOKEN.to_string()),
            row: None,
            diagonal: None,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.piece.is_none() || self.destination_token.as_deref() == Some(PASS_TOKEN)
    }
}

/// True when any move after the first uses the detached `.` destination
pub fn has_detached_destination(moves: &[MoveRecord]) -> bool {
    moves
        .iter()
        .skip(1)
        .any(|m| m.destination_token.as_deref().is_some_and(|d| d.contains(DETACHED_TOKEN)))
}

/// Expansion pieces seen in a game
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameFlags {
    pub ladybug: bool,
    pub mosquito: bool,
    pub pillbug: bool,
}

impl GameFlags {
    pub fn from_moves(moves: &[MoveRecord]) -> Self {
        let uses = |kind: PieceKind| moves.iter().any(|m| m.piece.is_some_and(|p| p.kind == kind));
        Self {
            ladybug: uses(PieceKind::Ladybug),
            mosquito: uses(PieceKind::Mosquito),
            pillbug: uses(PieceKind::Pillbug),
        }
    }

    /// `(field name, value)` pairs, for partial document updates
    pub fn fields(&self) -> [(&'static str, bool); 3] {
        [
            ("ladybug", self.ladybug),
            ("mosquito", self.mosquito),
            ("pillbug", self.pillbug),
        ]
    }
}
