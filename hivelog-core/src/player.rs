//! Player-id to color inference
//!
//! Logs number the two seats `P0`/`P1` without saying who plays white. The
//! first pick line that names a color settles both seats for the whole game.

use serde::{Deserialize, Serialize};

use crate::classify::LogLine;
use crate::piece::{Color, PieceKind};

/// Pick keyword that lifts a tile off the board
const BOARD_PICK: &str = "pickb";

/// Seat-to-color mapping for one game
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerColorAssignment {
    seats: [Option<Color>; 2],
}

impl PlayerColorAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fully assigned mapping with `player_id` playing `color`
    pub fn with(player_id: u8, color: Color) -> Self {
        let mut assignment = Self::new();
        assignment.assign(player_id, color);
        assignment
    }

    pub fn color_of(&self, player_id: u8) -> Option<Color> {
        self.seats.get(player_id as usize).copied().flatten()
    }

    pub fn is_complete(&self) -> bool {
        self.seats.iter().all(Option::is_some)
    }

    /// Assign `player_id` and give the other seat the opposite color.
    ///
    /// Returns false and changes nothing once the seats are set.
    pub fn assign(&mut self, player_id: u8, color: Color) -> bool {
        if self.is_complete() || player_id > 1 {
            return false;
        }
        self.seats[player_id as usize] = Some(color);
        self.seats[1 - player_id as usize] = Some(color.opposite());
        true
    }
}

/// A pick line that named no usable color
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AmbiguousPick;

/// Per-game resolver state; create one for each game
#[derive(Clone, Debug, Default)]
pub struct PlayerColorResolver {
    assignment: PlayerColorAssignment,
    /// First ambiguous pick still waiting for a resolvable one
    pending: Option<(usize, String)>,
}

impl PlayerColorResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assignment(&self) -> &PlayerColorAssignment {
        &self.assignment
    }

    /// Ambiguous pick seen before the seats were settled, as `(line, content)`
    pub fn pending_ambiguity(&self) -> Option<&(usize, String)> {
        self.pending.as_ref()
    }

    /// Read a pick line's seat and color.
    ///
    /// Tries, in order: a color word right after the keyword, a color word
    /// anywhere later, then the color prefix of the picked piece.
    ///
    /// A board pick (`pickb <row> <diagonal> <piece>`) names a cell, and rows
    /// `B` and `W` exist, so only its piece prefix is read.
    pub fn resolve(line: &LogLine<'_>) -> Result<(u8, Color), AmbiguousPick> {
        let player_id = line.player_id.ok_or(AmbiguousPick)?;
        let tokens = line.tokens();
        let args = tokens.get(1..).unwrap_or_default();
        let from_piece = args.last().and_then(|t| piece_color(t));

        let board_pick = tokens
            .first()
            .is_some_and(|a| a.eq_ignore_ascii_case(BOARD_PICK));
        if board_pick {
            return from_piece.map(|color| (player_id, color)).ok_or(AmbiguousPick);
        }

        let adjacent = args.first().and_then(|t| Color::from_word(t));
        let later = || args.iter().skip(1).find_map(|t| Color::from_word(t));

        adjacent
            .or_else(later)
            .or(from_piece)
            .map(|color| (player_id, color))
            .ok_or(AmbiguousPick)
    }

    /// Feed one pick line. Inert once both seats are known.
    pub fn observe_pick(&mut self, line_no: usize, line: &LogLine<'_>) {
        if self.assignment.is_complete() {
            return;
        }
        match Self::resolve(line) {
            Ok((player_id, color)) => {
                tracing::debug!(line = line_no, player_id, %color, "seat colors resolved from pick");
                self.assignment.assign(player_id, color);
                self.pending = None;
            }
            Err(AmbiguousPick) => {
                tracing::trace!(line = line_no, "pick names no color");
                if self.pending.is_none() {
                    self.pending = Some((line_no, line.raw.to_string()));
                }
            }
        }
    }
}

/// Color of a piece token like `wG1`; `B1` has none
fn piece_color(token: &str) -> Option<Color> {
    let mut chars = token.chars();
    let color = chars.next().and_then(Color::from_prefix)?;
    chars.next().and_then(PieceKind::from_letter)?;
    Some(color)
}
