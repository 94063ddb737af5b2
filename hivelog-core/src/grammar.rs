//! Move token extraction
//!
//! All notation variants live in one table of token shapes. A line matches a
//! shape when its body has exactly that many tokens; the first fitting shape
//! for the line's action wins.

use serde::{Deserialize, Serialize};

use crate::classify::{LineKind, LogLine};
use crate::error::ParseError;
use crate::piece::{Color, PieceId, RESERVED_PIECE_MARKER};
use crate::player::PlayerColorResolver;
use crate::record::MoveRecord;

/// Destination of a drop that puts the tile back in the player's reserve
pub const RACK_TOKEN: &str = "rack";

/// Move-bearing action, tagged by how its acting color is found
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveAction {
    /// Color from the seat tag and the assignment
    Drop,
    /// Color named by the keyword
    Move(Color),
    /// Color from the seat tag and the assignment
    Pass,
}

impl MoveAction {
    pub fn from_kind(kind: LineKind) -> Option<Self> {
        match kind {
            LineKind::Drop => Some(MoveAction::Drop),
            LineKind::MoveWhite => Some(MoveAction::Move(Color::White)),
            LineKind::MoveBlack => Some(MoveAction::Move(Color::Black)),
            LineKind::Pass => Some(MoveAction::Pass),
            _ => None,
        }
    }

    fn family(self) -> ShapeFamily {
        match self {
            MoveAction::Drop => ShapeFamily::Drop,
            MoveAction::Move(_) => ShapeFamily::Move,
            MoveAction::Pass => ShapeFamily::Pass,
        }
    }
}

/// Notation generation a shape belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NotationVersion {
    /// Row and diagonal written out
    V1,
    /// Destination only
    V2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShapeFamily {
    Drop,
    Move,
    Pass,
}

/// One token position in a shape
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Keyword,
    ColorWord,
    Piece,
    Row,
    Diagonal,
    Destination,
}

struct Shape {
    family: ShapeFamily,
    version: NotationVersion,
    slots: &'static [Slot],
}

static GRAMMAR: &[Shape] = &[
    Shape {
        family: ShapeFamily::Drop,
        version: NotationVersion::V1,
        slots: &[Slot::Keyword, Slot::Piece, Slot::Row, Slot::Diagonal, Slot::Destination],
    },
    Shape {
        family: ShapeFamily::Drop,
        version: NotationVersion::V2,
        slots: &[Slot::Keyword, Slot::Piece, Slot::Destination],
    },
    Shape {
        family: ShapeFamily::Move,
        version: NotationVersion::V1,
        slots: &[
            Slot::Keyword,
            Slot::ColorWord,
            Slot::Piece,
            Slot::Row,
            Slot::Diagonal,
            Slot::Destination,
        ],
    },
    Shape {
        family: ShapeFamily::Move,
        version: NotationVersion::V2,
        slots: &[Slot::Keyword, Slot::ColorWord, Slot::Piece, Slot::Destination],
    },
    Shape {
        family: ShapeFamily::Pass,
        version: NotationVersion::V1,
        slots: &[Slot::Keyword],
    },
];

/// Undo the log's backslash escaping (`\\` stands for a literal `\`)
pub fn clean_destination(token: &str) -> String {
    token.replace("\\\\", "\\")
}

/// Raw fields pulled out of a line by its shape
#[derive(Default)]
struct Fields<'a> {
    piece: Option<&'a str>,
    row: Option<&'a str>,
    diagonal: Option<&'a str>,
    destination: Option<&'a str>,
}

/// Turns one move-bearing line into a [`MoveRecord`]
pub struct MoveTokenParser<'r> {
    resolver: &'r PlayerColorResolver,
}

impl<'r> MoveTokenParser<'r> {
    pub fn new(resolver: &'r PlayerColorResolver) -> Self {
        Self { resolver }
    }

    /// Parse a line classified as `kind`.
    ///
    /// Returns `Ok(None)` for a drop back onto the rack.
    pub fn parse(
        &self,
        turn_index: usize,
        line_no: usize,
        line: &LogLine<'_>,
        kind: LineKind,
    ) -> Result<Option<MoveRecord>, ParseError> {
        let malformed = |reason: String| ParseError::MalformedMove {
            line: line_no,
            content: line.raw.to_string(),
            reason,
        };

        let action = MoveAction::from_kind(kind)
            .ok_or_else(|| malformed(format!("{:?} line carries no move", kind)))?;

        let tokens = line.tokens();
        if tokens.iter().skip(1).any(|t| t.contains(RESERVED_PIECE_MARKER)) {
            return Err(ParseError::ReservedPieceToken {
                line: line_no,
                content: line.raw.to_string(),
            });
        }

        let (version, fields) = match_shape(action.family(), &tokens)
            .ok_or_else(|| malformed(format!("no {:?} shape has {} tokens", action, tokens.len())))?;
        tracing::trace!(line = line_no, ?version, "matched notation shape");

        let player = self.acting_color(action, line_no, line)?;

        if action == MoveAction::Pass {
            return Ok(Some(MoveRecord::pass(turn_index, player)));
        }

        let destination = fields
            .destination
            .map(clean_destination)
            .ok_or_else(|| malformed("missing destination".to_string()))?;

        if action == MoveAction::Drop && destination.eq_ignore_ascii_case(RACK_TOKEN) {
            tracing::debug!(line = line_no, "drop back to rack ignored");
            return Ok(None);
        }

        let raw_piece = fields
            .piece
            .ok_or_else(|| malformed("missing piece".to_string()))?;
        let piece = PieceId::parse_with_color(raw_piece, player)
            .map_err(|e| malformed(e.to_string()))?;
        // Only moves may touch the opponent's tiles (pillbug)
        if action == MoveAction::Drop && piece.color != player {
            return Err(malformed(format!("{} dropped by {}", piece, player)));
        }

        let diagonal = fields
            .diagonal
            .map(|d| d.parse::<i32>().map_err(|_| malformed(format!("diagonal {:?} is not a number", d))))
            .transpose()?;

        Ok(Some(MoveRecord {
            turn_index,
            player,
            piece: Some(piece),
            destination_token: Some(destination),
            row: fields.row.map(str::to_string),
            diagonal,
        }))
    }

    /// Who made this move
    fn acting_color(&self, action: MoveAction, line_no: usize, line: &LogLine<'_>) -> Result<Color, ParseError> {
        let seat = match action {
            MoveAction::Move(color) => return Ok(color),
            MoveAction::Drop | MoveAction::Pass => line.player_id,
        };

        let color = seat.and_then(|id| self.resolver.assignment().color_of(id));
        match (color, action, seat) {
            (Some(color), _, _) => Ok(color),
            (None, MoveAction::Pass, _) => Err(ParseError::AmbiguousPass {
                line: line_no,
                content: line.raw.to_string(),
            }),
            (None, _, None) => Err(ParseError::MalformedMove {
                line: line_no,
                content: line.raw.to_string(),
                reason: "missing player tag".to_string(),
            }),
            (None, _, Some(player_id)) => match self.resolver.pending_ambiguity() {
                Some((pick_line, pick)) => Err(ParseError::AmbiguousPick {
                    line: *pick_line,
                    content: pick.clone(),
                }),
                None => Err(ParseError::UnassignedPlayer { line: line_no, player_id }),
            },
        }
    }
}

/// Find the first shape of `family` that fits `tokens`
fn match_shape<'a>(family: ShapeFamily, tokens: &[&'a str]) -> Option<(NotationVersion, Fields<'a>)> {
    GRAMMAR
        .iter()
        .filter(|s| s.family == family && s.slots.len() == tokens.len())
        .map(|s| {
            let mut fields = Fields::default();
            for (slot, &token) in s.slots.iter().zip(tokens) {
                match slot {
                    Slot::Keyword | Slot::ColorWord => {}
                    Slot::Piece => fields.piece = Some(token),
                    Slot::Row => fields.row = Some(token),
                    Slot::Diagonal => fields.diagonal = Some(token),
                    Slot::Destination => fields.destination = Some(token),
                }
            }
            (s.version, fields)
        })
        .next()
}
