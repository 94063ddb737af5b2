//! Board reconstruction
//!
//! Replays a move list onto a HECS occupancy map. Destinations in the log are
//! relative ("east of wG1", "on top of bQ"); each one is resolved against the
//! current position of its reference piece, then settled so no tile floats.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ReplayError;
use crate::hecs::{Direction, HexCoordinate, ORIGIN};
use crate::piece::{Color, PieceId, PieceTokenError};
use crate::record::{MoveRecord, DETACHED_TOKEN};

// ============================================================================
// OCCUPANCY
// ============================================================================

/// Where every placed tile currently sits
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoardOccupancy {
    positions: FxHashMap<PieceId, HexCoordinate>,
}

impl BoardOccupancy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, piece: PieceId) -> Option<HexCoordinate> {
        self.positions.get(&piece).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PieceId, HexCoordinate)> + '_ {
        self.positions.iter().map(|(&p, &c)| (p, c))
    }

    /// Tile at an exact position, ignoring `except`
    pub fn occupant_at(&self, coord: HexCoordinate, except: Option<PieceId>) -> Option<PieceId> {
        self.positions
            .iter()
            .find(|&(&p, &c)| c == coord && Some(p) != except)
            .map(|(&p, _)| p)
    }

    pub fn is_occupied(&self, coord: HexCoordinate, except: Option<PieceId>) -> bool {
        self.occupant_at(coord, except).is_some()
    }

    /// Position-keyed view of the board
    pub fn cells(&self) -> FxHashMap<HexCoordinate, PieceId> {
        self.positions.iter().map(|(&p, &c)| (c, p)).collect()
    }

    /// Tiles in one cell, bottom first
    pub fn stack_at(&self, cell: (u8, i32, i32)) -> Vec<(PieceId, HexCoordinate)> {
        let mut stack: Vec<_> = self.iter().filter(|(_, c)| c.cell() == cell).collect();
        stack.sort_by_key(|(_, c)| c.z);
        stack
    }

    /// True if every raised tile rests on another tile
    pub fn is_grounded(&self) -> bool {
        let cells = self.cells();
        cells
            .keys()
            .all(|c| c.below().map_or(true, |below| cells.contains_key(&below)))
    }

    /// Lowest resting height for `piece` near `nominal`.
    ///
    /// Climbs while the nominal spot is taken, then drops while the spot
    /// underneath is empty. `piece`'s own current entry counts as vacated.
    pub fn settle(&self, nominal: HexCoordinate, piece: PieceId) -> HexCoordinate {
        let mut coord = nominal;
        while self.is_occupied(coord, Some(piece)) {
            coord = coord.above();
        }
        while let Some(below) = coord.below() {
            if self.is_occupied(below, Some(piece)) {
                break;
            }
            coord = below;
        }
        coord
    }

    fn place(&mut self, piece: PieceId, coord: HexCoordinate) {
        self.positions.insert(piece, coord);
    }
}

// ============================================================================
// DESTINATIONS
// ============================================================================

/// A destination token, decoded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Destination {
    /// No reference (`.`), only valid for the first tile
    Detached,
    /// Neighboring cell of the reference
    Beside(PieceId, Direction),
    /// On top of the reference's stack
    Atop(PieceId),
}

impl Destination {
    pub fn parse(token: &str, move_index: usize) -> Result<Self, ReplayError> {
        if token == DETACHED_TOKEN {
            return Ok(Destination::Detached);
        }

        let malformed = || ReplayError::MalformedDestination {
            move_index,
            token: token.to_string(),
        };

        let mut body = token;
        let mut direction = None;
        if let Some(d) = body.chars().next().and_then(Direction::from_prefix) {
            direction = Some(d);
            body = &body[1..];
        }
        if let Some(d) = body.chars().last().and_then(Direction::from_suffix) {
            if direction.is_some() {
                return Err(malformed());
            }
            direction = Some(d);
            body = &body[..body.len() - 1];
        }

        let reference = body.parse::<PieceId>().map_err(|e| match e {
            PieceTokenError::MissingColor(_) if PieceId::parse_with_color(body, Color::White).is_ok() => {
                ReplayError::MissingColorPrefix {
                    move_index,
                    token: token.to_string(),
                }
            }
            _ => malformed(),
        })?;

        Ok(match direction {
            Some(d) => Destination::Beside(reference, d),
            None => Destination::Atop(reference),
        })
    }

    pub fn reference(&self) -> Option<PieceId> {
        match *self {
            Destination::Detached => None,
            Destination::Beside(p, _) | Destination::Atop(p) => Some(p),
        }
    }
}

// ============================================================================
// RECONSTRUCTOR
// ============================================================================

/// One replayed move and where its tile ended up (`None` for a pass)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineStep {
    #[serde(rename = "move")]
    pub record: MoveRecord,
    pub coordinate: Option<HexCoordinate>,
}

/// Incremental replay of one game.
///
/// Each reconstructor owns its board; build a new one per game.
#[derive(Clone, Debug, Default)]
pub struct BoardReconstructor {
    occupancy: BoardOccupancy,
    applied: usize,
}

impl BoardReconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occupancy(&self) -> &BoardOccupancy {
        &self.occupancy
    }

    /// Apply the next move and return the tile's settled position
    pub fn apply(&mut self, record: &MoveRecord) -> Result<Option<HexCoordinate>, ReplayError> {
        let move_index = self.applied;
        let piece = match record.piece {
            Some(piece) if !record.is_pass() => piece,
            _ => {
                self.applied += 1;
                return Ok(None);
            }
        };

        let target = if self.occupancy.is_empty() {
            ORIGIN
        } else {
            let nominal = self.nominal_target(record, move_index)?;
            self.occupancy.settle(nominal, piece)
        };

        if target.z > 0 {
            tracing::trace!(move_index, %piece, z = target.z, "stacked");
        }
        self.occupancy.place(piece, target);
        self.applied += 1;
        Ok(Some(target))
    }

    /// Unsettled target of a move relative to its reference piece
    fn nominal_target(&self, record: &MoveRecord, move_index: usize) -> Result<HexCoordinate, ReplayError> {
        let token = record
            .destination_token
            .as_deref()
            .ok_or(ReplayError::MissingDestination { move_index })?;

        let destination = Destination::parse(token, move_index)?;
        let reference = destination
            .reference()
            .ok_or(ReplayError::DetachedDestination { move_index })?;
        let at = self
            .occupancy
            .position(reference)
            .ok_or(ReplayError::UnresolvedReference { move_index, reference })?;

        Ok(match destination {
            Destination::Beside(_, direction) => at.neighbor(direction),
            Destination::Atop(_) | Destination::Detached => at.above(),
        })
    }
}

/// Replay a whole game on a fresh board
pub fn replay(moves: &[MoveRecord]) -> Result<Vec<TimelineStep>, ReplayError> {
    let mut board = BoardReconstructor::new();
    moves
        .iter()
        .map(|record| {
            let coordinate = board.apply(record)?;
            Ok(TimelineStep {
                record: record.clone(),
                coordinate,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(turn_index: usize, piece: &str, dest: &str) -> MoveRecord {
        let piece: PieceId = piece.parse().unwrap();
        MoveRecord {
            turn_index,
            player: piece.color,
            piece: Some(piece),
            destination_token: Some(dest.to_string()),
            row: None,
            diagonal: None,
        }
    }

    fn id(token: &str) -> PieceId {
        token.parse().unwrap()
    }

    #[test]
    fn test_first_move_at_origin() {
        for dest in [".", "wQ-", "anything"] {
            let steps = replay(&[mv(0, "bS1", dest)]).unwrap();
            assert_eq!(steps[0].coordinate, Some(HexCoordinate::new(0, 0, 0, 0)));
        }
    }

    #[test]
    fn test_pass_leaves_board_alone() {
        let moves = vec![
            mv(0, "wG1", "."),
            MoveRecord::pass(1, Color::Black),
            mv(2, "wQ", "wG1-"),
        ];
        let steps = replay(&moves).unwrap();
        assert_eq!(steps[1].coordinate, None);
        assert_eq!(steps[2].coordinate, Some(HexCoordinate::new(0, 0, 1, 0)));
    }

    #[test]
    fn test_leading_pass_does_not_claim_origin() {
        let moves = vec![MoveRecord::pass(0, Color::White), mv(1, "bG1", ".")];
        let steps = replay(&moves).unwrap();
        assert_eq!(steps[1].coordinate, Some(ORIGIN));
    }

    #[test]
    fn test_directions() {
        let moves = vec![
            mv(0, "wG1", "."),
            mv(1, "bG1", "/wG1"),
            mv(2, "wA1", "\\wG1"),
            mv(3, "bA1", "wG1/"),
            mv(4, "wA2", "wG1\\"),
            mv(5, "bA2", "-wG1"),
        ];
        let steps = replay(&moves).unwrap();
        let coords: Vec<_> = steps.iter().map(|s| s.coordinate.unwrap()).collect();
        assert_eq!(coords[1], HexCoordinate::new(1, 0, -1, 0));
        assert_eq!(coords[2], HexCoordinate::new(1, -1, -1, 0));
        assert_eq!(coords[3], HexCoordinate::new(1, -1, 0, 0));
        assert_eq!(coords[4], HexCoordinate::new(1, 0, 0, 0));
        assert_eq!(coords[5], HexCoordinate::new(0, 0, -1, 0));
    }

    #[test]
    fn test_stack_on_top() {
        let moves = vec![
            mv(0, "wQ", "."),
            mv(1, "bB1", "wQ-"),
            mv(2, "bB1", "wQ"),
            mv(3, "wB1", "bB1"),
        ];
        let mut board = BoardReconstructor::new();
        let coords: Vec<_> = moves.iter().map(|m| board.apply(m).unwrap().unwrap()).collect();
        assert_eq!(coords[2], HexCoordinate::new(0, 0, 0, 1));
        assert_eq!(coords[3], HexCoordinate::new(0, 0, 0, 2));
        assert_eq!(board.occupancy().stack_at((0, 0, 0)).len(), 3);
        assert!(board.occupancy().is_grounded());
    }

    #[test]
    fn test_climb_onto_existing_stack() {
        // A beetle already sits on wQ; another one stacking on wQ goes higher
        let moves = vec![
            mv(0, "wQ", "."),
            mv(1, "bB1", "wQ"),
            mv(2, "wB1", "wQ"),
        ];
        let steps = replay(&moves).unwrap();
        assert_eq!(steps[1].coordinate, Some(HexCoordinate::new(0, 0, 0, 1)));
        assert_eq!(steps[2].coordinate, Some(HexCoordinate::new(0, 0, 0, 2)));
    }

    #[test]
    fn test_slide_off_stack_settles_down() {
        // bB1 sits on wQ at z=1; "bB1-" names an empty cell and the
        // newcomer falls to the table
        let moves = vec![
            mv(0, "wQ", "."),
            mv(1, "bB1", "wQ"),
            mv(2, "wA1", "bB1-"),
        ];
        let steps = replay(&moves).unwrap();
        assert_eq!(steps[2].coordinate, Some(HexCoordinate::new(0, 0, 1, 0)));
    }

    #[test]
    fn test_settle_over_gap() {
        let mut occupancy = BoardOccupancy::new();
        occupancy.place(id("wQ"), HexCoordinate::new(0, 0, 0, 0));

        // Nominal z=2 with nothing at z=1 settles onto wQ
        let settled = occupancy.settle(HexCoordinate::new(0, 0, 0, 2), id("bB1"));
        assert_eq!(settled, HexCoordinate::new(0, 0, 0, 1));

        // An empty cell settles all the way down
        let settled = occupancy.settle(HexCoordinate::new(1, 4, 4, 2), id("bB1"));
        assert_eq!(settled, HexCoordinate::new(1, 4, 4, 0));

        // Settling is a query; nothing moved
        assert_eq!(occupancy.len(), 1);
    }

    #[test]
    fn test_moving_piece_vacates_its_cell() {
        let mut occupancy = BoardOccupancy::new();
        occupancy.place(id("wQ"), HexCoordinate::new(0, 0, 0, 0));
        occupancy.place(id("bB1"), HexCoordinate::new(0, 0, 0, 1));
        // bB1 stacking on itself's old cell from z=2 lands back at z=1
        let settled = occupancy.settle(HexCoordinate::new(0, 0, 0, 2), id("bB1"));
        assert_eq!(settled, HexCoordinate::new(0, 0, 0, 1));
    }

    #[test]
    fn test_replay_errors() {
        let unresolved = replay(&[mv(0, "wQ", "."), mv(1, "bQ", "wA1-")]);
        assert_eq!(
            unresolved,
            Err(ReplayError::UnresolvedReference {
                move_index: 1,
                reference: id("wA1")
            })
        );

        let malformed = replay(&[mv(0, "wQ", "."), mv(1, "bQ", "-wQ-")]);
        assert!(matches!(malformed, Err(ReplayError::MalformedDestination { move_index: 1, .. })));

        let garbage = replay(&[mv(0, "wQ", "."), mv(1, "bQ", "w#")]);
        assert!(matches!(garbage, Err(ReplayError::MalformedDestination { .. })));

        let uncolored = replay(&[mv(0, "wQ", "."), mv(1, "bQ", "Q-")]);
        assert!(matches!(uncolored, Err(ReplayError::MissingColorPrefix { .. })));

        let detached = replay(&[mv(0, "wQ", "."), mv(1, "bQ", ".")]);
        assert_eq!(detached, Err(ReplayError::DetachedDestination { move_index: 1 }));

        let mut missing = mv(1, "bQ", "");
        missing.destination_token = None;
        assert_eq!(
            replay(&[mv(0, "wQ", "."), missing]),
            Err(ReplayError::MissingDestination { move_index: 1 })
        );
    }

    #[test]
    fn test_piece_moves_overwrite() {
        let moves = vec![mv(0, "wQ", "."), mv(1, "bQ", "wQ-"), mv(2, "bQ", "-wQ")];
        let mut board = BoardReconstructor::new();
        for m in &moves {
            board.apply(m).unwrap();
        }
        assert_eq!(board.occupancy().len(), 2);
        assert_eq!(board.occupancy().position(id("bQ")), Some(HexCoordinate::new(0, 0, -1, 0)));
        assert_eq!(board.occupancy().occupant_at(HexCoordinate::new(0, 0, 1, 0), None), None);
    }
}
