//! Hexagonal Efficient Coordinate System (HECS) geometry
//!
//! A hex grid is addressed as two interleaved rectangular lattices: `a` picks
//! the lattice (row parity), `r`/`c` the cell within it. `z` is stack height.

use serde::{Deserialize, Serialize};

/// Board position of one tile: lattice cell plus stack height
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexCoordinate {
    pub a: u8,
    pub r: i32,
    pub c: i32,
    pub z: u32,
}

/// Where the first tile of every game lands
pub const ORIGIN: HexCoordinate = HexCoordinate::new(0, 0, 0, 0);

impl HexCoordinate {
    pub const fn new(a: u8, r: i32, c: i32, z: u32) -> Self {
        Self { a, r, c, z }
    }

    /// The `(a, r, c)` cell, ignoring height
    pub fn cell(&self) -> (u8, i32, i32) {
        (self.a, self.r, self.c)
    }

    /// Same cell at another height
    pub fn at_height(&self, z: u32) -> Self {
        Self { z, ..*self }
    }

    /// The position directly above
    pub fn above(&self) -> Self {
        self.at_height(self.z + 1)
    }

    /// The position directly below, or `None` on the table
    pub fn below(&self) -> Option<Self> {
        self.z.checked_sub(1).map(|z| self.at_height(z))
    }

    /// Neighboring cell in `direction`, at the same height
    pub fn neighbor(&self, direction: Direction) -> Self {
        let a = self.a as i32;
        let (na, dr, dc) = match direction {
            Direction::West => (a, 0, -1),
            Direction::East => (a, 0, 1),
            Direction::SouthWest => (1 - a, a, -(1 - a)),
            Direction::NorthWest => (1 - a, -(1 - a), -(1 - a)),
            Direction::NorthEast => (1 - a, -(1 - a), a),
            Direction::SouthEast => (1 - a, a, a),
        };
        Self::new(na as u8, self.r + dr, self.c + dc, self.z)
    }
}

/// The six neighbor directions of a hex cell
///
/// Notation marks a direction with `/`, `-` or `\` written before the
/// reference piece (west side) or after it (east side).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// `/ref`
    SouthWest,
    /// `-ref`
    West,
    /// `\ref`
    NorthWest,
    /// `ref/`
    NorthEast,
    /// `ref-`
    East,
    /// `ref\`
    SouthEast,
}

/// All directions, clockwise from west
pub const DIRECTIONS: [Direction; 6] = [
    Direction::West,
    Direction::NorthWest,
    Direction::NorthEast,
    Direction::East,
    Direction::SouthEast,
    Direction::SouthWest,
];

impl Direction {
    /// Direction written as a prefix mark (`/wA1`)
    pub fn from_prefix(mark: char) -> Option<Self> {
        match mark {
            '/' => Some(Direction::SouthWest),
            '-' => Some(Direction::West),
            '\\' => Some(Direction::NorthWest),
            _ => None,
        }
    }

    /// Direction written as a suffix mark (`wA1/`)
    pub fn from_suffix(mark: char) -> Option<Self> {
        match mark {
            '/' => Some(Direction::NorthEast),
            '-' => Some(Direction::East),
            '\\' => Some(Direction::SouthEast),
            _ => None,
        }
    }
}
