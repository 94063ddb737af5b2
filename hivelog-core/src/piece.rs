//! Piece identity: colors, piece kinds and the `wA1`-style text form

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Placeholder the log writes for a piece it could not name
pub const RESERVED_PIECE_MARKER: char = '?';

/// Player color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Lowercase prefix used in piece tokens
    pub fn prefix(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    /// Parse a piece-token color prefix (lowercase only; `B` is the beetle)
    pub fn from_prefix(c: char) -> Option<Self> {
        match c {
            'w' => Some(Color::White),
            'b' => Some(Color::Black),
            _ => None,
        }
    }

    /// Parse a free-standing color word from a log line (`W`, `b`, `white`, ...)
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "w" | "white" => Some(Color::White),
            "b" | "black" => Some(Color::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => f.write_str("white"),
            Color::Black => f.write_str("black"),
        }
    }
}

/// Piece kind definition
#[derive(Clone, Debug)]
pub struct PieceKindInfo {
    pub kind: PieceKind,
    pub letter: char,
    pub name: &'static str,
    /// Copies each player owns
    pub count: u8,
    /// Part of an expansion rather than the base box
    pub expansion: bool,
}

impl PieceKindInfo {
    const fn new(kind: PieceKind, letter: char, name: &'static str, count: u8, expansion: bool) -> Self {
        Self {
            kind,
            letter,
            name,
            count,
            expansion,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PieceKind {
    Queen,
    Ant,
    Grasshopper,
    Beetle,
    Spider,
    Ladybug,
    Mosquito,
    Pillbug,
}

/// All eight piece kinds, in notation-letter order
pub static PIECE_KINDS: [PieceKindInfo; 8] = [
    PieceKindInfo::new(PieceKind::Queen, 'Q', "queen", 1, false),
    PieceKindInfo::new(PieceKind::Ant, 'A', "ant", 3, false),
    PieceKindInfo::new(PieceKind::Grasshopper, 'G', "grasshopper", 3, false),
    PieceKindInfo::new(PieceKind::Beetle, 'B', "beetle", 2, false),
    PieceKindInfo::new(PieceKind::Spider, 'S', "spider", 2, false),
    PieceKindInfo::new(PieceKind::Ladybug, 'L', "ladybug", 1, true),
    PieceKindInfo::new(PieceKind::Mosquito, 'M', "mosquito", 1, true),
    PieceKindInfo::new(PieceKind::Pillbug, 'P', "pillbug", 1, true),
];

impl PieceKind {
    pub fn info(self) -> &'static PieceKindInfo {
        &PIECE_KINDS[self as usize]
    }

    pub fn letter(self) -> char {
        self.info().letter
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        PIECE_KINDS.iter().find(|k| k.letter == letter).map(|k| k.kind)
    }
}

/// Error from reading a piece token
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PieceTokenError {
    #[error("empty piece token")]
    Empty,
    #[error("piece token {0:?} has no color prefix")]
    MissingColor(String),
    #[error("unknown piece letter in {0:?}")]
    UnknownKind(String),
    #[error("bad instance index in {0:?}")]
    BadIndex(String),
}

/// A physical tile: `(color, kind, instance index)`
///
/// A missing index reads as 1, so `wQ` and `wQ1` name the same tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId {
    pub color: Color,
    pub kind: PieceKind,
    pub index: u8,
}

impl PieceId {
    pub const fn new(color: Color, kind: PieceKind, index: u8) -> Self {
        Self { color, kind, index }
    }

    /// Read a token whose color prefix may be missing, filling in `color`
    pub fn parse_with_color(token: &str, color: Color) -> Result<Self, PieceTokenError> {
        match token.chars().next().and_then(Color::from_prefix) {
            Some(_) => token.parse(),
            None => parse_body(token, color, token),
        }
    }

    /// True if the raw token starts with a color prefix
    pub fn has_color_prefix(token: &str) -> bool {
        token.chars().next().and_then(Color::from_prefix).is_some()
    }
}

/// Parse the `<letter><index?>` part of a token
fn parse_body(body: &str, color: Color, token: &str) -> Result<PieceId, PieceTokenError> {
    let mut chars = body.chars();
    let letter = chars.next().ok_or(PieceTokenError::Empty)?;
    let kind = PieceKind::from_letter(letter)
        .ok_or_else(|| PieceTokenError::UnknownKind(token.to_string()))?;

    let digits = chars.as_str();
    let index = if digits.is_empty() {
        1
    } else {
        match digits.parse::<u8>() {
            Ok(i) if i >= 1 => i,
            _ => return Err(PieceTokenError::BadIndex(token.to_string())),
        }
    };

    Ok(PieceId::new(color, kind, index))
}

impl FromStr for PieceId {
    type Err = PieceTokenError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let mut chars = token.chars();
        let first = chars.next().ok_or(PieceTokenError::Empty)?;
        let color = Color::from_prefix(first)
            .ok_or_else(|| PieceTokenError::MissingColor(token.to_string()))?;
        parse_body(chars.as_str(), color, token)
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.color.prefix(), self.kind.letter())?;
        // Single-copy kinds are written without an index
        if self.kind.info().count > 1 || self.index > 1 {
            write!(f, "{}", self.index)?;
        }
        Ok(())
    }
}

impl Serialize for PieceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PieceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(de::Error::custom)
    }
}
