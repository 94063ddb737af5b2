//! Game log parser
//!
//! Drives classification, seat resolution and move extraction over the lines
//! of one game. A game either parses completely or is rejected; nothing
//! partial is ever returned.

use crate::classify::{classify_line, is_start_marker, LineKind, LogLine};
use crate::error::ParseError;
use crate::grammar::MoveTokenParser;
use crate::piece::RESERVED_PIECE_MARKER;
use crate::player::{PlayerColorAssignment, PlayerColorResolver};
use crate::record::MoveRecord;

/// Parser progress through one log
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParserState {
    /// Header lines before the `start` marker
    AwaitingStart,
    InGame,
    Done,
    Invalid,
}

/// A fully parsed game
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedGame {
    pub moves: Vec<MoveRecord>,
    pub assignment: PlayerColorAssignment,
}

/// One-shot parser for a single game log.
///
/// Owns its own seat resolver, so separate games never share state.
#[derive(Debug)]
pub struct GameLogParser {
    state: ParserState,
    resolver: PlayerColorResolver,
    moves: Vec<MoveRecord>,
}

impl Default for GameLogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl GameLogParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::AwaitingStart,
            resolver: PlayerColorResolver::new(),
            moves: Vec::new(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Parse every line of one game
    pub fn parse<I, S>(mut self, lines: I) -> Result<ParsedGame, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (i, raw) in lines.into_iter().enumerate() {
            if let Err(e) = self.feed(i + 1, raw.as_ref()) {
                self.state = ParserState::Invalid;
                return Err(e);
            }
        }
        self.finish()
    }

    /// Consume one line (`line_no` is 1-based)
    fn feed(&mut self, line_no: usize, raw: &str) -> Result<(), ParseError> {
        let line = LogLine::parse(raw);

        if self.state == ParserState::AwaitingStart {
            if is_start_marker(&line) {
                tracing::trace!(line = line_no, "game start");
                self.state = ParserState::InGame;
            }
            return Ok(());
        }

        match classify_line(&line) {
            LineKind::Skip => Ok(()),
            LineKind::Pick => {
                if line.tokens().iter().skip(1).any(|t| t.contains(RESERVED_PIECE_MARKER)) {
                    return Err(ParseError::ReservedPieceToken {
                        line: line_no,
                        content: line.raw.to_string(),
                    });
                }
                self.resolver.observe_pick(line_no, &line);
                Ok(())
            }
            kind @ (LineKind::Drop | LineKind::MoveWhite | LineKind::MoveBlack | LineKind::Pass) => {
                let turn_index = self.moves.len();
                let parsed = MoveTokenParser::new(&self.resolver).parse(turn_index, line_no, &line, kind)?;
                if let Some(record) = parsed {
                    self.moves.push(record);
                }
                Ok(())
            }
            LineKind::Terminator => Err(ParseError::MultiPartLog {
                line: line_no,
                content: line.raw.to_string(),
            }),
            LineKind::Unclassified => Err(ParseError::UnclassifiedLine {
                line: line_no,
                content: line.raw.to_string(),
            }),
        }
    }

    fn finish(mut self) -> Result<ParsedGame, ParseError> {
        if self.state == ParserState::AwaitingStart {
            self.state = ParserState::Invalid;
            return Err(ParseError::MissingStart);
        }

        let assignment = *self.resolver.assignment();
        if let Some((line, content)) = self.resolver.pending_ambiguity() {
            if !assignment.is_complete() {
                self.state = ParserState::Invalid;
                return Err(ParseError::AmbiguousPick {
                    line: *line,
                    content: content.clone(),
                });
            }
        }

        self.state = ParserState::Done;
        tracing::debug!(moves = self.moves.len(), "game parsed");
        Ok(ParsedGame {
            moves: self.moves,
            assignment,
        })
    }
}

/// Parse one game log with a fresh parser
pub fn parse_game<I, S>(lines: I) -> Result<ParsedGame, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    GameLogParser::new().parse(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Color;

    const HEADER: &[&str] = &[
        "(;",
        "GM[27]VV[1]",
        "SU[hive]",
        "P0[id \"Dumbot\"]",
        "P1[id \"loizz\"]",
        "; P0[0 start P0]",
    ];

    fn game(body: &[&str]) -> Vec<String> {
        HEADER.iter().chain(body).map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_full_game() {
        let lines = game(&[
            "; P0[1 PlayWhite]",
            "; P0[2 Pick W 1 wG1]",
            "; P0[3 Dropb wG1 N 13 .]",
            "; P0[4 done]",
            "; P1[5 Pick B 0 bA1]",
            "; P1[6 dropb bA1 O 13 wG1-]",
            "; P1[7 done]",
            "; P0[8 Move W wQ M 13 \\\\wG1]",
            "; P1[9 pass]",
            "; P0[10 Resign]",
            ")",
        ]);
        let parsed = parse_game(&lines).unwrap();

        assert_eq!(parsed.assignment.color_of(0), Some(Color::White));
        assert_eq!(parsed.moves.len(), 4);
        let turns: Vec<_> = parsed.moves.iter().map(|m| m.turn_index).collect();
        assert_eq!(turns, vec![0, 1, 2, 3]);
        assert_eq!(parsed.moves[1].player, Color::Black);
        assert_eq!(parsed.moves[2].destination_token.as_deref(), Some("\\wG1"));
        assert!(parsed.moves[3].is_pass());
        assert_eq!(parsed.moves[3].player, Color::Black);
    }

    #[test]
    fn test_lines_before_start_ignored() {
        // Garbage in the header is never classified
        let lines = vec!["nonsense header", "; P0[0 start P0]", "; P0[1 Move W wQ .]"];
        let parsed = parse_game(lines).unwrap();
        assert_eq!(parsed.moves.len(), 1);
    }

    #[test]
    fn test_missing_start() {
        let lines = vec!["(;", "; P0[3 Dropb wG1 N 13 .]"];
        assert_eq!(parse_game(lines), Err(ParseError::MissingStart));
    }

    #[test]
    fn test_unclassified_rejects_whole_game() {
        let lines = game(&[
            "; P0[2 Pick W 1 wG1]",
            "; P0[3 Dropb wG1 N 13 .]",
            "; P0[4 juggle wG1]",
            "; P1[6 dropb bA1 O 13 wG1-]",
        ]);
        let err = parse_game(&lines).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnclassifiedLine {
                line: 9,
                content: "; P0[4 juggle wG1]".to_string()
            }
        );
        assert_eq!(err.line(), Some(9));
    }

    #[test]
    fn test_terminator_rejects() {
        let lines = game(&["; P0[2 Pick W 1 wG1]", "; P0[3 Dropb wG1 N 13 .]", ";", "(;"]);
        assert!(matches!(
            parse_game(&lines),
            Err(ParseError::MultiPartLog { line: 9, .. })
        ));
    }

    #[test]
    fn test_reserved_piece_rejects() {
        let lines = game(&[
            "; P0[2 Pick W 1 wG1]",
            "; P0[3 Dropb wG1 N 13 .]",
            "; P1[6 dropb b? O 13 wG1-]",
        ]);
        assert!(matches!(
            parse_game(&lines),
            Err(ParseError::ReservedPieceToken { line: 9, .. })
        ));
    }

    #[test]
    fn test_reserved_piece_in_pick_rejects() {
        let lines = game(&["; P0[2 Pick W 1 w?]", "; P0[3 Dropb wG1 N 13 .]"]);
        assert!(matches!(
            parse_game(&lines),
            Err(ParseError::ReservedPieceToken { line: 7, .. })
        ));
    }

    #[test]
    fn test_picks_after_assignment_are_inert() {
        let lines = game(&[
            "; P0[2 Pick W 1 wG1]",
            "; P0[3 Dropb wG1 N 13 .]",
            "; P1[4 Pick W 1 wA1]",
            "; P1[5 pickb N 12 G1]",
            "; P1[6 dropb A1 O 13 wG1-]",
        ]);
        let parsed = parse_game(&lines).unwrap();
        assert_eq!(parsed.assignment, PlayerColorAssignment::with(0, Color::White));
        assert_eq!(parsed.moves[1].piece.map(|p| p.color), Some(Color::Black));
    }

    #[test]
    fn test_unresolved_ambiguous_pick_at_end() {
        let lines = game(&["; P0[2 pickb N 12 G1]", "; P0[3 Move W wG1 .]"]);
        assert!(matches!(
            parse_game(&lines),
            Err(ParseError::AmbiguousPick { line: 7, .. })
        ));
    }

    #[test]
    fn test_rack_drop_produces_no_record() {
        let lines = game(&[
            "; P0[2 Pick W 1 wG1]",
            "; P0[3 drop wG1 rack]",
            "; P0[4 Dropb wG1 N 13 .]",
        ]);
        let parsed = parse_game(&lines).unwrap();
        assert_eq!(parsed.moves.len(), 1);
        assert_eq!(parsed.moves[0].turn_index, 0);
    }
}
