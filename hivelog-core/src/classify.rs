//! Line classification
//!
//! Every raw log line maps to exactly one [`LineKind`] through an ordered
//! rule table; the first matching rule wins.

use serde::{Deserialize, Serialize};

/// What a log line means to the parser
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineKind {
    Drop,
    MoveWhite,
    MoveBlack,
    Pass,
    Pick,
    Skip,
    Terminator,
    Unclassified,
}

impl LineKind {
    /// Kinds that turn into a move record
    pub fn is_move(self) -> bool {
        matches!(
            self,
            LineKind::Drop | LineKind::MoveWhite | LineKind::MoveBlack | LineKind::Pass
        )
    }
}

// ============================================================================
// LINE ENVELOPE
// ============================================================================

/// One log line split into `; P<id>[<step> <action> <args...>]`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLine<'a> {
    /// Trimmed line text
    pub raw: &'a str,
    /// Numeric player id from the `P<id>[` tag
    pub player_id: Option<u8>,
    /// Text inside the first bracket pair
    pub body: Option<&'a str>,
}

impl<'a> LogLine<'a> {
    pub fn parse(line: &'a str) -> Self {
        let raw = line.trim();
        let (player_id, body) = match split_envelope(raw) {
            Some((id, body)) => (Some(id), Some(body)),
            None => (None, None),
        };
        Self { raw, player_id, body }
    }

    /// Body tokens after the optional numeric step
    pub fn tokens(&self) -> Vec<&'a str> {
        let mut tokens: Vec<&'a str> = self
            .body
            .map(|b| b.split_whitespace().collect())
            .unwrap_or_default();
        if tokens.first().is_some_and(|t| t.bytes().all(|b| b.is_ascii_digit())) {
            tokens.remove(0);
        }
        tokens
    }

    /// The action keyword, e.g. `dropb` or `Move`
    pub fn action(&self) -> Option<&'a str> {
        self.tokens().first().copied()
    }
}

/// Split `; P1[ ... ]` into `(1, " ... ")`
fn split_envelope(raw: &str) -> Option<(u8, &str)> {
    let rest = raw.strip_prefix(';').unwrap_or(raw).trim_start();
    let rest = rest.strip_prefix('P').or_else(|| rest.strip_prefix('p'))?;
    let open = rest.find('[')?;
    let player_id = match &rest[..open] {
        "0" => 0,
        "1" => 1,
        _ => return None,
    };
    let after = &rest[open + 1..];
    let close = after.find(']')?;
    Some((player_id, &after[..close]))
}

// ============================================================================
// RULE TABLE
// ============================================================================

/// How one rule matches a line (all comparisons are case-insensitive)
#[derive(Clone, Copy, Debug)]
enum Pattern {
    Blank,
    Exact(&'static str),
    Prefix(&'static str),
    Contains(&'static str),
    /// Action keyword is one of these
    Action(&'static [&'static str]),
    /// Action keyword followed by one of these tokens
    ActionThen(&'static str, &'static [&'static str]),
}

struct Rule {
    pattern: Pattern,
    kind: LineKind,
}

const fn rule(pattern: Pattern, kind: LineKind) -> Rule {
    Rule { pattern, kind }
}

static RULES: &[Rule] = &[
    rule(Pattern::Blank, LineKind::Skip),
    rule(Pattern::Exact(";"), LineKind::Terminator),
    rule(Pattern::Prefix("(;"), LineKind::Terminator),
    rule(Pattern::Prefix("tm["), LineKind::Terminator),
    rule(Pattern::Exact(")"), LineKind::Skip),
    rule(Pattern::Contains("[id "), LineKind::Skip),
    rule(Pattern::Action(&["start"]), LineKind::Skip),
    rule(Pattern::Action(&["playwhite", "playblack", "swap"]), LineKind::Skip),
    rule(Pattern::Action(&["resign"]), LineKind::Skip),
    rule(Pattern::Action(&["offerdraw", "acceptdraw", "declinedraw", "draw"]), LineKind::Skip),
    rule(Pattern::Action(&["wintime", "timeover"]), LineKind::Skip),
    rule(Pattern::Action(&["torack", "pickrack"]), LineKind::Skip),
    rule(Pattern::Action(&["done", "reset", "edit"]), LineKind::Skip),
    rule(Pattern::Action(&["dropb", "drop"]), LineKind::Drop),
    rule(Pattern::ActionThen("move", &["w", "white"]), LineKind::MoveWhite),
    rule(Pattern::ActionThen("move", &["b", "black"]), LineKind::MoveBlack),
    rule(Pattern::Action(&["pass"]), LineKind::Pass),
    rule(Pattern::Action(&["pick", "pickb"]), LineKind::Pick),
];

impl Pattern {
    fn matches(&self, lowered: &str, tokens: &[&str]) -> bool {
        let action = tokens.first().copied();
        match *self {
            Pattern::Blank => lowered.is_empty(),
            Pattern::Exact(s) => lowered == s,
            Pattern::Prefix(s) => lowered.starts_with(s),
            Pattern::Contains(s) => lowered.contains(s),
            Pattern::Action(words) => action.is_some_and(|a| words.iter().any(|w| a.eq_ignore_ascii_case(w))),
            Pattern::ActionThen(word, next) => {
                action.is_some_and(|a| a.eq_ignore_ascii_case(word))
                    && tokens
                        .get(1)
                        .is_some_and(|t| next.iter().any(|n| t.eq_ignore_ascii_case(n)))
            }
        }
    }
}

/// Classify one raw log line
pub fn classify(line: &str) -> LineKind {
    classify_line(&LogLine::parse(line))
}

/// Classify a line that has already been split
pub fn classify_line(line: &LogLine<'_>) -> LineKind {
    let lowered = line.raw.to_ascii_lowercase();
    let tokens = line.tokens();

    RULES
        .iter()
        .find(|r| r.pattern.matches(&lowered, &tokens))
        .map(|r| r.kind)
        .unwrap_or(LineKind::Unclassified)
}

/// True for the `start` line that opens a game
pub fn is_start_marker(line: &LogLine<'_>) -> bool {
    line.action().is_some_and(|a| a.eq_ignore_ascii_case("start"))
}
