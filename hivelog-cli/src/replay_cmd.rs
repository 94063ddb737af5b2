//! Replay command - board timeline of a single game
//!
//! Reads either a raw game log or a stored JSON document, replays its moves
//! and prints one timeline entry per move with the tile's palette color.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use hivelog_batch::{read_log_lines, GameDocument};
use hivelog_core::{parse_game, replay, HexCoordinate, MoveRecord, PieceKind, TimelineStep};

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct ReplayArgs {
    /// Game log, or a `.json` document written by `parse`
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Piece palette JSON file, e.g. {"Q": [168, 155, 50]}
    #[arg(long, value_name = "FILE")]
    pub palette: Option<PathBuf>,

    /// Write the timeline here instead of stdout
    #[arg(long, short, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

// ============================================================================
// PALETTE
// ============================================================================

/// RGB color per piece letter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette(BTreeMap<String, [u8; 3]>);

impl Default for Palette {
    fn default() -> Self {
        let colors = [
            (PieceKind::Queen, [168, 155, 50]),
            (PieceKind::Ant, [50, 70, 168]),
            (PieceKind::Grasshopper, [43, 92, 21]),
            (PieceKind::Beetle, [49, 23, 84]),
            (PieceKind::Spider, [120, 38, 19]),
            (PieceKind::Ladybug, [222, 16, 43]),
            (PieceKind::Mosquito, [150, 150, 150]),
            (PieceKind::Pillbug, [66, 138, 105]),
        ];
        Palette(
            colors
                .into_iter()
                .map(|(kind, rgb)| (kind.letter().to_string(), rgb))
                .collect(),
        )
    }
}

impl Palette {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read palette: {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid palette: {}", path.display()))
    }

    pub fn color_of(&self, kind: PieceKind) -> Option<[u8; 3]> {
        self.0.get(kind.letter().to_string().as_str()).copied()
    }
}

/// One printed timeline entry
#[derive(Debug, Serialize)]
struct TimelineEntry<'a> {
    #[serde(rename = "move")]
    record: &'a MoveRecord,
    coordinate: Option<HexCoordinate>,
    color: Option<[u8; 3]>,
}

// ============================================================================
// COMMAND
// ============================================================================

pub fn run(args: ReplayArgs) -> Result<()> {
    let palette = match &args.palette {
        Some(path) => Palette::load(path)?,
        None => Palette::default(),
    };

    let moves = load_moves(&args.input)?;
    let timeline = replay(&moves).with_context(|| format!("Replay failed: {}", args.input.display()))?;
    tracing::info!(moves = timeline.len(), "game replayed");

    let json = render_timeline(&timeline, &palette)?;
    match &args.out {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write timeline: {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

/// Moves from a stored document or a raw log
fn load_moves(path: &Path) -> Result<Vec<MoveRecord>> {
    if path.extension().is_some_and(|e| e == "json") {
        let document = GameDocument::load(path)
            .with_context(|| format!("Failed to load game document: {}", path.display()))?;
        return Ok(document.moves);
    }

    let lines = read_log_lines(path).with_context(|| format!("Failed to read log: {}", path.display()))?;
    let parsed = parse_game(&lines).with_context(|| format!("Failed to parse log: {}", path.display()))?;
    Ok(parsed.moves)
}

fn render_timeline(timeline: &[TimelineStep], palette: &Palette) -> Result<String> {
    let entries: Vec<_> = timeline
        .iter()
        .map(|step| TimelineEntry {
            record: &step.record,
            coordinate: step.coordinate,
            color: step.record.piece.and_then(|p| palette.color_of(p.kind)),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}
