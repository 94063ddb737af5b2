//! Persistence for parsed games
//!
//! Level 4 - Utilities
//!
//! A sink holds one document per game key. A game is written whole in one
//! step; partial field updates merge into an existing document later without
//! touching its other fields.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use hivelog_core::{GameFlags, MoveRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::BatchError;

/// Where parsed games end up. Shared by all workers.
pub trait GameSink: Send + Sync {
    /// Whether a document exists under `key`
    fn contains(&self, key: &str) -> Result<bool, BatchError>;

    /// Create or replace the document for `key` in a single write
    fn store_document(&self, key: &str, document: &GameDocument) -> Result<(), BatchError>;

    /// Create or replace the document for `key` holding only its moves
    fn store_moves(&self, key: &str, moves: &[MoveRecord]) -> Result<(), BatchError> {
        self.store_document(key, &GameDocument::new(key, moves))
    }

    /// Merge named fields into an existing document
    fn update_fields(&self, key: &str, fields: &[(&str, bool)]) -> Result<(), BatchError>;
}

/// Stored form of one game
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameDocument {
    pub source: String,
    pub moves: Vec<MoveRecord>,
    pub parsed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ladybug: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mosquito: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pillbug: Option<bool>,
}

impl GameDocument {
    pub fn new(source: &str, moves: &[MoveRecord]) -> Self {
        Self {
            source: source.to_string(),
            moves: moves.to_vec(),
            parsed_at: Utc::now(),
            ladybug: None,
            mosquito: None,
            pillbug: None,
        }
    }

    /// Set the derived piece flags
    pub fn with_flags(mut self, flags: GameFlags) -> Self {
        self.ladybug = Some(flags.ladybug);
        self.mosquito = Some(flags.mosquito);
        self.pillbug = Some(flags.pillbug);
        self
    }

    /// Read a document written by [`JsonDirSink`]
    pub fn load(path: &Path) -> Result<Self, BatchError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn merge_fields(document: &mut Map<String, Value>, fields: &[(&str, bool)]) {
    for &(name, value) in fields {
        document.insert(name.to_string(), Value::Bool(value));
    }
}

fn as_object(key: &str, value: Value) -> Result<Map<String, Value>, BatchError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(BatchError::MissingDocument(key.to_string())),
    }
}

// ============================================================================
// JSON directory sink
// ============================================================================

/// One pretty-printed JSON file per game, written atomically
#[derive(Clone, Debug)]
pub struct JsonDirSink {
    dir: PathBuf,
}

impl JsonDirSink {
    /// Open (and create if needed) the output directory
    pub fn create(dir: impl AsRef<Path>) -> Result<Self, BatchError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the document for `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }

    fn write_atomic(path: &Path, document: &Value) -> Result<(), BatchError> {
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(document)?;
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl GameSink for JsonDirSink {
    fn contains(&self, key: &str) -> Result<bool, BatchError> {
        Ok(self.path_for(key).is_file())
    }

    fn store_document(&self, key: &str, document: &GameDocument) -> Result<(), BatchError> {
        let document = serde_json::to_value(document)?;
        Self::write_atomic(&self.path_for(key), &document)
    }

    fn update_fields(&self, key: &str, fields: &[(&str, bool)]) -> Result<(), BatchError> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Err(BatchError::MissingDocument(key.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        let mut document = as_object(key, serde_json::from_str(&content)?)?;
        merge_fields(&mut document, fields);
        Self::write_atomic(&path, &Value::Object(document))
    }
}

/// File-name-safe form of a key.
///
/// Letters, digits, `-` and `.` pass through; every other byte becomes `%XX`,
/// so distinct keys never share a file.
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'.' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

// ============================================================================
// In-memory sink
// ============================================================================

/// Keeps documents in memory; for tests and dry runs
#[derive(Debug, Default)]
pub struct MemorySink {
    documents: Mutex<BTreeMap<String, Map<String, Value>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the document under `key`
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned().map(Value::Object)
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Map<String, Value>>> {
        self.documents.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl GameSink for MemorySink {
    fn contains(&self, key: &str) -> Result<bool, BatchError> {
        Ok(self.lock().contains_key(key))
    }

    fn store_document(&self, key: &str, document: &GameDocument) -> Result<(), BatchError> {
        let document = as_object(key, serde_json::to_value(document)?)?;
        self.lock().insert(key.to_string(), document);
        Ok(())
    }

    fn update_fields(&self, key: &str, fields: &[(&str, bool)]) -> Result<(), BatchError> {
        let mut documents = self.lock();
        let document = documents
            .get_mut(key)
            .ok_or_else(|| BatchError::MissingDocument(key.to_string()))?;
        merge_fields(document, fields);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hivelog_core::Color;

    fn moves() -> Vec<MoveRecord> {
        vec![MoveRecord {
            turn_index: 0,
            player: Color::White,
            piece: Some("wL".parse().unwrap()),
            destination_token: Some(".".to_string()),
            row: None,
            diagonal: None,
        }]
    }

    #[test]
    fn test_encode_key() {
        assert_eq!(encode_key("2019/HV-a b.sgf"), "2019%2FHV-a%20b.sgf");
        assert_eq!(encode_key("J\u{f6}rg.sgf"), "J%C3%B6rg.sgf");
    }

    #[test]
    fn test_similar_keys_get_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::create(dir.path()).unwrap();
        assert_ne!(sink.path_for("2019/a.sgf"), sink.path_for("2019_a.sgf"));
        assert_ne!(sink.path_for("a%2Fb"), sink.path_for("a/b"));

        sink.store_moves("2019/a.sgf", &moves()).unwrap();
        assert!(!sink.contains("2019_a.sgf").unwrap());
        sink.store_moves("2019_a.sgf", &[]).unwrap();

        let first = GameDocument::load(&sink.path_for("2019/a.sgf")).unwrap();
        assert_eq!(first.source, "2019/a.sgf");
        assert_eq!(first.moves.len(), 1);
    }

    #[test]
    fn test_document_with_flags_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::create(dir.path()).unwrap();
        let flags = GameFlags { ladybug: true, mosquito: false, pillbug: false };
        sink.store_document("g", &GameDocument::new("g", &moves()).with_flags(flags))
            .unwrap();

        let doc = GameDocument::load(&sink.path_for("g")).unwrap();
        assert_eq!(doc.ladybug, Some(true));
        assert_eq!(doc.mosquito, Some(false));
        assert_eq!(doc.moves.len(), 1);
    }

    #[test]
    fn test_json_dir_store_and_update() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::create(dir.path().join("out")).unwrap();
        let key = "2019/game.sgf";

        assert!(!sink.contains(key).unwrap());
        sink.store_moves(key, &moves()).unwrap();
        assert!(sink.contains(key).unwrap());

        let before = GameDocument::load(&sink.path_for(key)).unwrap();
        assert_eq!(before.ladybug, None);

        sink.update_fields(key, &[("ladybug", true), ("pillbug", false)]).unwrap();
        let after = GameDocument::load(&sink.path_for(key)).unwrap();
        assert_eq!(after.source, key);
        assert_eq!(after.moves, before.moves);
        assert_eq!(after.parsed_at, before.parsed_at);
        assert_eq!(after.ladybug, Some(true));
        assert_eq!(after.pillbug, Some(false));
        assert_eq!(after.mosquito, None);

        // No temp files left behind
        let names: Vec<_> = fs::read_dir(sink.dir()).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_update_missing_document() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::create(dir.path()).unwrap();
        assert!(matches!(
            sink.update_fields("nope", &[("ladybug", true)]),
            Err(BatchError::MissingDocument(_))
        ));

        let memory = MemorySink::new();
        assert!(matches!(
            memory.update_fields("nope", &[("ladybug", true)]),
            Err(BatchError::MissingDocument(_))
        ));
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        sink.store_moves("a", &moves()).unwrap();
        sink.update_fields("a", &[("mosquito", true)]).unwrap();

        let doc = sink.get("a").unwrap();
        assert_eq!(doc["mosquito"], Value::Bool(true));
        assert_eq!(doc["moves"][0]["piece_moved"], "wL");
        assert_eq!(sink.keys(), vec!["a".to_string()]);
        assert_eq!(sink.len(), 1);
    }
}
