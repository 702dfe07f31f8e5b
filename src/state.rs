//! Persisted user choices between runs
//!
//! The engine itself defines no file format; it reads and writes values by key
//! path through [`StateStore`]. [`JsonStateStore`] keeps them in a JSON
//! document next to the board.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur when reading or writing persisted state
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to read state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse state file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("State key {0} is not a section")]
    NotASection(String),
}

/// Key-path access to persisted values
pub trait StateStore {
    /// Value at `key`, if every segment exists
    fn get(&self, key: &[&str]) -> Option<&Value>;

    /// Store `value` at `key`, creating missing sections on the way
    fn set(&mut self, key: &[&str], value: Value) -> Result<(), StateError>;

    /// Drop everything under `key`
    fn clear(&mut self, key: &[&str]);
}

/// State kept as one JSON object on disk
#[derive(Debug, Clone, PartialEq)]
pub struct JsonStateStore {
    path: PathBuf,
    root: Value,
}

impl JsonStateStore {
    /// Open a state file. A missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StateError> {
        let path = path.into();
        let root = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| StateError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "state file not found, starting fresh");
                Value::Object(Map::new())
            }
            Err(source) => return Err(StateError::Io { path, source }),
        };
        Ok(Self { path, root })
    }

    /// An empty store that will be written to `path`
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            root: Value::Object(Map::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn value(&self) -> &Value {
        &self.root
    }

    /// Write the store back to its file
    pub fn save(&self) -> Result<(), StateError> {
        let content = serde_json::to_string_pretty(&self.root)?;
        std::fs::write(&self.path, content).map_err(|source| StateError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "saved state");
        Ok(())
    }
}

impl StateStore for JsonStateStore {
    fn get(&self, key: &[&str]) -> Option<&Value> {
        key.iter().try_fold(&self.root, |node, k| node.get(*k))
    }

    fn set(&mut self, key: &[&str], value: Value) -> Result<(), StateError> {
        let Some((last, sections)) = key.split_last() else {
            self.root = value;
            return Ok(());
        };
        let mut node = &mut self.root;
        for (depth, k) in sections.iter().enumerate() {
            let Value::Object(map) = node else {
                return Err(StateError::NotASection(key[..depth].join(".")));
            };
            node = map
                .entry(k.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        match node {
            Value::Object(map) => {
                map.insert(last.to_string(), value);
                Ok(())
            }
            _ => Err(StateError::NotASection(sections.join("."))),
        }
    }

    fn clear(&mut self, key: &[&str]) {
        let Some((last, sections)) = key.split_last() else {
            self.root = Value::Object(Map::new());
            return;
        };
        let mut node = &mut self.root;
        for k in sections {
            match node.get_mut(*k) {
                Some(child) => node = child,
                None => return,
            }
        }
        if let Value::Object(map) = node {
            map.remove(*last);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_set_creates_sections() {
        let mut store = JsonStateStore::empty("state.json");
        store.set(&["sheet", "/a/b", "checked"], json!(true)).unwrap();
        assert_eq!(store.get(&["sheet", "/a/b", "checked"]), Some(&json!(true)));
        assert_eq!(store.value(), &json!({"sheet": {"/a/b": {"checked": true}}}));
        assert_eq!(store.get(&["sheet", "/a/c", "checked"]), None);
    }

    #[test]
    fn test_set_through_a_value_fails() {
        let mut store = JsonStateStore::empty("state.json");
        store.set(&["subpcb"], json!("flat")).unwrap();
        let result = store.set(&["subpcb", "amp", "anchor"], json!("U1"));
        assert!(matches!(result, Err(StateError::NotASection(k)) if k == "subpcb"));
    }

    #[test]
    fn test_clear() {
        let mut store = JsonStateStore::empty("state.json");
        store.set(&["sheet", "/a", "checked"], json!(true)).unwrap();
        store.set(&["subpcb", "amp", "anchor"], json!("U1")).unwrap();
        store.clear(&["sheet"]);
        store.clear(&["missing", "key"]);
        assert_eq!(store.value(), &json!({"subpcb": {"amp": {"anchor": "U1"}}}));
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::open(dir.path().join("none.json")).unwrap();
        assert_eq!(store.value(), &json!({}));
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.hierpcb.json");
        let mut store = JsonStateStore::open(&path).unwrap();
        store.set(&["subpcb", "amp.kicad_pcb.json", "anchor"], json!("U1")).unwrap();
        store.save().unwrap();

        let reopened = JsonStateStore::open(&path).unwrap();
        assert_eq!(reopened, store);
    }

    #[test]
    fn test_open_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonStateStore::open(&path),
            Err(StateError::Parse { .. })
        ));
    }
}
