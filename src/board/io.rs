//! Loading and saving board documents

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::Board;

/// Errors that can occur when reading or writing a board document
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("failed to read board file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse board file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write board file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize board: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Something that can turn a file on disk into a [`Board`]
pub trait BoardLoader {
    fn load(&self, path: &Path) -> Result<Board, BoardError>;
}

/// Loads boards stored as JSON documents
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBoardLoader;

impl BoardLoader for JsonBoardLoader {
    fn load(&self, path: &Path) -> Result<Board, BoardError> {
        load_board(path)
    }
}

impl Board {
    /// Parse a board from a JSON string
    pub fn from_json(content: &str) -> Result<Board, serde_json::Error> {
        let mut board: Board = serde_json::from_str(content)?;
        board.normalize();
        Ok(board)
    }

    /// Serialize the board to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, BoardError> {
        serde_json::to_string_pretty(self).map_err(BoardError::Serialize)
    }
}

/// Read a board document from disk
pub fn load_board(path: &Path) -> Result<Board, BoardError> {
    let content = std::fs::read_to_string(path).map_err(|source| BoardError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let board = Board::from_json(&content).map_err(|source| BoardError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        footprints = board.footprints.len(),
        tracks = board.tracks.len(),
        zones = board.zones.len(),
        drawings = board.drawings.len(),
        "loaded board"
    );
    Ok(board)
}

/// Write a board document to disk
pub fn save_board(board: &Board, path: &Path) -> Result<(), BoardError> {
    let content = board.to_json()?;
    std::fs::write(path, content).map_err(|source| BoardError::Write {
        path: path.to_path_buf(),
        source,
    })
}
