//! Crate-level error type
//!
//! Only I/O and malformed input end a run. Problems with the design itself
//! (missing anchors, unmatched footprints) are reported as diagnostics.

use thiserror::Error;

use crate::board::BoardError;
use crate::config::ConfigError;
use crate::state::StateError;

/// Errors that can occur during the replication pipeline
#[derive(Debug, Error)]
pub enum Error {
    #[error("board error: {0}")]
    Board(#[from] BoardError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("state error: {0}")]
    State(#[from] StateError),

    /// A sheet given on the command line does not exist in the hierarchy
    #[error("no sheet matches '{0}'")]
    UnknownScope(String),

    /// A sub-PCB given on the command line is not bound to any sheet
    #[error("no sub-PCB matches '{0}'")]
    UnknownRoom(String),

    /// An anchor override not of the form `ROOM=REFERENCE`
    #[error("invalid anchor override '{0}', expected ROOM=REFERENCE")]
    InvalidAnchor(String),
}
