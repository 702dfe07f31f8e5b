//! hierpcb - replicate sub-PCB layouts across a hierarchical board
//!
//! A schematic sheet can be instantiated many times. Each sheet may come with
//! a hand-made template layout (a *room*); this crate copies that layout onto
//! every selected instance of the sheet on the target board, moving the
//! footprints and regenerating tracks, zones and graphics relative to one
//! anchor footprint.
//!
//! The pieces can be used on their own:
//!
//! - [`hierarchy::build_tree`] infers the sheet hierarchy and loads rooms
//! - [`ScopeTree`] holds the selection state machine
//! - [`placement::synthesize`] applies the selected rooms to a board
//! - [`session`] restores and persists user choices
//!
//! or all at once through [`replicate`].
//!
//! # Example
//!
//! ```rust
//! use hierpcb::placement::{Pose, PositionTransform};
//! use hierpcb::board::Point;
//!
//! let transform = PositionTransform::new(
//!     Pose::new(Point::new(0, 0), 0.0),
//!     Pose::new(Point::new(5_000_000, 5_000_000), 0.0),
//! );
//! assert_eq!(
//!     transform.point(Point::new(1_000_000, 0)),
//!     Point::new(6_000_000, 5_000_000)
//! );
//! ```

pub mod board;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod hierarchy;
pub mod placement;
pub mod room;
pub mod session;
pub mod state;

pub use board::{Board, BoardError, BoardLoader, JsonBoardLoader};
pub use config::{Config, ConfigError};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::Error;
pub use hierarchy::{build_tree, RoomId, ScopeId, ScopeTree};
pub use placement::synthesize;
pub use room::Room;
pub use state::{JsonStateStore, StateError, StateStore};

use std::path::{Path, PathBuf};

use tracing::info;

/// Options for one run of the complete pipeline
#[derive(Debug, Clone, Default)]
pub struct ReplicateOptions {
    /// Engine configuration
    pub config: Config,
    /// State file; defaults to the board path with `.hierpcb.json` appended
    pub state_path: Option<PathBuf>,
    /// Where to write the result; defaults to overwriting the input board
    pub output_path: Option<PathBuf>,
    /// Ignore the persisted selection and select the default scopes
    pub defaults: bool,
    /// Scopes whose selection is flipped, by identifier or human path
    pub toggles: Vec<String>,
    /// Anchor choices as (room, footprint reference)
    pub anchors: Vec<(String, String)>,
    /// Compute everything but write nothing
    pub dry_run: bool,
    /// Stop after restoring the selection, without touching the board
    pub skip_synthesis: bool,
}

impl ReplicateOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the state file
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = Some(path.into());
        self
    }

    /// Set the output board file
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Reset the selection to the defaults before applying toggles
    pub fn with_defaults(mut self, defaults: bool) -> Self {
        self.defaults = defaults;
        self
    }

    /// Flip the selection of a scope
    pub fn with_toggle(mut self, scope: impl Into<String>) -> Self {
        self.toggles.push(scope.into());
        self
    }

    /// Choose the anchor of a room
    pub fn with_anchor(mut self, room: impl Into<String>, reference: impl Into<String>) -> Self {
        self.anchors.push((room.into(), reference.into()));
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enable or disable synthesis
    pub fn with_skip_synthesis(mut self, skip: bool) -> Self {
        self.skip_synthesis = skip;
        self
    }
}

/// Outcome of [`replicate`]
#[derive(Debug)]
pub struct Report {
    /// The hierarchy with the selection and anchors that were used
    pub tree: ScopeTree,
    /// The resulting board
    pub board: Board,
    /// Everything worth telling the user
    pub diagnostics: Diagnostics,
    /// Board file written, if any
    pub written: Option<PathBuf>,
}

/// State file used when none is given: `<board>.hierpcb.json`
pub fn default_state_path(board_path: &Path) -> PathBuf {
    let mut path = board_path.as_os_str().to_owned();
    path.push(".hierpcb.json");
    PathBuf::from(path)
}

/// Split an anchor override of the form `ROOM=REFERENCE`
pub fn parse_anchor_override(value: &str) -> Result<(String, String), Error> {
    match value.split_once('=') {
        Some((room, reference)) if !room.is_empty() && !reference.is_empty() => {
            Ok((room.to_string(), reference.to_string()))
        }
        _ => Err(Error::InvalidAnchor(value.to_string())),
    }
}

/// Run the whole pipeline on one board file.
///
/// Loads the board and its rooms, restores persisted choices, applies the
/// overrides in `options`, synthesizes and writes the board and state back
/// (unless `dry_run`). Only unreadable or unwritable files are errors; every
/// other problem is in [`Report::diagnostics`].
pub fn replicate(board_path: &Path, options: &ReplicateOptions) -> Result<Report, Error> {
    let mut board = board::load_board(board_path)?;
    let base_dir = match board_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut diagnostics = Diagnostics::new();
    let mut tree = build_tree(
        &board,
        base_dir,
        Some(board_path),
        &JsonBoardLoader,
        &options.config,
        &mut diagnostics,
    );

    let state_path = options
        .state_path
        .clone()
        .unwrap_or_else(|| default_state_path(board_path));
    let mut store = JsonStateStore::open(state_path)?;
    let restored = session::load_state(&mut tree, &store, base_dir, &mut diagnostics);
    if options.defaults || !restored {
        tree.apply_defaults();
    }

    for (room, reference) in &options.anchors {
        let id = find_room(&tree, base_dir, room).ok_or_else(|| Error::UnknownRoom(room.clone()))?;
        tree.room_mut(id).set_anchor(reference, &mut diagnostics);
    }
    for scope in &options.toggles {
        let id = find_scope(&tree, scope).ok_or_else(|| Error::UnknownScope(scope.clone()))?;
        tree.toggle(id, &mut diagnostics);
    }

    if options.skip_synthesis {
        return Ok(Report {
            tree,
            board,
            diagnostics,
            written: None,
        });
    }

    diagnostics.extend(synthesize(&tree, &mut board, &options.config));

    let mut written = None;
    if !options.dry_run {
        let output = options
            .output_path
            .clone()
            .unwrap_or_else(|| board_path.to_path_buf());
        board::save_board(&board, &output)?;
        session::save_state(&tree, &mut store, base_dir)?;
        store.save()?;
        info!(path = %output.display(), "wrote board");
        written = Some(output);
    }

    Ok(Report {
        tree,
        board,
        diagnostics,
        written,
    })
}

/// Find a scope by identifier (`/a/b`) or by human path (`/Amp/Filter`)
fn find_scope(tree: &ScopeTree, name: &str) -> Option<ScopeId> {
    tree.find(name)
        .or_else(|| tree.iter().find(|id| tree.human_path(*id) == name))
}

/// Find a room by its path relative to the base directory, or by file name
fn find_room(tree: &ScopeTree, base_dir: &Path, name: &str) -> Option<RoomId> {
    tree.rooms()
        .find(|(_, room)| {
            session::room_key(room, base_dir) == name
                || room.path().file_name().is_some_and(|f| f == name)
        })
        .map(|(id, _)| id)
}
