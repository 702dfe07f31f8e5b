//! Rooms: template layouts bound to schematic sheets
//!
//! A room is a board document laid out once by hand for one sheet. Every
//! instance of that sheet on the target board is made to look like it. The
//! room picks one footprint as its anchor; the anchor's pose in the room and
//! on the target board defines the transform for everything else.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::board::{Board, BoardError, BoardLoader, Footprint, ItemId};
use crate::diagnostics::{Diagnostic, Diagnostics};

/// A loaded template layout
#[derive(Debug, Clone)]
pub struct Room {
    path: PathBuf,
    board: Board,
    selected_anchor: Option<ItemId>,
}

impl Room {
    /// Load a room from its template file
    pub fn load(path: &Path, loader: &dyn BoardLoader) -> Result<Self, BoardError> {
        let board = loader.load(path)?;
        info!(
            path = %path.display(),
            footprints = board.footprints.len(),
            tracks = board.tracks.len(),
            zones = board.zones.len(),
            drawings = board.drawings.len(),
            "imported room"
        );
        Ok(Self::from_board(path, board))
    }

    /// Wrap an already loaded board
    pub fn from_board(path: impl Into<PathBuf>, board: Board) -> Self {
        Self {
            path: path.into(),
            board,
            selected_anchor: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// A room can be replicated only if it has at least one footprint
    pub fn is_legal(&self) -> bool {
        !self.board.footprints.is_empty()
    }

    /// Footprints that can serve as anchor, keyed by hierarchical path
    pub fn anchor_candidates(&self, diagnostics: &mut Diagnostics) -> BTreeMap<String, String> {
        let mut candidates = BTreeMap::new();
        for fp in &self.board.footprints {
            match fp.path.as_deref() {
                Some(path) if !path.is_empty() => {
                    candidates.insert(path.to_string(), fp.reference.clone());
                }
                _ => diagnostics.push(
                    Diagnostic::warning("footprint has no path, cannot be an anchor")
                        .with_footprint(&fp.reference)
                        .with_room(&self.path),
                ),
            }
        }
        candidates
    }

    /// Guess a good anchor when the user has not chosen one.
    ///
    /// Only footprints with a hierarchical path are ranked. Prefers the
    /// largest, then one whose reference prefix is unique in the room, then
    /// the lexicographically smallest reference.
    pub fn heuristic_anchor(&self) -> Option<String> {
        let mut prefixes: HashMap<&str, usize> = HashMap::new();
        for fp in &self.board.footprints {
            *prefixes.entry(reference_prefix(&fp.reference)).or_default() += 1;
        }

        self.board
            .footprints
            .iter()
            .filter(|fp| fp.path.as_deref().is_some_and(|p| !p.is_empty()))
            .map(|fp| {
                let shared = prefixes[reference_prefix(&fp.reference)];
                (-fp.area(), shared, fp.reference.as_str())
            })
            .min_by(|a, b| {
                a.0.total_cmp(&b.0)
                    .then(a.1.cmp(&b.1))
                    .then(a.2.cmp(b.2))
            })
            .map(|(_, _, reference)| reference.to_string())
    }

    /// Choose the anchor by reference. Unknown references leave the selection unchanged.
    pub fn set_anchor(&mut self, reference: &str, diagnostics: &mut Diagnostics) -> bool {
        match self.board.footprint_by_reference(reference) {
            Some(fp) => {
                self.selected_anchor = Some(fp.id);
                true
            }
            None => {
                diagnostics.push(
                    Diagnostic::warning("anchor footprint not found in room")
                        .with_footprint(reference)
                        .with_room(&self.path),
                );
                false
            }
        }
    }

    pub fn clear_anchor(&mut self) {
        self.selected_anchor = None;
    }

    /// The selected anchor footprint
    pub fn anchor(&self) -> Option<&Footprint> {
        self.selected_anchor
            .and_then(|id| self.board.footprint(id))
    }

    pub fn anchor_reference(&self) -> Option<&str> {
        self.anchor().map(|fp| fp.reference.as_str())
    }
}

/// Reference with trailing digits stripped: `R12` → `R`
fn reference_prefix(reference: &str) -> &str {
    reference.trim_end_matches(|c: char| c.is_ascii_digit())
}
