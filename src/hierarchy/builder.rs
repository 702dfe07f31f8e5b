//! Infer the sheet hierarchy from footprint paths
//!
//! This should really come from the schematic, but the board only carries a
//! hierarchical path and sheet metadata per footprint. Sheets that hold no
//! footprints cannot be discovered.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::board::{Board, BoardLoader, Footprint};
use crate::config::Config;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::room::Room;

use super::tree::{RoomId, ScopeTree};

/// Scope path of a footprint: its hierarchical path minus the final segment.
///
/// Returns `None` for footprints that are not placed on any sheet.
pub fn scope_key(footprint: &Footprint) -> Option<Vec<&str>> {
    let path = footprint.path.as_deref()?;
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() <= 1 || !segments[0].is_empty() {
        return None;
    }
    Some(segments[1..segments.len() - 1].to_vec())
}

/// Template file for a sheet: the sheet file with its extension replaced
pub fn template_path(base_dir: &Path, sheetfile: &str, extension: &str) -> PathBuf {
    base_dir.join(Path::new(sheetfile).with_extension(extension))
}

/// Build the scope tree for `board` and load the rooms it references.
///
/// Rooms are cached per sheet file, so every instance of a sheet shares one
/// room. A template file that exists but cannot be parsed leaves the scope
/// without a room and records an error; the rest of the tree is still built.
/// `board_file` is the file `board` came from: a sheet whose layout resolves
/// to it (usually the root sheet) gets no room.
pub fn build_tree(
    board: &Board,
    base_dir: &Path,
    board_file: Option<&Path>,
    loader: &dyn BoardLoader,
    config: &Config,
    diagnostics: &mut Diagnostics,
) -> ScopeTree {
    let mut tree = ScopeTree::new();
    // `None` means the sheet is known to have no usable layout.
    let mut rooms: HashMap<String, Option<RoomId>> = HashMap::new();

    for fp in &board.footprints {
        let Some(key) = scope_key(fp) else {
            diagnostics.push(
                Diagnostic::info("footprint is not on a sheet, skipping")
                    .with_footprint(&fp.reference)
                    .with_message(format!("path: {:?}", fp.path.as_deref().unwrap_or(""))),
            );
            continue;
        };
        let scope = tree.get_or_create(&key);

        if tree.node(scope).has_metadata() {
            continue;
        }
        let (Some(sheetfile), Some(sheetname)) = (fp.sheetfile.as_deref(), fp.sheetname.as_deref())
        else {
            debug!(reference = %fp.reference, "no sheet file, skipping metadata");
            continue;
        };
        tree.set_metadata(scope, sheetfile, sheetname);

        let room = match rooms.get(sheetfile) {
            Some(room) => *room,
            None => {
                let path = template_path(base_dir, sheetfile, &config.hierarchy.template_extension);
                let room = if board_file.is_some_and(|file| same_file(file, &path)) {
                    debug!(path = %path.display(), "sheet layout is the board itself, not a sub-PCB");
                    None
                } else {
                    load_room(&mut tree, &path, loader, diagnostics)
                };
                rooms.insert(sheetfile.to_string(), room);
                room
            }
        };
        tree.bind_room(scope, room);
    }

    tree
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn load_room(
    tree: &mut ScopeTree,
    path: &Path,
    loader: &dyn BoardLoader,
    diagnostics: &mut Diagnostics,
) -> Option<RoomId> {
    if !path.exists() {
        debug!(path = %path.display(), "no layout for sheet");
        return None;
    }
    match Room::load(path, loader) {
        Ok(room) => Some(tree.add_room(room)),
        Err(e) => {
            diagnostics.push(
                Diagnostic::error("sub-PCB could not be loaded")
                    .with_message(e.to_string())
                    .with_room(path),
            );
            None
        }
    }
}
