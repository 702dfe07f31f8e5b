//! Restore and persist the selection and anchor choices of a scope tree
//!
//! Layout inside the [`StateStore`]:
//!
//! ```text
//! sheet/<scope identifier>/checked          bool
//! subpcb/<room path relative to base>/anchor string (footprint reference)
//! ```

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::hierarchy::{RoomId, ScopeTree};
use crate::room::Room;
use crate::state::{StateError, StateStore};

const SHEET: &str = "sheet";
const SUBPCB: &str = "subpcb";
const CHECKED: &str = "checked";
const ANCHOR: &str = "anchor";

/// Key under which a room's anchor is stored
pub fn room_key(room: &Room, base_dir: &Path) -> String {
    let path = room.path();
    path.strip_prefix(base_dir)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Restore anchors and selection from `store`.
///
/// Rooms without a stored (or still valid) anchor fall back to the heuristic
/// anchor. The restored selection is cleaned up so it satisfies the selection
/// invariant. Returns `false` when the store held no selection at all.
pub fn load_state(
    tree: &mut ScopeTree,
    store: &dyn StateStore,
    base_dir: &Path,
    diagnostics: &mut Diagnostics,
) -> bool {
    let rooms: Vec<RoomId> = tree.rooms().map(|(id, _)| id).collect();
    for id in rooms {
        let key = room_key(tree.room(id), base_dir);
        let stored = store
            .get(&[SUBPCB, key.as_str(), ANCHOR])
            .and_then(Value::as_str)
            .map(str::to_string);

        let room = tree.room_mut(id);
        let restored = match stored {
            Some(reference) => room.set_anchor(&reference, diagnostics),
            None => false,
        };
        if !restored {
            if let Some(reference) = room.heuristic_anchor() {
                debug!(room = %key, anchor = %reference, "using heuristic anchor");
                room.set_anchor(&reference, diagnostics);
            }
        }
    }

    let has_selection = store.get(&[SHEET]).is_some();
    let scopes: Vec<_> = tree.iter().skip(1).collect();
    for scope in scopes {
        let identifier = tree.identifier(scope);
        let checked = store
            .get(&[SHEET, identifier.as_str(), CHECKED])
            .and_then(Value::as_bool)
            .unwrap_or(false);
        tree.set_selected(scope, checked);
    }
    tree.cleanup_selection();
    has_selection
}

/// Write the current anchors and selection to `store`, replacing what was there
pub fn save_state(
    tree: &ScopeTree,
    store: &mut dyn StateStore,
    base_dir: &Path,
) -> Result<(), StateError> {
    store.clear(&[SUBPCB]);
    for (_, room) in tree.rooms() {
        if let Some(reference) = room.anchor_reference() {
            let key = room_key(room, base_dir);
            store.set(&[SUBPCB, key.as_str(), ANCHOR], Value::from(reference))?;
        }
    }

    store.clear(&[SHEET]);
    for scope in tree.iter().skip(1) {
        let identifier = tree.identifier(scope);
        store.set(
            &[SHEET, identifier.as_str(), CHECKED],
            Value::from(tree.node(scope).is_selected()),
        )?;
    }
    Ok(())
}
