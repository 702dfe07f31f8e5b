//! Per-scope groups on the target board
//!
//! Everything synthesized for one scope instance lives in one named group.
//! Tracks, zones and graphics in that group are regenerated on every run;
//! footprints are only moved.

use tracing::debug;

use crate::board::{Board, ItemId, ItemKind};
use crate::config::Config;
use crate::hierarchy::{ScopeId, ScopeTree};

/// Name of the group holding a scope's generated content
pub fn group_name(tree: &ScopeTree, scope: ScopeId, config: &Config) -> String {
    format!("{}{}", config.placement.group_prefix, tree.human_path(scope))
}

/// Make `id` a member of `group`, creating the group if needed.
///
/// Returns `true` when the item had to be taken out of a different group.
pub fn enforce_membership(board: &mut Board, group: &str, id: ItemId) -> bool {
    let moved = match board.group_of(id) {
        Some(current) if current == group => return false,
        Some(_) => true,
        None => false,
    };
    board.add_to_group(group, id);
    moved
}

/// Delete the tracks, zones and graphics of a group. Returns how many were removed.
pub fn clear_generated(board: &mut Board, group: &str) -> usize {
    let Some(members) = board.group(group).map(|g| g.members.clone()) else {
        return 0;
    };
    let kinds = board.item_kinds();
    let mut removed = 0;
    for id in members {
        match kinds.get(&id) {
            Some(ItemKind::Track | ItemKind::Zone | ItemKind::Drawing) => {
                board.remove_item(id);
                removed += 1;
            }
            Some(ItemKind::Footprint) | None => {}
        }
    }
    debug!(group, removed, "cleared generated items");
    removed
}
