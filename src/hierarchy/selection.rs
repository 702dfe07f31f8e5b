//! Which scopes get their room applied
//!
//! On every path from the root to a leaf at most one scope may be selected,
//! and only scopes bound to a legal room may be selected at all. These
//! transitions are plain functions on the tree; a UI calls them and redraws.

use crate::diagnostics::{Diagnostic, Diagnostics};

use super::tree::{ScopeId, ScopeTree};

impl ScopeTree {
    /// Reset the selection to the default: the shallowest legal scope on each path
    pub fn apply_defaults(&mut self) {
        let root = self.root();
        self.apply_defaults_from(root, false);
    }

    fn apply_defaults_from(&mut self, id: ScopeId, ancestor_selected: bool) {
        let selected = !ancestor_selected && self.has_legal_room(id);
        self.node_mut(id).selected = selected;

        let children: Vec<ScopeId> = self.node(id).children().collect();
        for child in children {
            self.apply_defaults_from(child, ancestor_selected || selected);
        }
    }

    /// Whether a scope may be selected right now
    pub fn is_checkable(&self, id: ScopeId) -> bool {
        self.has_legal_room(id) && !self.ancestors(id).any(|a| self.node(a).selected)
    }

    /// Flip the selection of a scope, returning its new state.
    ///
    /// Selecting a scope clears any selection below it. A scope that cannot be
    /// selected is left alone and the refusal is reported.
    pub fn toggle(&mut self, id: ScopeId, diagnostics: &mut Diagnostics) -> bool {
        if self.node(id).selected {
            self.node_mut(id).selected = false;
            return false;
        }
        if !self.is_checkable(id) {
            let reason = if self.has_legal_room(id) {
                "an enclosing sheet is already selected"
            } else {
                "the sheet has no usable sub-PCB"
            };
            diagnostics.push(
                Diagnostic::info("sheet cannot be selected")
                    .with_message(reason)
                    .with_scope(self.identifier(id)),
            );
            return false;
        }

        self.node_mut(id).selected = true;
        let below: Vec<ScopeId> = self.iter_from(id).skip(1).collect();
        for descendant in below {
            self.node_mut(descendant).selected = false;
        }
        true
    }

    /// Force a selection state without any checks.
    ///
    /// Used when restoring persisted state; follow with [`cleanup_selection`].
    ///
    /// [`cleanup_selection`]: ScopeTree::cleanup_selection
    pub fn set_selected(&mut self, id: ScopeId, selected: bool) {
        self.node_mut(id).selected = selected;
    }

    /// Drop any selection that breaks the invariant, keeping the shallowest
    /// selected legal scope on each path.
    pub fn cleanup_selection(&mut self) {
        let root = self.root();
        self.cleanup_from(root, false);
    }

    fn cleanup_from(&mut self, id: ScopeId, ancestor_selected: bool) {
        if ancestor_selected || !self.has_legal_room(id) {
            self.node_mut(id).selected = false;
        }
        let selected = self.node(id).selected;
        let children: Vec<ScopeId> = self.node(id).children().collect();
        for child in children {
            self.cleanup_from(child, ancestor_selected || selected);
        }
    }

    /// Selected scopes in pre-order
    pub fn selected(&self) -> Vec<ScopeId> {
        self.iter().filter(|id| self.node(*id).selected).collect()
    }
}
