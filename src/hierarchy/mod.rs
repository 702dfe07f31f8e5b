//! The scope hierarchy inferred from the target board
//!
//! Scopes are schematic sheet instances. The tree is rebuilt from scratch
//! whenever the board's footprints change; nodes are never removed during a
//! session.

mod builder;
mod selection;
mod tree;

pub use builder::{build_tree, scope_key, template_path};
pub use tree::{RoomId, ScopeId, ScopeNode, ScopeTree};
