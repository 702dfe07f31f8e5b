//! Arena-backed tree of schematic scopes

use std::collections::BTreeMap;
use std::fmt;

use crate::room::Room;

/// Index of a node in a [`ScopeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub(crate) usize);

/// Index of a room in a [`ScopeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(pub(crate) usize);

/// One level of the design hierarchy: a schematic sheet instance
#[derive(Debug, Clone)]
pub struct ScopeNode {
    /// Local segment, unique among siblings. Empty only for the root.
    pub id: String,
    pub(crate) parent: Option<ScopeId>,
    pub(crate) children: BTreeMap<String, ScopeId>,
    sheetfile: Option<String>,
    sheetname: Option<String>,
    pub(crate) room: Option<RoomId>,
    pub(crate) selected: bool,
}

impl ScopeNode {
    fn new(id: impl Into<String>, parent: Option<ScopeId>) -> Self {
        Self {
            id: id.into(),
            parent,
            children: BTreeMap::new(),
            sheetfile: None,
            sheetname: None,
            room: None,
            selected: false,
        }
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Children in ascending id order
    pub fn children(&self) -> impl Iterator<Item = ScopeId> + '_ {
        self.children.values().copied()
    }

    pub fn sheetfile(&self) -> Option<&str> {
        self.sheetfile.as_deref()
    }

    pub fn sheetname(&self) -> Option<&str> {
        self.sheetname.as_deref()
    }

    pub fn has_metadata(&self) -> bool {
        self.sheetfile.is_some() && self.sheetname.is_some()
    }

    pub fn room(&self) -> Option<RoomId> {
        self.room
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Sheet name if known, otherwise the first 8 characters of the id
    pub fn human_name(&self) -> String {
        match &self.sheetname {
            Some(name) => name.clone(),
            None => self.id.chars().take(8).collect(),
        }
    }
}

/// The inferred scope hierarchy together with the rooms bound to it
#[derive(Debug, Clone)]
pub struct ScopeTree {
    nodes: Vec<ScopeNode>,
    rooms: Vec<Room>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// A tree holding only the root scope
    pub fn new() -> Self {
        Self {
            nodes: vec![ScopeNode::new("", None)],
            rooms: Vec::new(),
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn node(&self, id: ScopeId) -> &ScopeNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: ScopeId) -> &mut ScopeNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Walk `key` down from the root, creating missing nodes
    pub fn get_or_create(&mut self, key: &[&str]) -> ScopeId {
        let mut current = self.root();
        for segment in key {
            current = match self.nodes[current.0].children.get(*segment) {
                Some(child) => *child,
                None => {
                    let child = ScopeId(self.nodes.len());
                    self.nodes.push(ScopeNode::new(*segment, Some(current)));
                    self.nodes[current.0]
                        .children
                        .insert(segment.to_string(), child);
                    child
                }
            };
        }
        current
    }

    /// Walk `key` down from the root without creating anything
    pub fn get(&self, key: &[&str]) -> Option<ScopeId> {
        let mut current = self.root();
        for segment in key {
            current = *self.nodes[current.0].children.get(*segment)?;
        }
        Some(current)
    }

    /// Find a node by its full identifier (`"/a/b"`, root is `""`)
    pub fn find(&self, identifier: &str) -> Option<ScopeId> {
        if identifier.is_empty() {
            return Some(self.root());
        }
        let key: Vec<&str> = identifier.strip_prefix('/')?.split('/').collect();
        self.get(&key)
    }

    /// Record sheet metadata. The first writer wins; later calls are ignored.
    ///
    /// Returns whether the metadata was recorded.
    pub fn set_metadata(&mut self, id: ScopeId, sheetfile: &str, sheetname: &str) -> bool {
        let node = &mut self.nodes[id.0];
        if node.has_metadata() {
            return false;
        }
        node.sheetfile = Some(sheetfile.to_string());
        node.sheetname = Some(sheetname.to_string());
        true
    }

    /// Bind a room to a scope. Only scopes with metadata can hold a room.
    pub(crate) fn bind_room(&mut self, id: ScopeId, room: Option<RoomId>) {
        debug_assert!(room.is_none() || self.nodes[id.0].has_metadata());
        self.nodes[id.0].room = room;
    }

    pub(crate) fn add_room(&mut self, room: Room) -> RoomId {
        self.rooms.push(room);
        RoomId(self.rooms.len() - 1)
    }

    pub fn room(&self, id: RoomId) -> &Room {
        &self.rooms[id.0]
    }

    pub fn room_mut(&mut self, id: RoomId) -> &mut Room {
        &mut self.rooms[id.0]
    }

    /// All loaded rooms with their ids
    pub fn rooms(&self) -> impl Iterator<Item = (RoomId, &Room)> {
        self.rooms.iter().enumerate().map(|(i, r)| (RoomId(i), r))
    }

    /// The room bound to a scope
    pub fn room_of(&self, id: ScopeId) -> Option<&Room> {
        self.nodes[id.0].room.map(|r| &self.rooms[r.0])
    }

    /// Whether the scope has a room that can be replicated
    pub fn has_legal_room(&self, id: ScopeId) -> bool {
        self.room_of(id).is_some_and(|r| r.is_legal())
    }

    /// Full identifier: parent identifier + "/" + id, root is ""
    pub fn identifier(&self, id: ScopeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            let node = &self.nodes[c.0];
            if node.parent.is_some() {
                segments.push(node.id.as_str());
            }
            current = node.parent;
        }
        segments
            .iter()
            .rev()
            .map(|s| format!("/{}", s))
            .collect()
    }

    /// Human-readable path built from sheet names
    pub fn human_path(&self, id: ScopeId) -> String {
        let node = &self.nodes[id.0];
        match node.parent {
            None => node.human_name(),
            Some(parent) => format!("{}/{}", self.human_path(parent), node.human_name()),
        }
    }

    /// Strict ancestors of a node, nearest first
    pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(self.nodes[id.0].parent, move |p| self.nodes[p.0].parent)
    }

    /// Pre-order traversal from the root, children in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = ScopeId> + '_ {
        self.iter_from(self.root())
    }

    /// Pre-order traversal of the subtree rooted at `start`
    pub fn iter_from(&self, start: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        let mut stack = vec![start];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(self.nodes[next.0].children.values().rev().copied());
            Some(next)
        })
    }

    fn fmt_node(&self, id: ScopeId, out: &mut Vec<String>) {
        let node = &self.nodes[id.0];
        let mut head = if node.parent.is_none() {
            "<root>".to_string()
        } else {
            node.human_name()
        };
        if let Some(room) = self.room_of(id) {
            head.push_str(&format!(" (+ PCB {})", room.path().display()));
        }
        if node.selected {
            head.push_str(" [x]");
        }
        out.push(head);
        for child in node.children.values() {
            let mut lines = Vec::new();
            self.fmt_node(*child, &mut lines);
            let mut lines = lines.into_iter();
            if let Some(first) = lines.next() {
                out.push(format!("├─ {}", first));
            }
            for line in lines {
                out.push(format!("│  {}", line));
            }
        }
    }
}

impl fmt::Display for ScopeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        self.fmt_node(self.root(), &mut lines);
        write!(f, "{}", lines.join("\n"))
    }
}
