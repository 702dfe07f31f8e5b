//! In-memory board model
//!
//! This is the board collaborator the replication engine works against: a flat
//! set of typed items (footprints, tracks, zones, free graphics), a net
//! registry and named groups. Boards are exchanged as JSON documents through
//! [`BoardLoader`].

mod io;
mod items;
mod types;

pub use io::{load_board, save_board, BoardError, BoardLoader, JsonBoardLoader};
pub use items::{
    flip_layer, Drawing, DrawingShape, Extra, Field, Footprint, Group, HJustify, Pad, Track, TrackShape,
    VJustify, Zone, ZoneConnection,
};
pub use types::{
    normalize_angle, round_to_nm, ItemId, Net, NetCode, NetRegistry, Point, Size, NM_PER_MM,
};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The kinds of item a board holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Footprint,
    Track,
    Zone,
    Drawing,
}

/// A complete board: the target layout or one template room
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub nets: NetRegistry,
    #[serde(default)]
    pub footprints: Vec<Footprint>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub drawings: Vec<Drawing>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(flatten)]
    pub extra: Extra,
    #[serde(skip)]
    next_id: u64,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign ids to items that lack one and drop group members that no longer exist.
    ///
    /// Called after deserialization; safe to call repeatedly.
    pub fn normalize(&mut self) {
        let max = self
            .footprints
            .iter()
            .map(|f| f.id)
            .chain(self.tracks.iter().map(|t| t.id))
            .chain(self.zones.iter().map(|z| z.id))
            .chain(self.drawings.iter().map(|d| d.id))
            .map(|id| id.0)
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(max + 1);

        for i in 0..self.footprints.len() {
            if !self.footprints[i].id.is_assigned() {
                self.footprints[i].id = self.allocate_id();
            }
        }
        for i in 0..self.tracks.len() {
            if !self.tracks[i].id.is_assigned() {
                self.tracks[i].id = self.allocate_id();
            }
        }
        for i in 0..self.zones.len() {
            if !self.zones[i].id.is_assigned() {
                self.zones[i].id = self.allocate_id();
            }
        }
        for i in 0..self.drawings.len() {
            if !self.drawings[i].id.is_assigned() {
                self.drawings[i].id = self.allocate_id();
            }
        }

        let live = self.item_kinds();
        for group in &mut self.groups {
            group.members.retain(|id| live.contains_key(id));
        }
    }

    fn allocate_id(&mut self) -> ItemId {
        if self.next_id == 0 {
            self.next_id = 1;
        }
        let id = ItemId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Map every item id on the board to its kind
    pub fn item_kinds(&self) -> HashMap<ItemId, ItemKind> {
        let mut kinds = HashMap::new();
        kinds.extend(self.footprints.iter().map(|f| (f.id, ItemKind::Footprint)));
        kinds.extend(self.tracks.iter().map(|t| (t.id, ItemKind::Track)));
        kinds.extend(self.zones.iter().map(|z| (z.id, ItemKind::Zone)));
        kinds.extend(self.drawings.iter().map(|d| (d.id, ItemKind::Drawing)));
        kinds
    }

    // ── Footprints ────────────────────────────────────────────────

    pub fn add_footprint(&mut self, mut footprint: Footprint) -> ItemId {
        footprint.id = self.allocate_id();
        let id = footprint.id;
        self.footprints.push(footprint);
        id
    }

    pub fn footprint(&self, id: ItemId) -> Option<&Footprint> {
        self.footprints.iter().find(|f| f.id == id)
    }

    pub fn footprint_mut(&mut self, id: ItemId) -> Option<&mut Footprint> {
        self.footprints.iter_mut().find(|f| f.id == id)
    }

    pub fn footprint_by_reference(&self, reference: &str) -> Option<&Footprint> {
        self.footprints.iter().find(|f| f.reference == reference)
    }

    /// Lookup table from hierarchical path to footprint id
    pub fn footprints_by_path(&self) -> HashMap<String, ItemId> {
        self.footprints
            .iter()
            .filter_map(|f| f.path.as_ref().map(|p| (p.clone(), f.id)))
            .collect()
    }

    // ── Tracks, zones and drawings ────────────────────────────────

    pub fn add_track(&mut self, mut track: Track) -> ItemId {
        track.id = self.allocate_id();
        let id = track.id;
        self.tracks.push(track);
        id
    }

    pub fn add_zone(&mut self, mut zone: Zone) -> ItemId {
        zone.id = self.allocate_id();
        let id = zone.id;
        self.zones.push(zone);
        id
    }

    pub fn add_drawing(&mut self, mut drawing: Drawing) -> ItemId {
        drawing.id = self.allocate_id();
        let id = drawing.id;
        self.drawings.push(drawing);
        id
    }

    /// Remove an item of any kind, along with its group membership.
    ///
    /// Returns the kind of the removed item, or `None` if no such item exists.
    pub fn remove_item(&mut self, id: ItemId) -> Option<ItemKind> {
        let kind = if let Some(pos) = self.footprints.iter().position(|f| f.id == id) {
            self.footprints.remove(pos);
            ItemKind::Footprint
        } else if let Some(pos) = self.tracks.iter().position(|t| t.id == id) {
            self.tracks.remove(pos);
            ItemKind::Track
        } else if let Some(pos) = self.zones.iter().position(|z| z.id == id) {
            self.zones.remove(pos);
            ItemKind::Zone
        } else if let Some(pos) = self.drawings.iter().position(|d| d.id == id) {
            self.drawings.remove(pos);
            ItemKind::Drawing
        } else {
            return None;
        };
        for group in &mut self.groups {
            group.members.remove(&id);
        }
        Some(kind)
    }

    // ── Groups ────────────────────────────────────────────────────

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Get a group by name, creating an empty one if absent
    pub fn group_or_create(&mut self, name: &str) -> &mut Group {
        let pos = match self.groups.iter().position(|g| g.name == name) {
            Some(pos) => pos,
            None => {
                self.groups.push(Group::new(name));
                self.groups.len() - 1
            }
        };
        &mut self.groups[pos]
    }

    /// Name of the group an item belongs to, if any
    pub fn group_of(&self, id: ItemId) -> Option<&str> {
        self.groups
            .iter()
            .find(|g| g.contains(id))
            .map(|g| g.name.as_str())
    }

    /// Remove an item from whatever group holds it
    pub fn ungroup(&mut self, id: ItemId) {
        for group in &mut self.groups {
            group.members.remove(&id);
        }
    }

    /// Put an item in the named group, creating the group if needed.
    /// The item leaves any other group first.
    pub fn add_to_group(&mut self, name: &str, id: ItemId) {
        self.ungroup(id);
        self.group_or_create(name).members.insert(id);
    }
}
