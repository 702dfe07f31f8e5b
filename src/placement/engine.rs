//! Synthesis: regenerate every selected scope instance from its room
//!
//! Scopes are visited in the tree's pre-order. For each selected scope with a
//! room:
//!
//! 1. Resolve the target anchor at `scope identifier + room anchor path`
//! 2. Bind the scope's group and pull the anchor into it
//! 3. Delete previously generated tracks, zones and graphics of the group
//! 4. Move footprints, their fields, and learn net correspondences
//! 5. Recreate tracks with remapped nets
//! 6. Recreate zones and free graphics
//!
//! Structural problems (illegal room, missing anchor) skip the scope before
//! anything on the board is touched. Missing correspondences only skip the
//! item concerned.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::board::{Board, DrawingShape, Extra, Footprint, ItemId, NetCode, TrackShape};
use crate::config::Config;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::hierarchy::{ScopeId, ScopeTree};
use crate::room::Room;

use super::groups::{clear_generated, enforce_membership, group_name};
use super::nets::NetMapping;
use super::transform::{Pose, PositionTransform};

/// Apply every selected room to `board`, returning what went wrong along the way
pub fn synthesize(tree: &ScopeTree, board: &mut Board, config: &Config) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    for scope in tree.iter() {
        if !tree.node(scope).is_selected() {
            continue;
        }
        let Some(room) = tree.room_of(scope) else {
            continue;
        };
        let mut ctx = ScopeContext {
            tree,
            scope,
            room,
            identifier: tree.identifier(scope),
            config,
            diagnostics: &mut diagnostics,
        };
        ctx.run(board);
    }
    diagnostics
}

/// Everything needed to synthesize one scope instance
struct ScopeContext<'a> {
    tree: &'a ScopeTree,
    scope: ScopeId,
    room: &'a Room,
    identifier: String,
    config: &'a Config,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> ScopeContext<'a> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(
            diagnostic
                .with_scope(self.identifier.clone())
                .with_room(self.room.path()),
        );
    }

    fn run(&mut self, board: &mut Board) {
        let lookup = board.footprints_by_path();
        let Some((anchor, target_anchor)) = self.resolve_anchor(&lookup) else {
            return;
        };
        let Some(target_pose) = board.footprint(target_anchor).map(Pose::from) else {
            return;
        };
        let transform = PositionTransform::new(Pose::from(anchor), target_pose);
        let group = group_name(self.tree, self.scope, self.config);
        info!(scope = %self.identifier, %group, anchor = %anchor.reference, "synthesizing");

        board.group_or_create(&group);
        if enforce_membership(board, &group, target_anchor) {
            self.report(
                Diagnostic::info("anchor footprint was in the wrong group")
                    .with_message(format!("moved into group {}", group))
                    .with_footprint(&anchor.reference),
            );
        }

        clear_generated(board, &group);
        let mapping = self.footprints(board, &lookup, &transform, &group);
        self.tracks(board, &mapping, &transform, &group);
        self.zones_and_drawings(board, &mapping, &transform, &group);
    }

    /// Room anchor and the id of its counterpart on the board, or an error
    fn resolve_anchor(
        &mut self,
        lookup: &HashMap<String, ItemId>,
    ) -> Option<(&'a Footprint, ItemId)> {
        let room = self.room;
        if !room.is_legal() {
            self.report(
                Diagnostic::error("sub-PCB cannot be placed").with_message("it has no footprints"),
            );
            return None;
        }
        let Some(anchor) = room.anchor() else {
            self.report(Diagnostic::error("sub-PCB has no anchor selected"));
            return None;
        };
        let Some(path) = anchor.path.as_deref().filter(|p| !p.is_empty()) else {
            self.report(
                Diagnostic::error("anchor footprint has no path")
                    .with_footprint(&anchor.reference),
            );
            return None;
        };
        let expected = format!("{}{}", self.identifier, path);
        match lookup.get(&expected) {
            Some(id) => Some((anchor, *id)),
            None => {
                self.report(
                    Diagnostic::error("anchor not found on target")
                        .with_message(format!("expected path {}", expected))
                        .with_footprint(&anchor.reference),
                );
                None
            }
        }
    }

    fn footprints(
        &mut self,
        board: &mut Board,
        lookup: &HashMap<String, ItemId>,
        transform: &PositionTransform,
        group: &str,
    ) -> NetMapping {
        let mut mapping = NetMapping::new();
        let room = self.room;

        for template in &room.board().footprints {
            let Some(path) = template.path.as_deref().filter(|p| !p.is_empty()) else {
                self.report(
                    Diagnostic::warning("footprint has no path, skipping")
                        .with_footprint(&template.reference),
                );
                continue;
            };
            let expected = format!("{}{}", self.identifier, path);
            let Some(target_id) = lookup.get(&expected).copied() else {
                self.report(
                    Diagnostic::warning("footprint not found, skipping")
                        .with_message(format!("expected path {}", expected))
                        .with_footprint(&template.reference),
                );
                continue;
            };
            let Some(target) = board.footprint_mut(target_id) else {
                continue;
            };

            transform.footprint(template, target);
            place_fields(transform, template, target);

            let conflicts = mapping.add_pads(template, target);
            let reference = target.reference.clone();
            for conflict in conflicts {
                let kept = net_name(board, conflict.kept);
                let rejected = net_name(board, conflict.rejected);
                let template_net = net_name(room.board(), conflict.template);
                self.report(
                    Diagnostic::warning("conflicting net correspondence")
                        .with_message(format!(
                            "{} already maps to {}, ignoring {}",
                            template_net, kept, rejected
                        ))
                        .with_footprint(reference.clone()),
                );
            }

            if enforce_membership(board, group, target_id) {
                self.report(
                    Diagnostic::info("footprint was in the wrong group")
                        .with_message(format!("moved into group {}", group))
                        .with_footprint(reference),
                );
            }
        }

        if self.config.placement.match_global_nets {
            let added = mapping.match_global_nets(&room.board().nets, &board.nets);
            debug!(scope = %self.identifier, added, "matched global nets by name");
        }
        mapping
    }

    fn tracks(
        &mut self,
        board: &mut Board,
        mapping: &NetMapping,
        transform: &PositionTransform,
        group: &str,
    ) {
        let room = self.room;
        for template in &room.board().tracks {
            if let TrackShape::Unknown(raw) = &template.shape {
                self.report(
                    Diagnostic::warning("unknown track type, skipping")
                        .with_message(raw_kind(raw)),
                );
                continue;
            }
            let mut track = transform.track(template);
            track.net = mapping.get(template.net);
            if track.net.is_none() && !template.net.is_none() {
                debug!(net = template.net.0, "track net has no counterpart, leaving unconnected");
            }
            let id = board.add_track(track);
            board.add_to_group(group, id);
        }
    }

    fn zones_and_drawings(
        &mut self,
        board: &mut Board,
        mapping: &NetMapping,
        transform: &PositionTransform,
        group: &str,
    ) {
        let room = self.room;
        for template in &room.board().zones {
            let mut zone = transform.zone(template);
            zone.net = mapping.get(template.net);
            let id = board.add_zone(zone);
            board.add_to_group(group, id);
        }

        for template in &room.board().drawings {
            if let DrawingShape::Unknown(raw) = &template.shape {
                self.report(
                    Diagnostic::warning("unknown shape type, skipping")
                        .with_message(raw_kind(raw)),
                );
                continue;
            }
            let id = board.add_drawing(transform.drawing(template));
            board.add_to_group(group, id);
        }
    }
}

/// The declared type of an item the board model could not interpret
fn raw_kind(raw: &Extra) -> String {
    match raw.get("type").and_then(|t| t.as_str()) {
        Some(kind) => format!("type '{}'", kind),
        None => "no type given".to_string(),
    }
}

/// Move fields that exist on both sides and drop target fields the room lacks
fn place_fields(transform: &PositionTransform, template: &Footprint, target: &mut Footprint) {
    target.fields.retain(|f| template.field(&f.name).is_some());
    for field in &mut target.fields {
        if let Some(src) = template.field(&field.name) {
            transform.field(src, field);
        }
    }
    for src in &template.fields {
        if target.field(&src.name).is_none() {
            debug!(reference = %target.reference, field = %src.name, "no matching field on target");
        }
    }
}

fn net_name(board: &Board, code: NetCode) -> String {
    board
        .nets
        .get(code)
        .map(|n| n.name.clone())
        .unwrap_or_else(|| format!("net {}", code.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Drawing, Field, Pad, Point, Track, Zone};
    use crate::diagnostics::Severity;

    const MM: i64 = 1_000_000;

    fn fp(reference: &str, path: &str, at: Point) -> Footprint {
        let mut fp = Footprint::new(reference, at);
        fp.path = Some(path.to_string());
        fp.sheetfile = Some("amp.kicad_sch".to_string());
        fp.sheetname = Some("Amp".to_string());
        fp
    }

    /// Room with an anchor U1 at the origin and R1 2 mm to its right
    fn room_board() -> Board {
        let mut board = Board::new();
        let sig = board.nets.find_or_create("/sig");
        let gnd = board.nets.find_or_create("GND");
        let mut u1 = fp("U1", "/u1", Point::new(0, 0));
        u1.pads = vec![Pad::new("1", sig), Pad::new("2", gnd)];
        u1.fields = vec![Field::new("Reference", Point::new(0, -MM))];
        board.add_footprint(u1);
        let mut r1 = fp("R1", "/r1", Point::new(2 * MM, 0));
        r1.pads = vec![Pad::new("1", sig)];
        board.add_footprint(r1);
        board.add_track(Track::segment(
            Point::new(0, 0),
            Point::new(2 * MM, 0),
            250_000,
            "F.Cu",
            sig,
        ));
        board.add_zone(Zone {
            id: ItemId::default(),
            name: "gnd".to_string(),
            outline: vec![Point::new(0, 0), Point::new(MM, 0), Point::new(MM, MM)],
            layer: "F.Cu".to_string(),
            net: gnd,
            priority: 0,
            extra: Extra::new(),
        });
        board.add_drawing(Drawing {
            id: ItemId::default(),
            shape: DrawingShape::Line {
                start: Point::new(0, 0),
                end: Point::new(0, MM),
            },
            layer: "F.SilkS".to_string(),
            width: 100_000,
            extra: Extra::new(),
        });
        board
    }

    /// Target with one instance of the room under `/amp1`, anchor rotated by 90°
    fn target_board() -> Board {
        let mut board = Board::new();
        let sig = board.nets.find_or_create("/amp1/sig");
        let gnd = board.nets.find_or_create("GND");
        let mut u1 = fp("U7", "/amp1/u1", Point::new(10 * MM, 10 * MM));
        u1.orientation = 90.0;
        u1.pads = vec![Pad::new("1", sig), Pad::new("2", gnd)];
        u1.fields = vec![
            Field::new("Reference", Point::new(0, 0)),
            Field::new("Stale", Point::new(0, 0)),
        ];
        board.add_footprint(u1);
        let mut r1 = fp("R9", "/amp1/r1", Point::new(0, 0));
        r1.pads = vec![Pad::new("1", sig)];
        board.add_footprint(r1);
        board
    }

    fn tree_with(room: Board, anchor: Option<&str>) -> ScopeTree {
        let mut tree = ScopeTree::new();
        let scope = tree.get_or_create(&["amp1"]);
        tree.set_metadata(scope, "amp.kicad_sch", "Amp");
        let mut room = Room::from_board("amp.kicad_pcb.json", room);
        if let Some(reference) = anchor {
            room.set_anchor(reference, &mut Diagnostics::new());
        }
        let room = tree.add_room(room);
        tree.bind_room(scope, Some(room));
        tree.set_selected(scope, true);
        tree
    }

    #[test]
    fn test_synthesize_places_everything() {
        let tree = tree_with(room_board(), Some("U1"));
        let mut board = target_board();
        let diags = synthesize(&tree, &mut board, &Config::default());
        assert!(diags.is_empty(), "{:?}", diags);

        let r9 = board.footprint_by_reference("R9").unwrap();
        // 2 mm to the right of the anchor, rotated a quarter turn counter-clockwise
        assert_eq!(r9.position, Point::new(10 * MM, 8 * MM));
        assert_eq!(r9.orientation, 90.0);

        let u7 = board.footprint_by_reference("U7").unwrap();
        assert_eq!(u7.position, Point::new(10 * MM, 10 * MM));
        let names: Vec<&str> = u7.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Reference"]);
        assert_eq!(u7.fields[0].position, Point::new(9 * MM, 10 * MM));

        let sig = board.nets.find("/amp1/sig").unwrap();
        let gnd = board.nets.find("GND").unwrap();
        assert_eq!(board.tracks.len(), 1);
        assert_eq!(board.tracks[0].net, sig);
        assert_eq!(
            board.tracks[0].shape,
            TrackShape::Segment {
                start: Point::new(10 * MM, 10 * MM),
                end: Point::new(10 * MM, 8 * MM),
            }
        );
        assert_eq!(board.zones[0].net, gnd);
        assert_eq!(board.drawings.len(), 1);

        let group = board.group("subpcb_/Amp").unwrap();
        assert_eq!(group.members.len(), 5);
    }

    #[test]
    fn test_synthesize_is_idempotent() {
        let tree = tree_with(room_board(), Some("U1"));
        let mut board = target_board();
        let config = Config::default();
        synthesize(&tree, &mut board, &config);
        let first = board.clone();
        synthesize(&tree, &mut board, &config);

        assert_eq!(board.footprints, first.footprints);
        assert_eq!(board.tracks.len(), first.tracks.len());
        assert_eq!(board.zones.len(), first.zones.len());
        assert_eq!(board.drawings.len(), first.drawings.len());
        for (a, b) in board.tracks.iter().zip(&first.tracks) {
            assert_eq!((&a.shape, a.net, &a.layer), (&b.shape, b.net, &b.layer));
        }
        assert_eq!(board.groups.len(), 1);
        assert_eq!(board.groups[0].members.len(), first.groups[0].members.len());
    }

    #[test]
    fn test_missing_anchor_target_is_one_error_without_mutation() {
        let tree = tree_with(room_board(), Some("U1"));
        let mut board = target_board();
        board.footprints[0].path = Some("/elsewhere/u1".to_string());
        let before = board.clone();

        let diags = synthesize(&tree, &mut board, &Config::default());
        assert_eq!(diags.len(), 1);
        let error = diags.iter().next().unwrap();
        assert_eq!(error.severity, Severity::Error);
        assert_eq!(error.scope.as_deref(), Some("/amp1"));
        assert_eq!(board, before);
    }

    #[test]
    fn test_no_anchor_selected_is_error() {
        let tree = tree_with(room_board(), None);
        let mut board = target_board();
        let diags = synthesize(&tree, &mut board, &Config::default());
        assert_eq!(diags.errors().count(), 1);
        assert!(board.groups.is_empty());
    }

    #[test]
    fn test_missing_footprint_is_warning() {
        let tree = tree_with(room_board(), Some("U1"));
        let mut board = target_board();
        board.footprints.retain(|f| f.reference != "R9");

        let diags = synthesize(&tree, &mut board, &Config::default());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.warnings().count(), 1);
        assert_eq!(board.tracks.len(), 1);
    }

    #[test]
    fn test_unknown_kinds_are_skipped_with_warnings() {
        let mut room = room_board();
        let raw_track: Track =
            serde_json::from_str(r#"{"type": "teardrop", "points": [1, 2], "net": 1}"#).unwrap();
        room.add_track(raw_track);
        let raw_drawing: Drawing =
            serde_json::from_str(r#"{"type": "bezier", "c1": {"x": 0, "y": 0}}"#).unwrap();
        room.add_drawing(raw_drawing);
        let tree = tree_with(room, Some("U1"));
        let mut board = target_board();

        let diags = synthesize(&tree, &mut board, &Config::default());
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.warnings().count(), 2);
        assert!(diags.iter().all(|d| d.scope.as_deref() == Some("/amp1")));
        let messages: Vec<_> = diags.iter().filter_map(|d| d.message.as_deref()).collect();
        assert_eq!(messages, vec!["type 'teardrop'", "type 'bezier'"]);

        // Only the known items were generated
        assert_eq!(board.tracks.len(), 1);
        assert_eq!(board.tracks[0].shape.kind(), "segment");
        assert_eq!(board.zones.len(), 1);
        assert_eq!(board.drawings.len(), 1);
        assert_eq!(board.drawings[0].shape.kind(), "line");
        assert_eq!(
            board.footprint_by_reference("R9").unwrap().position,
            Point::new(10 * MM, 8 * MM)
        );
        assert_eq!(board.group("subpcb_/Amp").unwrap().members.len(), 5);
    }

    #[test]
    fn test_anchor_in_foreign_group_is_repaired() {
        let tree = tree_with(room_board(), Some("U1"));
        let mut board = target_board();
        let u7 = board.footprint_by_reference("U7").unwrap().id;
        board.add_to_group("manual", u7);

        let diags = synthesize(&tree, &mut board, &Config::default());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.worst(), Some(Severity::Info));
        assert_eq!(board.group_of(u7), Some("subpcb_/Amp"));
    }

    #[test]
    fn test_unselected_scope_is_untouched() {
        let mut tree = tree_with(room_board(), Some("U1"));
        let scope = tree.find("/amp1").unwrap();
        tree.set_selected(scope, false);
        let mut board = target_board();
        let before = board.clone();

        assert!(synthesize(&tree, &mut board, &Config::default()).is_empty());
        assert_eq!(board, before);
    }

    #[test]
    fn test_global_nets_can_be_disabled() {
        let mut room = room_board();
        let vcc = room.nets.find_or_create("VCC");
        room.add_track(Track::segment(
            Point::new(0, 0),
            Point::new(0, MM),
            1,
            "F.Cu",
            vcc,
        ));
        let tree = tree_with(room, Some("U1"));

        let mut board = target_board();
        let target_vcc = board.nets.find_or_create("VCC");
        synthesize(&tree, &mut board, &Config::default());
        assert!(board.tracks.iter().any(|t| t.net == target_vcc));

        let mut board = target_board();
        board.nets.find_or_create("VCC");
        synthesize(&tree, &mut board, &Config::default().with_match_global_nets(false));
        assert!(board.tracks.iter().all(|t| t.net != target_vcc));
        assert!(board.tracks.iter().any(|t| t.net == NetCode::NONE));
    }
}
