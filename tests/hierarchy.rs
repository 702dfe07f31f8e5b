//! Scope tree construction and selection on boards with rooms on disk

use std::path::Path;

use hierpcb::board::{save_board, Board, Footprint, Point};
use hierpcb::{build_tree, Config, Diagnostics, JsonBoardLoader, ScopeTree};

fn footprint(reference: &str, path: &str, sheet: (&str, &str)) -> Footprint {
    let mut fp = Footprint::new(reference, Point::new(0, 0));
    fp.path = Some(path.to_string());
    fp.sheetfile = Some(sheet.0.to_string());
    fp.sheetname = Some(sheet.1.to_string());
    fp
}

fn room_with(references: &[&str]) -> Board {
    let mut board = Board::new();
    for reference in references {
        let mut fp = Footprint::new(*reference, Point::new(0, 0));
        fp.path = Some(format!("/{}", reference.to_lowercase()));
        board.add_footprint(fp);
    }
    board
}

/// Two channels, each with a nested filter, plus a power supply without a room
fn target() -> Board {
    let mut board = Board::new();
    for (key, name) in [("ch1", "Left"), ("ch2", "Right")] {
        board.add_footprint(footprint(
            "U1",
            &format!("/{}/u1", key),
            ("channel.kicad_sch", name),
        ));
        board.add_footprint(footprint(
            "C1",
            &format!("/{}/flt/c1", key),
            ("filter.kicad_sch", "Filter"),
        ));
    }
    board.add_footprint(footprint("U9", "/psu/u9", ("psu.kicad_sch", "PSU")));
    board
}

fn build(dir: &Path, diagnostics: &mut Diagnostics) -> ScopeTree {
    build_tree(&target(), dir, None, &JsonBoardLoader, &Config::default(), diagnostics)
}

fn assert_selection_invariant(tree: &ScopeTree) {
    for id in tree.selected() {
        assert!(tree.has_legal_room(id));
        assert!(!tree.ancestors(id).any(|a| tree.node(a).is_selected()));
    }
}

#[test]
fn test_tree_structure() {
    let dir = tempfile::tempdir().unwrap();
    save_board(&room_with(&["U1"]), &dir.path().join("channel.kicad_pcb.json")).unwrap();
    save_board(&room_with(&["C1"]), &dir.path().join("filter.kicad_pcb.json")).unwrap();

    let mut diagnostics = Diagnostics::new();
    let mut tree = build(dir.path(), &mut diagnostics);
    assert!(diagnostics.is_empty());
    tree.apply_defaults();

    let rendered = tree
        .to_string()
        .replace(&format!("{}/", dir.path().display()), "");
    insta::assert_snapshot!(rendered, @r"
    <root>
    ├─ Left (+ PCB channel.kicad_pcb.json) [x]
    │  ├─ Filter (+ PCB filter.kicad_pcb.json)
    ├─ Right (+ PCB channel.kicad_pcb.json) [x]
    │  ├─ Filter (+ PCB filter.kicad_pcb.json)
    ├─ PSU
    ");
    assert_selection_invariant(&tree);
}

#[test]
fn test_instances_share_one_room() {
    let dir = tempfile::tempdir().unwrap();
    save_board(&room_with(&["U1", "R1"]), &dir.path().join("channel.kicad_pcb.json")).unwrap();

    let mut diagnostics = Diagnostics::new();
    let mut tree = build(dir.path(), &mut diagnostics);
    let left = tree.find("/ch1").unwrap();
    let right = tree.find("/ch2").unwrap();
    assert_eq!(tree.node(left).room(), tree.node(right).room());
    assert_eq!(tree.rooms().count(), 1);

    // Choosing an anchor through one instance is visible through the other
    let room = tree.node(left).room().unwrap();
    tree.room_mut(room).set_anchor("R1", &mut diagnostics);
    assert_eq!(tree.room_of(right).unwrap().anchor_reference(), Some("R1"));
}

#[test]
fn test_illegal_outer_room_defers_to_inner() {
    let dir = tempfile::tempdir().unwrap();
    save_board(&Board::new(), &dir.path().join("channel.kicad_pcb.json")).unwrap();
    save_board(&room_with(&["C1"]), &dir.path().join("filter.kicad_pcb.json")).unwrap();

    let mut diagnostics = Diagnostics::new();
    let mut tree = build(dir.path(), &mut diagnostics);
    tree.apply_defaults();

    let selected: Vec<String> = tree.selected().into_iter().map(|id| tree.identifier(id)).collect();
    assert_eq!(selected, vec!["/ch1/flt", "/ch2/flt"]);
    assert_selection_invariant(&tree);

    let ch1 = tree.find("/ch1").unwrap();
    assert!(!tree.is_checkable(ch1));
    assert!(!tree.toggle(ch1, &mut diagnostics));
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn test_toggle_sequences_keep_invariant() {
    let dir = tempfile::tempdir().unwrap();
    save_board(&room_with(&["U1"]), &dir.path().join("channel.kicad_pcb.json")).unwrap();
    save_board(&room_with(&["C1"]), &dir.path().join("filter.kicad_pcb.json")).unwrap();

    let mut diagnostics = Diagnostics::new();
    let mut tree = build(dir.path(), &mut diagnostics);
    tree.apply_defaults();

    let order = ["/ch1/flt", "/ch1", "/ch1/flt", "/ch2", "/ch1", "/ch2/flt", "/psu", "/ch1/flt"];
    for identifier in order {
        let id = tree.find(identifier).unwrap();
        tree.toggle(id, &mut diagnostics);
        assert_selection_invariant(&tree);
    }
}
