//! Integration tests for layout editing and workspace switching

use blocktile_core::layout::{
    BlockSpec, BlockStore, ContentId, DropPosition, LayoutEngine, LayoutNode, MemoryBlockStore,
    RenderKey, SplitDirection, WorkspaceId,
};

fn cid(id: &str) -> ContentId {
    ContentId::from(id)
}

fn engine_with_a() -> LayoutEngine<MemoryBlockStore> {
    let mut store = MemoryBlockStore::new();
    store.insert("A", "shell").unwrap();
    let mut engine = LayoutEngine::new(store);
    engine.init_layout(cid("A"));
    engine
}

fn split_named(
    engine: &mut LayoutEngine<MemoryBlockStore>,
    at: &str,
    direction: SplitDirection,
    new: &str,
) {
    engine
        .split_block(&cid(at), direction, &BlockSpec::new("terminal"), Some(cid(new)))
        .expect(&format!("split {at}"));
}

#[test]
fn fresh_layout_has_branch_root_with_one_leaf() {
    let engine = engine_with_a();
    let json = engine.tree().unwrap().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["type"], "branch");
    assert_eq!(value["direction"], "horizontal");
    assert_eq!(value["sizes"], serde_json::json!([1.0]));
    assert_eq!(value["children"][0]["type"], "leaf");
    assert_eq!(value["children"][0]["contentId"], "A");
}

#[test]
fn wrapped_leaf_keeps_its_render_key() {
    let mut engine = engine_with_a();
    let before = engine.tree().unwrap().as_branch().unwrap().children[0].render_key();
    assert_eq!(before, RenderKey::Content(cid("A")));

    split_named(&mut engine, "A", SplitDirection::Vertical, "C");

    // The node in A's old slot is now a branch, but renders under the same key.
    let slot = &engine.tree().unwrap().as_branch().unwrap().children[0];
    assert!(slot.is_branch());
    assert_eq!(slot.render_key(), before);
}

#[test]
fn close_then_split_reuses_root() {
    let mut engine = engine_with_a();
    let root_id = engine.tree().unwrap().id();
    split_named(&mut engine, "A", SplitDirection::Horizontal, "B");
    engine.close_block(&cid("B")).unwrap();
    split_named(&mut engine, "A", SplitDirection::Horizontal, "C");

    assert_eq!(engine.tree().unwrap().id(), root_id);
    assert_eq!(engine.content_ids(), vec![cid("A"), cid("C")]);
}

#[test]
fn drag_builds_grid_and_back() {
    let mut engine = engine_with_a();
    split_named(&mut engine, "A", SplitDirection::Horizontal, "B");
    split_named(&mut engine, "B", SplitDirection::Horizontal, "C");
    split_named(&mut engine, "C", SplitDirection::Horizontal, "D");

    // Stack D under A and C under B: a two by two grid.
    engine
        .move_block(&cid("D"), &cid("A"), DropPosition::Bottom)
        .unwrap();
    engine
        .move_block(&cid("C"), &cid("B"), DropPosition::Bottom)
        .unwrap();

    let root = engine.tree().unwrap().as_branch().unwrap();
    assert_eq!(root.children.len(), 2);
    for column in &root.children {
        let column = column.as_branch().unwrap();
        assert_eq!(column.direction, SplitDirection::Vertical);
        assert_eq!(column.children.len(), 2);
    }
    assert_eq!(
        engine.content_ids(),
        vec![cid("A"), cid("D"), cid("B"), cid("C")]
    );

    // Pull D back out to the far right.
    engine
        .move_block(&cid("D"), &cid("C"), DropPosition::Right)
        .unwrap();
    assert_eq!(
        engine.content_ids(),
        vec![cid("A"), cid("B"), cid("C"), cid("D")]
    );
    let root = engine.tree().unwrap().as_branch().unwrap();
    assert!(root.children[0].is_leaf());
}

#[test]
fn switching_workspaces_parks_and_restores_layouts() {
    let mut engine = engine_with_a();
    split_named(&mut engine, "A", SplitDirection::Horizontal, "B");
    let work = WorkspaceId::from("work");
    let play = WorkspaceId::from("play");

    // Leave "work": park it and start an empty "play" layout.
    assert!(engine.save_workspace_snapshot(work.clone()));
    engine.clear_layout();
    engine.store_mut().insert("P", "music").unwrap();
    engine.init_layout(cid("P"));

    // Blocks of the parked workspace survive validation.
    let report = engine.validate_and_clean_state().unwrap();
    assert!(report.released_orphans.is_empty());
    assert!(engine.store().contains(&cid("A")));
    assert!(engine.store().contains(&cid("B")));

    // Back to "work".
    assert!(engine.save_workspace_snapshot(play.clone()));
    assert!(engine.restore_workspace_snapshot(&work));
    assert_eq!(engine.content_ids(), vec![cid("A"), cid("B")]);

    // Dropping the "play" snapshot makes its block an orphan.
    assert!(engine.clear_workspace_snapshot(&play));
    let report = engine.validate_and_clean_state().unwrap();
    assert_eq!(report.released_orphans, vec![cid("P")]);
    assert_eq!(engine.store().active_block(), Some(cid("A")));
}

#[test]
fn maximize_survives_workspace_round_trip() {
    let mut engine = engine_with_a();
    split_named(&mut engine, "A", SplitDirection::Vertical, "B");
    engine.maximize_block(&cid("A")).unwrap();
    let ws = WorkspaceId::from("focus");

    engine.save_workspace_snapshot(ws.clone());
    engine.clear_layout();
    assert!(!engine.is_maximized());
    engine.restore_workspace_snapshot(&ws);

    assert_eq!(engine.maximized_content_id(), Some(&cid("A")));
    assert_eq!(engine.content_ids(), vec![cid("A")]);
    engine.maximize_block(&cid("A")).unwrap();
    assert_eq!(engine.content_ids(), vec![cid("A"), cid("B")]);
}

#[test]
fn exited_blocks_are_swept_on_load() {
    let mut engine = engine_with_a();
    split_named(&mut engine, "A", SplitDirection::Horizontal, "B");
    split_named(&mut engine, "B", SplitDirection::Vertical, "C");
    engine
        .store_mut()
        .set_title(&cid("C"), "cargo watch [exited]")
        .unwrap();
    engine.store_mut().set_active_block(Some(cid("C")));

    let report = engine.validate_and_clean_state().unwrap();

    assert_eq!(report.closed_exited, vec![cid("C")]);
    assert_eq!(engine.content_ids(), vec![cid("A"), cid("B")]);
    let root = engine.tree().unwrap().as_branch().unwrap();
    assert!(root.children.iter().all(LayoutNode::is_leaf));
    assert_eq!(engine.store().active_block(), Some(cid("A")));
}

#[test]
fn content_at_supports_jump_to_pane() {
    let mut engine = engine_with_a();
    split_named(&mut engine, "A", SplitDirection::Horizontal, "B");
    split_named(&mut engine, "B", SplitDirection::Vertical, "C");

    let third = engine.content_at(2).unwrap();
    assert_eq!(third, cid("C"));
    engine.maximize_block(&third).unwrap();
    assert_eq!(engine.content_at(0), Some(cid("C")));
    assert_eq!(engine.content_at(1), None);
}
