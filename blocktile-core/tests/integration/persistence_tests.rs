//! Integration tests for settings and snapshot persistence

use blocktile_core::config::{ConfigManager, LayoutSettings};
use blocktile_core::layout::{
    BlockSpec, ContentId, LayoutEngine, LayoutNode, MemoryBlockStore, SplitDirection,
    WorkspaceId, WorkspaceSnapshots,
};
use blocktile_core::tracing::TracingLevel;
use tempfile::TempDir;

fn cid(id: &str) -> ContentId {
    ContentId::from(id)
}

#[test]
fn settings_drive_engine_behavior() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blocktile").join("layout.toml");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        r#"
default_direction = "vertical"
exited_title_marker = "(done)"

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let settings = ConfigManager::with_path(&path).load().unwrap();
    assert_eq!(settings.logging.level, TracingLevel::Debug);

    let mut store = MemoryBlockStore::new();
    store.insert("A", "A").unwrap();
    store.insert("B", "tail -f (done)").unwrap();
    let mut engine = LayoutEngine::with_settings(store, settings);
    engine.init_layout(cid("A"));
    assert_eq!(
        engine.tree().unwrap().as_branch().unwrap().direction,
        SplitDirection::Vertical
    );

    engine
        .split_block(
            &cid("A"),
            SplitDirection::Vertical,
            &BlockSpec::new("terminal"),
            Some(cid("B")),
        )
        .unwrap();
    let report = engine.validate_and_clean_state().unwrap();
    assert_eq!(report.closed_exited, vec![cid("B")]);
}

#[test]
fn settings_round_trip_through_manager() {
    let dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_path(dir.path().join("layout.toml"));
    let settings = LayoutSettings {
        size_tolerance: 1e-4,
        ..LayoutSettings::default()
    };

    manager.save(&settings).unwrap();

    assert_eq!(manager.load().unwrap(), settings);
}

#[test]
fn snapshots_persist_across_engines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state").join("workspaces.json");

    let mut store = MemoryBlockStore::new();
    store.insert("A", "A").unwrap();
    let mut engine = LayoutEngine::new(store.clone());
    engine.init_layout(cid("A"));
    let b = engine
        .split_block(
            &cid("A"),
            SplitDirection::Horizontal,
            &BlockSpec::new("terminal"),
            None,
        )
        .unwrap();
    let ws = WorkspaceId::from("dev");
    engine.save_workspace_snapshot(ws.clone());
    engine.snapshots().save_to_file(&path).unwrap();

    // A new process: fresh engine, snapshots loaded from disk.
    let mut restored = LayoutEngine::new(engine.store().clone());
    restored.replace_snapshots(WorkspaceSnapshots::load_from_file(&path).unwrap());
    assert!(restored.has_workspace_snapshot(&ws));
    assert!(restored.restore_workspace_snapshot(&ws));

    assert_eq!(restored.content_ids(), vec![cid("A"), b]);
    assert_eq!(
        restored.tree().unwrap().id(),
        engine.tree().unwrap().id()
    );
}

#[test]
fn missing_snapshot_file_loads_empty() {
    let dir = TempDir::new().unwrap();
    let loaded = WorkspaceSnapshots::load_from_file(&dir.path().join("none.json")).unwrap();
    assert!(loaded.is_empty());
}

#[test]
fn legacy_leaf_root_is_migrated_on_load() {
    let json = r#"{"type":"leaf","id":"6f1c0b8e-3d4a-4f7e-9c2b-5a8d7e6f1a2b","contentId":"A"}"#;
    let legacy = LayoutNode::from_json(json).unwrap();
    let leaf_id = legacy.id();

    let mut store = MemoryBlockStore::new();
    store.insert("A", "A").unwrap();
    let mut engine = LayoutEngine::new(store);
    engine.load_tree(legacy);

    let root = engine.tree().unwrap().as_branch().unwrap();
    assert_eq!(root.primary_content_id, Some(cid("A")));
    assert_eq!(root.children[0].id(), leaf_id);
    assert!(engine.validate_and_clean_state().unwrap().released_orphans.is_empty());
}
