//! Integration tests for custom block stores
//!
//! A store backed by real resources can refuse to create or release a
//! block. The engine must leave the layout untouched when that happens.

use std::collections::BTreeMap;

use blocktile_core::layout::{
    BlockRecord, BlockSpec, BlockStore, ContentId, LayoutEngine, LayoutError, SplitDirection,
    StoreError,
};

/// Store with a fixed capacity that refuses to release pinned blocks.
#[derive(Debug, Default)]
struct LimitedStore {
    blocks: BTreeMap<ContentId, BlockRecord>,
    active: Option<ContentId>,
    capacity: usize,
    pinned: Vec<ContentId>,
    next: usize,
}

impl LimitedStore {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }
}

impl BlockStore for LimitedStore {
    fn create_block(
        &mut self,
        spec: &BlockSpec,
        reuse_id: Option<&ContentId>,
    ) -> Result<ContentId, StoreError> {
        if self.blocks.len() >= self.capacity {
            return Err(StoreError::Backend("no free slots".to_owned()));
        }
        let id = reuse_id.cloned().unwrap_or_else(|| {
            self.next += 1;
            ContentId::new(format!("{}-{}", spec.kind, self.next))
        });
        self.blocks.insert(
            id.clone(),
            BlockRecord {
                id: id.clone(),
                title: spec.kind.clone(),
            },
        );
        Ok(id)
    }

    fn release_block(&mut self, id: &ContentId) -> Result<(), StoreError> {
        if self.pinned.contains(id) {
            return Err(StoreError::Backend(format!("{id} is pinned")));
        }
        self.blocks
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::BlockNotFound(id.clone()))
    }

    fn get_block(&self, id: &ContentId) -> Option<BlockRecord> {
        self.blocks.get(id).cloned()
    }

    fn block_ids(&self) -> Vec<ContentId> {
        self.blocks.keys().cloned().collect()
    }

    fn active_block(&self) -> Option<ContentId> {
        self.active.clone()
    }

    fn set_active_block(&mut self, id: Option<ContentId>) {
        self.active = id;
    }
}

fn engine(capacity: usize) -> (LayoutEngine<LimitedStore>, ContentId) {
    let mut store = LimitedStore::with_capacity(capacity);
    let first = store.create_block(&BlockSpec::new("shell"), None).unwrap();
    let mut engine = LayoutEngine::new(store);
    engine.init_layout(first.clone());
    (engine, first)
}

#[test]
fn failed_create_leaves_layout_untouched() {
    let (mut engine, first) = engine(1);
    let before = engine.tree().cloned();

    let result = engine.split_block(
        &first,
        SplitDirection::Horizontal,
        &BlockSpec::new("terminal"),
        None,
    );

    assert_eq!(
        result,
        Err(LayoutError::Store(StoreError::Backend(
            "no free slots".to_owned()
        )))
    );
    assert_eq!(engine.tree().cloned(), before);
}

#[test]
fn failed_release_leaves_layout_untouched() {
    let (mut engine, first) = engine(4);
    let second = engine
        .split_block(
            &first,
            SplitDirection::Horizontal,
            &BlockSpec::new("terminal"),
            None,
        )
        .unwrap();
    engine.store_mut().pinned.push(second.clone());
    let before = engine.tree().cloned();

    let err = engine.close_block(&second).unwrap_err();

    assert!(matches!(err, LayoutError::Store(StoreError::Backend(_))));
    assert_eq!(engine.tree().cloned(), before);
    assert!(engine.store().get_block(&second).is_some());
}

#[test]
fn generated_ids_flow_into_layout() {
    let (mut engine, first) = engine(4);
    let second = engine
        .split_block(
            &first,
            SplitDirection::Vertical,
            &BlockSpec::new("editor"),
            None,
        )
        .unwrap();

    assert_eq!(second.as_str(), "editor-2");
    assert_eq!(engine.content_ids(), vec![first, second]);
}

#[test]
fn validation_stops_at_store_failure() {
    let (mut engine, _first) = engine(4);
    let stray = engine
        .store_mut()
        .create_block(&BlockSpec::new("stray"), None)
        .unwrap();
    engine.store_mut().pinned.push(stray);

    let err = engine.validate_and_clean_state().unwrap_err();

    assert!(matches!(err, LayoutError::Store(_)));
}
