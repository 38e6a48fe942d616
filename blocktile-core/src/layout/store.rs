//! Block store seam
//!
//! The layout only stores references to content blocks. Creating,
//! releasing and inspecting the blocks themselves is delegated to a
//! [`BlockStore`]. [`MemoryBlockStore`] is a plain in-memory implementation
//! for tests and for embedders that track blocks elsewhere.

use std::collections::BTreeMap;

use uuid::Uuid;

use super::error::StoreError;
use super::types::{BlockRecord, BlockSpec, ContentId};

/// Owner of the content blocks referenced by layout leaves.
pub trait BlockStore {
    /// Materializes a block for `spec`, or re-attaches `reuse_id` if given.
    ///
    /// # Errors
    ///
    /// Returns an error if the block cannot be created.
    fn create_block(
        &mut self,
        spec: &BlockSpec,
        reuse_id: Option<&ContentId>,
    ) -> Result<ContentId, StoreError>;

    /// Releases a block and whatever resources it holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the block is unknown or cannot be released.
    fn release_block(&mut self, id: &ContentId) -> Result<(), StoreError>;

    /// Returns the record for a block, if the store knows it.
    fn get_block(&self, id: &ContentId) -> Option<BlockRecord>;

    /// Returns the IDs of every block the store currently holds.
    fn block_ids(&self) -> Vec<ContentId>;

    /// Returns the currently active block.
    fn active_block(&self) -> Option<ContentId>;

    /// Sets (or clears) the active block.
    fn set_active_block(&mut self, id: Option<ContentId>);
}

/// In-memory [`BlockStore`].
///
/// # Example
///
/// ```
/// use blocktile_core::layout::{BlockSpec, BlockStore, MemoryBlockStore};
///
/// let mut store = MemoryBlockStore::new();
/// let id = store.create_block(&BlockSpec::new("terminal"), None).unwrap();
/// assert_eq!(store.get_block(&id).unwrap().title, "terminal");
/// store.release_block(&id).unwrap();
/// assert!(store.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBlockStore {
    blocks: BTreeMap<ContentId, BlockRecord>,
    active: Option<ContentId>,
}

impl MemoryBlockStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a block under a known ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BlockExists` if the ID is taken.
    pub fn insert(
        &mut self,
        id: impl Into<ContentId>,
        title: impl Into<String>,
    ) -> Result<(), StoreError> {
        let id = id.into();
        if self.blocks.contains_key(&id) {
            return Err(StoreError::BlockExists(id));
        }
        let record = BlockRecord {
            id: id.clone(),
            title: title.into(),
        };
        self.blocks.insert(id, record);
        Ok(())
    }

    /// Updates a block's title.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BlockNotFound` if the block is unknown.
    pub fn set_title(&mut self, id: &ContentId, title: impl Into<String>) -> Result<(), StoreError> {
        let record = self
            .blocks
            .get_mut(id)
            .ok_or_else(|| StoreError::BlockNotFound(id.clone()))?;
        record.title = title.into();
        Ok(())
    }

    /// Returns true if the store holds the block.
    #[must_use]
    pub fn contains(&self, id: &ContentId) -> bool {
        self.blocks.contains_key(id)
    }

    /// Returns the number of blocks held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if the store holds no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl BlockStore for MemoryBlockStore {
    fn create_block(
        &mut self,
        spec: &BlockSpec,
        reuse_id: Option<&ContentId>,
    ) -> Result<ContentId, StoreError> {
        let id = reuse_id
            .cloned()
            .unwrap_or_else(|| ContentId::new(Uuid::new_v4().to_string()));
        // Re-attaching a block that is still alive keeps its record.
        if !self.blocks.contains_key(&id) {
            let title = spec.title.clone().unwrap_or_else(|| spec.kind.clone());
            self.blocks.insert(
                id.clone(),
                BlockRecord {
                    id: id.clone(),
                    title,
                },
            );
        }
        Ok(id)
    }

    fn release_block(&mut self, id: &ContentId) -> Result<(), StoreError> {
        self.blocks
            .remove(id)
            .ok_or_else(|| StoreError::BlockNotFound(id.clone()))?;
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        Ok(())
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
