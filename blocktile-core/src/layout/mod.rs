//! Tiling layout module
//!
//! This module provides the layout tree for a tiling workspace: an n-ary tree
//! of branches and leaves where each leaf shows one content block and each
//! branch divides its area between its children in one direction.
//!
//! # Architecture
//!
//! - **Branch root**: A non-empty layout always has a branch at the root,
//!   even with a single block
//! - **Stable identity**: Node IDs survive every edit; a branch created by
//!   wrapping a leaf carries that leaf's content ID as its primary content ID
//! - **Clone and publish**: Every mutation edits a copy and publishes it whole
//! - **Workspace snapshots**: Whole engine state can be parked per workspace
//!
//! # Module Structure
//!
//! - `types` - Identifiers and small value types (`NodeId`, `ContentId`, `DropPosition`)
//! - `tree` - Tree structure (`LayoutNode`, `LeafNode`, `BranchNode`)
//! - `cleanup` - Structural normalization after removals
//! - `store` - Block store seam (`BlockStore`, `MemoryBlockStore`)
//! - `engine` - Layout operations (`LayoutEngine`)
//! - `snapshot` - Workspace snapshots and their persistence
//! - `error` - Error types (`LayoutError`, `StoreError`, `MoveResult`)
//!
//! # Example
//!
//! ```
//! use blocktile_core::layout::{
//!     BlockSpec, ContentId, DropPosition, LayoutEngine, MemoryBlockStore, SplitDirection,
//! };
//!
//! let mut engine = LayoutEngine::new(MemoryBlockStore::new());
//! let a = ContentId::from("A");
//! engine.init_layout(a.clone());
//!
//! let spec = BlockSpec::new("terminal");
//! let b = engine.split_block(&a, SplitDirection::Horizontal, &spec, None).unwrap();
//! let c = engine.split_block(&b, SplitDirection::Vertical, &spec, None).unwrap();
//! assert_eq!(engine.content_ids(), vec![a.clone(), b.clone(), c.clone()]);
//!
//! // Drag C to the left of A
//! engine.move_block(&c, &a, DropPosition::Left).unwrap();
//! assert_eq!(engine.content_ids().first(), Some(&c));
//! ```

mod cleanup;
mod engine;
mod error;
mod snapshot;
mod store;
mod tree;
mod types;

pub use cleanup::{cleanup_tree, migrate_legacy_root};
pub use engine::{CleanupReport, LayoutEngine};
pub use error::{LayoutError, MoveResult, StoreError};
pub use snapshot::{SnapshotError, WorkspaceSnapshot, WorkspaceSnapshots};
pub use store::{BlockStore, MemoryBlockStore};
pub use tree::{BranchNode, LayoutNode, LeafNode, RenderKey, SIZE_TOLERANCE, check_sizes};
pub use types::{
    BlockRecord, BlockSpec, ContentId, DropPosition, NodeId, SplitDirection, WorkspaceId,
};
