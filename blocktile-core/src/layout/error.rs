//! Error types for layout operations
//!
//! This module defines the error types and result enums returned by the
//! layout engine and its block store.

use super::types::{ContentId, NodeId};

/// Errors reported by a [`BlockStore`](super::store::BlockStore).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store has no block with this ID.
    #[error("block not found: {0}")]
    BlockNotFound(ContentId),

    /// A block with this ID already exists and cannot be created again.
    #[error("block already exists: {0}")]
    BlockExists(ContentId),

    /// The store refused the request for a backend-specific reason.
    #[error("block store failure: {0}")]
    Backend(String),
}

/// Errors that can occur during layout operations.
///
/// Every variant leaves the engine state exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    /// There is no layout to operate on.
    #[error("layout is empty")]
    EmptyLayout,

    /// No leaf in the layout references this block.
    #[error("block not in layout: {0}")]
    BlockNotFound(ContentId),

    /// A leaf in the layout already shows this block.
    #[error("block already in layout: {0}")]
    BlockInLayout(ContentId),

    /// No node in the layout has this ID.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// The node exists but is a leaf where a branch was required.
    #[error("node is not a branch: {0}")]
    NotABranch(NodeId),

    /// A sizes array does not fit its branch.
    #[error("invalid sizes for {node}: {reason}")]
    InvalidSizes {
        /// Branch the sizes were meant for.
        node: NodeId,
        /// What is wrong with them.
        reason: String,
    },

    /// The block store rejected the request; the layout was not touched.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a move request that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    /// The block was repositioned.
    Moved,
    /// Nothing changed (source equals target, or a `Center` drop).
    Unchanged,
}

impl MoveResult {
    /// Returns true if the layout changed.
    #[must_use]
    pub const fn is_moved(self) -> bool {
        matches!(self, Self::Moved)
    }
}
