//! Layout engine
//!
//! [`LayoutEngine`] owns the live layout tree, the maximize state and the
//! per-workspace snapshots, and drives a [`BlockStore`] for the blocks the
//! leaves reference.
//!
//! Every mutation works on a clone of the current tree and publishes the
//! result with a single assignment, so a failed operation never leaves a
//! half-edited tree behind. Calls into the block store happen before the
//! tree is touched: if the store refuses, the layout is unchanged.
//!
//! # Example
//!
//! ```
//! use blocktile_core::layout::{
//!     BlockSpec, ContentId, LayoutEngine, MemoryBlockStore, SplitDirection,
//! };
//!
//! let mut engine = LayoutEngine::new(MemoryBlockStore::new());
//! engine.init_layout(ContentId::from("A"));
//!
//! let b = engine
//!     .split_block(&ContentId::from("A"), SplitDirection::Horizontal, &BlockSpec::new("terminal"), None)
//!     .unwrap();
//! assert_eq!(engine.content_ids(), vec![ContentId::from("A"), b.clone()]);
//!
//! engine.close_block(&b).unwrap();
//! assert!(engine.tree().unwrap().is_branch());
//! ```

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use super::cleanup::{cleanup_tree, migrate_legacy_root};
use super::error::{LayoutError, MoveResult};
use super::snapshot::{WorkspaceSnapshot, WorkspaceSnapshots};
use super::store::BlockStore;
use super::tree::{BranchNode, LayoutNode, LeafNode};
use super::types::{BlockSpec, ContentId, DropPosition, NodeId, SplitDirection, WorkspaceId};
use crate::config::LayoutSettings;
use crate::tracing::span_names;

/// What [`LayoutEngine::validate_and_clean_state`] repaired.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// A bare leaf root was wrapped in a branch.
    pub migrated_legacy_root: bool,
    /// Blocks released because nothing referenced them.
    pub released_orphans: Vec<ContentId>,
    /// Blocks closed because their process had exited.
    pub closed_exited: Vec<ContentId>,
    /// The active block pointed outside the layout and was reassigned.
    pub active_reassigned: bool,
}

impl CleanupReport {
    /// Returns true if nothing needed repair.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.migrated_legacy_root
            && self.released_orphans.is_empty()
            && self.closed_exited.is_empty()
            && !self.active_reassigned
    }
}

/// Tiling layout engine.
#[derive(Debug)]
pub struct LayoutEngine<S: BlockStore> {
    /// Live layout (None = empty layout).
    tree: Option<LayoutNode>,
    /// Block currently shown maximized.
    maximized_content_id: Option<ContentId>,
    /// Full layout hidden while a block is maximized.
    saved_tree_before_maximize: Option<LayoutNode>,
    /// Parked layouts of other workspaces.
    snapshots: WorkspaceSnapshots,
    store: S,
    settings: LayoutSettings,
}

impl<S: BlockStore> LayoutEngine<S> {
    /// Creates an engine with an empty layout and default settings.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_settings(store, LayoutSettings::default())
    }

    /// Creates an engine with an empty layout.
    #[must_use]
    pub fn with_settings(store: S, settings: LayoutSettings) -> Self {
        Self {
            tree: None,
            maximized_content_id: None,
            saved_tree_before_maximize: None,
            snapshots: WorkspaceSnapshots::new(),
            store,
            settings,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the live layout tree.
    #[must_use]
    pub const fn tree(&self) -> Option<&LayoutNode> {
        self.tree.as_ref()
    }

    /// Returns the block store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the block store mutably.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Returns the engine settings.
    #[must_use]
    pub const fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    /// Returns the maximized block, if any.
    #[must_use]
    pub const fn maximized_content_id(&self) -> Option<&ContentId> {
        self.maximized_content_id.as_ref()
    }

    /// Returns true if a block is maximized.
    #[must_use]
    pub const fn is_maximized(&self) -> bool {
        self.maximized_content_id.is_some()
    }

    /// Returns the layout hidden behind the maximized block.
    #[must_use]
    pub const fn saved_tree_before_maximize(&self) -> Option<&LayoutNode> {
        self.saved_tree_before_maximize.as_ref()
    }

    /// Returns the stored workspace snapshots.
    #[must_use]
    pub const fn snapshots(&self) -> &WorkspaceSnapshots {
        &self.snapshots
    }

    /// Replaces the stored workspace snapshots, e.g. after loading them from disk.
    pub fn replace_snapshots(&mut self, snapshots: WorkspaceSnapshots) {
        self.snapshots = snapshots;
    }

    /// Returns the blocks of the live layout in visual order.
    #[must_use]
    pub fn content_ids(&self) -> Vec<ContentId> {
        self.tree
            .as_ref()
            .map(LayoutNode::content_ids)
            .unwrap_or_default()
    }

    /// Returns the block at a position in visual order ("jump to pane N").
    #[must_use]
    pub fn content_at(&self, index: usize) -> Option<ContentId> {
        self.content_ids().into_iter().nth(index)
    }

    // ========================================================================
    // Layout Lifecycle
    // ========================================================================

    /// Starts a fresh layout showing one block.
    ///
    /// The root is a branch with a single leaf child, not a bare leaf.
    pub fn init_layout(&mut self, content_id: ContentId) {
        debug!(content_id = %content_id, "Initializing layout");
        let root = BranchNode::wrapping(self.settings.default_direction, content_id);
        self.publish(Some(LayoutNode::Branch(root)));
    }

    /// Drops the live layout without releasing any block.
    ///
    /// Used when switching away from a workspace whose blocks stay alive.
    pub fn clear_layout(&mut self) {
        debug!("Clearing layout");
        self.publish(None);
    }

    /// Adopts a persisted layout, wrapping a legacy bare-leaf root.
    pub fn load_tree(&mut self, tree: LayoutNode) {
        let tree = migrate_legacy_root(tree, self.settings.default_direction);
        debug!(leaf_count = tree.leaf_count(), "Loaded layout");
        self.publish(Some(tree));
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Splits the leaf showing `content_id`, placing a new block after it.
    ///
    /// If the leaf's parent already runs in `direction`, the new leaf becomes
    /// its next sibling. Otherwise the leaf is wrapped in a new branch of
    /// `direction` that carries the leaf's content ID as its primary content
    /// ID. Existing node IDs never change.
    ///
    /// Pass `reuse_id` to re-attach a block that already exists in the store
    /// but is not shown by any leaf.
    ///
    /// # Returns
    ///
    /// Returns the new block's content ID.
    ///
    /// # Errors
    ///
    /// - `LayoutError::EmptyLayout` if there is no layout
    /// - `LayoutError::BlockNotFound` if no leaf shows `content_id`
    /// - `LayoutError::BlockInLayout` if a leaf already shows `reuse_id`
    /// - `LayoutError::Store` if the store cannot create the block
    pub fn split_block(
        &mut self,
        content_id: &ContentId,
        direction: SplitDirection,
        spec: &BlockSpec,
        reuse_id: Option<ContentId>,
    ) -> Result<ContentId, LayoutError> {
        let _span = crate::trace_operation_debug!(
            span_names::LAYOUT_SPLIT,
            content_id = %content_id,
            direction = %direction
        )
        .entered();

        let mut tree = self.working_tree()?.clone();
        let target_id = tree
            .find_node_by_content_id(content_id)
            .map(LayoutNode::id)
            .ok_or_else(|| LayoutError::BlockNotFound(content_id.clone()))?;
        if let Some(id) = reuse_id.as_ref().filter(|id| tree.contains_content(id)) {
            return Err(LayoutError::BlockInLayout(id.clone()));
        }

        let new_content_id = self.store.create_block(spec, reuse_id.as_ref())?;
        let new_leaf = LayoutNode::Leaf(LeafNode::new(new_content_id.clone()));

        match tree.find_parent_mut(target_id) {
            Some((parent, index)) if parent.direction == direction => {
                parent.insert_child(index + 1, new_leaf, 0.0);
                parent.normalize_sizes_equal();
            }
            Some((parent, index)) => {
                let original = parent.children.remove(index);
                let primary = original.representative_content_id().cloned();
                let wrapper = BranchNode::new(direction, vec![original, new_leaf], primary);
                parent.children.insert(index, LayoutNode::Branch(wrapper));
            }
            None => {
                // Only a legacy bare-leaf root has no parent.
                let primary = tree.representative_content_id().cloned();
                tree = LayoutNode::Branch(BranchNode::new(direction, vec![tree, new_leaf], primary));
            }
        }

        debug!(new_content_id = %new_content_id, "Split block");
        self.publish(Some(tree));
        Ok(new_content_id)
    }

    /// Closes the leaf showing `content_id` and releases its block.
    ///
    /// Remaining siblings keep their relative sizes. Closing the last block
    /// empties the layout. Afterwards the first remaining block becomes the
    /// active block.
    ///
    /// # Errors
    ///
    /// - `LayoutError::EmptyLayout` if there is no layout
    /// - `LayoutError::BlockNotFound` if no leaf shows `content_id`
    /// - `LayoutError::Store` if the store cannot release the block; the
    ///   layout is left unchanged
    pub fn close_block(&mut self, content_id: &ContentId) -> Result<(), LayoutError> {
        let _span =
            crate::trace_operation_debug!(span_names::LAYOUT_CLOSE, content_id = %content_id)
                .entered();

        let mut tree = self.working_tree()?.clone();
        let target_id = tree
            .find_node_by_content_id(content_id)
            .map(LayoutNode::id)
            .ok_or_else(|| LayoutError::BlockNotFound(content_id.clone()))?;

        self.store.release_block(content_id)?;

        let is_last = tree.id() == target_id
            || tree
                .as_branch()
                .is_some_and(|root| root.children.len() == 1 && root.children[0].id() == target_id);

        let next = if is_last {
            None
        } else {
            if let Some((parent, index)) = tree.find_parent_mut(target_id) {
                parent.remove_child(index);
                parent.normalize_sizes_proportional();
            }
            cleanup_tree(tree, self.settings.effective_tolerance())
        };

        let active = next
            .as_ref()
            .and_then(LayoutNode::first_leaf)
            .map(|leaf| leaf.content_id.clone());
        debug!(remaining = next.as_ref().map_or(0, LayoutNode::leaf_count), "Closed block");
        self.publish(next);
        self.store.set_active_block(active);
        Ok(())
    }

    /// Moves the leaf showing `content_id` next to the leaf showing `target`.
    ///
    /// When both share a parent that already runs in the drop direction the
    /// leaf is simply re-ordered. Otherwise it is detached and paired with
    /// the target in a new branch that carries the target's identity as its
    /// primary content ID. Node IDs of both leaves are preserved.
    ///
    /// # Returns
    ///
    /// `MoveResult::Unchanged` for a `Center` drop or a drop onto itself.
    ///
    /// # Errors
    ///
    /// - `LayoutError::EmptyLayout` if there is no layout
    /// - `LayoutError::BlockNotFound` if either block is not in the layout
    pub fn move_block(
        &mut self,
        content_id: &ContentId,
        target: &ContentId,
        position: DropPosition,
    ) -> Result<MoveResult, LayoutError> {
        let _span = crate::trace_operation_debug!(
            span_names::LAYOUT_MOVE,
            content_id = %content_id,
            target_id = %target,
            position = %position
        )
        .entered();

        let Some(direction) = position.direction() else {
            debug!("Center drop is not supported, ignoring");
            return Ok(MoveResult::Unchanged);
        };
        if content_id == target {
            return Ok(MoveResult::Unchanged);
        }

        let mut tree = self.working_tree()?.clone();
        let source_id = tree
            .find_node_by_content_id(content_id)
            .map(LayoutNode::id)
            .ok_or_else(|| LayoutError::BlockNotFound(content_id.clone()))?;
        let target_id = tree
            .find_node_by_content_id(target)
            .map(LayoutNode::id)
            .ok_or_else(|| LayoutError::BlockNotFound(target.clone()))?;
        let before = position.inserts_before();

        let Some((source_parent, source_parent_direction)) = tree
            .find_parent(source_id)
            .map(|(parent, _)| (parent.id, parent.direction))
        else {
            return Ok(MoveResult::Unchanged);
        };
        let target_parent = tree.find_parent(target_id).map(|(parent, _)| parent.id);

        if target_parent == Some(source_parent) && source_parent_direction == direction {
            if let Some(parent) = tree
                .find_node_by_id_mut(source_parent)
                .and_then(LayoutNode::as_branch_mut)
            {
                reorder_siblings(parent, source_id, target_id, before);
            }
            debug!("Reordered siblings");
            self.publish(Some(tree));
            return Ok(MoveResult::Moved);
        }

        let Some(source) = detach(&mut tree, source_id) else {
            return Ok(MoveResult::Unchanged);
        };

        match tree.find_parent_mut(target_id) {
            Some((parent, index)) => {
                let target_node = parent.children.remove(index);
                let pair = pair_branch(direction, source, target_node, before);
                parent.children.insert(index, pair);
            }
            None => {
                tree = pair_branch(direction, source, tree, before);
            }
        }

        let cleaned = cleanup_tree(tree, self.settings.effective_tolerance());
        debug!("Moved block into new branch");
        self.publish(cleaned);
        Ok(MoveResult::Moved)
    }

    /// Overwrites the sizes of a branch in the live layout.
    ///
    /// # Errors
    ///
    /// - `LayoutError::EmptyLayout` if there is no layout
    /// - `LayoutError::NodeNotFound` if no node has `branch_id`
    /// - `LayoutError::NotABranch` if the node is a leaf
    /// - `LayoutError::InvalidSizes` if `sizes` does not have one positive
    ///   weight per child or does not sum to one
    pub fn resize_nodes(&mut self, branch_id: NodeId, sizes: Vec<f64>) -> Result<(), LayoutError> {
        let _span =
            crate::trace_operation_debug!(span_names::LAYOUT_RESIZE, node_id = %branch_id)
                .entered();

        let mut tree = self.tree.clone().ok_or(LayoutError::EmptyLayout)?;
        let node = tree
            .find_node_by_id_mut(branch_id)
            .ok_or(LayoutError::NodeNotFound(branch_id))?;
        let branch = node
            .as_branch_mut()
            .ok_or(LayoutError::NotABranch(branch_id))?;

        branch.sizes = sizes;
        if let Err(err) = branch.check_sizes(self.settings.effective_tolerance()) {
            warn!(error = %err, "Rejected resize");
            return Err(err);
        }

        self.tree = Some(tree);
        Ok(())
    }

    /// Shows one block alone, or restores the layout if it is already maximized.
    ///
    /// The full layout is kept aside and brought back by [`Self::restore_layout`].
    ///
    /// # Errors
    ///
    /// - `LayoutError::EmptyLayout` if there is no layout
    /// - `LayoutError::BlockNotFound` if the block is not in the live layout
    pub fn maximize_block(&mut self, content_id: &ContentId) -> Result<(), LayoutError> {
        let _span =
            crate::trace_operation_debug!(span_names::LAYOUT_MAXIMIZE, content_id = %content_id)
                .entered();

        if self.maximized_content_id.as_ref() == Some(content_id) {
            self.restore_layout();
            return Ok(());
        }

        let tree = self.tree.as_ref().ok_or(LayoutError::EmptyLayout)?;
        if !tree.contains_content(content_id) {
            return Err(LayoutError::BlockNotFound(content_id.clone()));
        }

        self.saved_tree_before_maximize = Some(tree.clone());
        self.maximized_content_id = Some(content_id.clone());
        self.tree = Some(LayoutNode::Branch(BranchNode::wrapping(
            self.settings.default_direction,
            content_id.clone(),
        )));
        debug!("Maximized block");
        Ok(())
    }

    /// Brings back the layout hidden by [`Self::maximize_block`].
    ///
    /// Returns false if nothing was maximized.
    pub fn restore_layout(&mut self) -> bool {
        let Some(saved) = self.saved_tree_before_maximize.take() else {
            return false;
        };
        self.tree = Some(saved);
        self.maximized_content_id = None;
        debug!("Restored layout");
        true
    }

    /// Repairs stale state, typically right after a workspace is loaded.
    ///
    /// In order:
    /// 1. A bare leaf root is wrapped in a branch.
    /// 2. Blocks in the store that no layout references are released.
    ///    Blocks hidden behind a maximized block or parked in a workspace
    ///    snapshot count as referenced.
    /// 3. Blocks whose title carries the exited marker are closed, including
    ///    blocks hidden behind a maximized block. A maximized block that
    ///    survives stays maximized.
    /// 4. If the active block is not in the layout, the first leaf (or
    ///    nothing) becomes active.
    ///
    /// # Errors
    ///
    /// Returns `LayoutError::Store` if releasing a block fails; repairs made
    /// before the failure are kept.
    pub fn validate_and_clean_state(&mut self) -> Result<CleanupReport, LayoutError> {
        let _span = crate::trace_operation!(span_names::LAYOUT_VALIDATE).entered();
        let mut report = CleanupReport::default();

        if let Some(leaf) = self.tree.take_if(|tree| tree.is_leaf()) {
            self.tree = Some(migrate_legacy_root(leaf, self.settings.default_direction));
            report.migrated_legacy_root = true;
        }

        let referenced = self.referenced_content_ids();
        for id in self.store.block_ids() {
            if !referenced.contains(&id) {
                self.store.release_block(&id)?;
                report.released_orphans.push(id);
            }
        }

        let marker = &self.settings.exited_title_marker;
        let exited: Vec<ContentId> = self
            .working_tree()
            .map(LayoutNode::content_ids)
            .unwrap_or_default()
            .into_iter()
            .filter(|id| {
                self.store
                    .get_block(id)
                    .is_some_and(|record| record.is_exited(marker))
            })
            .collect();
        let maximized = self.maximized_content_id.clone();
        for id in exited {
            self.close_block(&id)?;
            report.closed_exited.push(id);
        }
        // Closing publishes the full layout; keep a surviving block maximized.
        if let Some(id) =
            maximized.filter(|id| !self.is_maximized() && !report.closed_exited.contains(id))
        {
            self.maximize_block(&id)?;
        }

        let current = self.store.active_block();
        let in_layout = current
            .as_ref()
            .is_some_and(|id| self.tree.as_ref().is_some_and(|t| t.contains_content(id)));
        if !in_layout {
            let replacement = self
                .tree
                .as_ref()
                .and_then(LayoutNode::first_leaf)
                .map(|leaf| leaf.content_id.clone());
            if replacement != current {
                self.store.set_active_block(replacement);
                report.active_reassigned = true;
            }
        }

        if report.is_clean() {
            debug!("Layout state is consistent");
        } else {
            info!(
                migrated = report.migrated_legacy_root,
                orphans = report.released_orphans.len(),
                exited = report.closed_exited.len(),
                active_reassigned = report.active_reassigned,
                "Repaired layout state"
            );
        }
        Ok(report)
    }

    // ========================================================================
    // Workspace Snapshots
    // ========================================================================

    /// Stores a copy of the current state under `workspace_id`.
    ///
    /// Returns false (and stores nothing) if the layout is empty.
    pub fn save_workspace_snapshot(&mut self, workspace_id: WorkspaceId) -> bool {
        let _span =
            crate::trace_operation!(span_names::SNAPSHOT_SAVE, workspace_id = %workspace_id)
                .entered();
        let Some(tree) = &self.tree else {
            debug!("Layout is empty, nothing to save");
            return false;
        };
        let snapshot = WorkspaceSnapshot::new(
            tree.clone(),
            self.maximized_content_id.clone(),
            self.saved_tree_before_maximize.clone(),
        );
        self.snapshots.insert(workspace_id, snapshot);
        info!(leaf_count = tree.leaf_count(), "Saved workspace snapshot");
        true
    }

    /// Replaces the current state with a copy of the stored snapshot.
    ///
    /// Snapshots read from disk may hold a legacy bare-leaf root; it is
    /// wrapped in a branch like [`Self::load_tree`] does.
    ///
    /// Returns false (and changes nothing) if no snapshot exists.
    pub fn restore_workspace_snapshot(&mut self, workspace_id: &WorkspaceId) -> bool {
        let _span =
            crate::trace_operation!(span_names::SNAPSHOT_RESTORE, workspace_id = %workspace_id)
                .entered();
        let Some(snapshot) = self.snapshots.get(workspace_id) else {
            debug!("No snapshot for workspace");
            return false;
        };
        let direction = self.settings.default_direction;
        self.tree = Some(migrate_legacy_root(snapshot.tree.clone(), direction));
        self.maximized_content_id = snapshot.maximized_content_id.clone();
        self.saved_tree_before_maximize = snapshot
            .saved_tree_before_maximize
            .clone()
            .map(|tree| migrate_legacy_root(tree, direction));
        info!(saved_at = %snapshot.saved_at, "Restored workspace snapshot");
        true
    }

    /// Returns true if a snapshot is stored for the workspace.
    #[must_use]
    pub fn has_workspace_snapshot(&self, workspace_id: &WorkspaceId) -> bool {
        self.snapshots.contains(workspace_id)
    }

    /// Deletes the workspace's snapshot. Returns true if one existed.
    pub fn clear_workspace_snapshot(&mut self, workspace_id: &WorkspaceId) -> bool {
        let removed = self.snapshots.remove(workspace_id).is_some();
        if removed {
            debug!(workspace_id = %workspace_id, "Cleared workspace snapshot");
        }
        removed
    }

    // ========================================================================
    // Private Helper Methods
    // ========================================================================

    /// Tree that structural edits apply to: the full layout, even while a
    /// block is maximized.
    fn working_tree(&self) -> Result<&LayoutNode, LayoutError> {
        self.saved_tree_before_maximize
            .as_ref()
            .or(self.tree.as_ref())
            .ok_or(LayoutError::EmptyLayout)
    }

    /// Publishes a new full layout. Any maximize state is dropped, since the
    /// new tree already is the full layout.
    fn publish(&mut self, tree: Option<LayoutNode>) {
        self.tree = tree;
        self.maximized_content_id = None;
        self.saved_tree_before_maximize = None;
    }

    fn referenced_content_ids(&self) -> BTreeSet<ContentId> {
        let mut ids = self.snapshots.referenced_content_ids();
        for tree in [&self.tree, &self.saved_tree_before_maximize]
            .into_iter()
            .flatten()
        {
            ids.extend(tree.content_ids());
        }
        ids
    }
}

/// Moves `source_id` next to `target_id` within the same branch.
fn reorder_siblings(parent: &mut BranchNode, source_id: NodeId, target_id: NodeId, before: bool) {
    let Some(source_index) = parent.child_index(source_id) else {
        return;
    };
    let source = parent.remove_child(source_index);
    let target_index = parent.child_index(target_id).unwrap_or(parent.children.len());
    let insert_at = if before { target_index } else { target_index + 1 };
    parent.insert_child(insert_at.min(parent.children.len()), source, 0.0);
    parent.normalize_sizes_equal();
}

/// Removes a node from its parent, rescaling the parent's remaining sizes.
fn detach(tree: &mut LayoutNode, node_id: NodeId) -> Option<LayoutNode> {
    let (parent, index) = tree.find_parent_mut(node_id)?;
    let node = parent.remove_child(index);
    if !parent.children.is_empty() {
        parent.normalize_sizes_proportional();
    }
    Some(node)
}

/// Builds the branch holding a moved node and its drop target.
fn pair_branch(
    direction: SplitDirection,
    source: LayoutNode,
    target: LayoutNode,
    before: bool,
) -> LayoutNode {
    let primary = target.representative_content_id().cloned();
    let children = if before {
        vec![source, target]
    } else {
        vec![target, source]
    };
    LayoutNode::Branch(BranchNode::new(direction, children, primary))
}
