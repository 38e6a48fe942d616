//! Layout tree structure
//!
//! Each node is either a leaf (referencing one externally owned content
//! block) or a branch (an ordered list of children plus their relative
//! size weights, laid out in one direction).
//!
//! # Tree Structure
//!
//! ```text
//! Branch(horizontal, primary = A)
//! ├── Leaf(A)
//! └── Branch(vertical, primary = B)
//!     ├── Leaf(B)
//!     └── Leaf(C)
//! ```
//!
//! All lookups are depth-first and pre-order, so the order of
//! [`LayoutNode::content_ids`] is the visual reading order.
//!
//! The tree serializes to plain JSON, which is also its persisted form:
//!
//! ```json
//! {"type":"branch","id":"…","direction":"horizontal","primaryContentId":"A",
//!  "children":[{"type":"leaf","id":"…","contentId":"A"}],"sizes":[1.0]}
//! ```

use serde::{Deserialize, Serialize};

use super::error::LayoutError;
use super::types::{ContentId, NodeId, SplitDirection};

/// Default tolerance when checking that sibling sizes sum to one.
pub const SIZE_TOLERANCE: f64 = 1e-6;

/// A node in the layout tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayoutNode {
    /// A leaf referencing one content block.
    Leaf(LeafNode),
    /// A split container.
    Branch(BranchNode),
}

/// A leaf node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafNode {
    /// Stable node identifier.
    pub id: NodeId,
    /// Block displayed by this leaf.
    pub content_id: ContentId,
}

/// A branch node dividing its area between ordered children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchNode {
    /// Stable node identifier.
    pub id: NodeId,
    /// Layout direction of the children.
    pub direction: SplitDirection,
    /// Children in visual order.
    pub children: Vec<LayoutNode>,
    /// Relative size of each child; same length as `children`, sums to 1.
    pub sizes: Vec<f64>,
    /// Content ID of the leaf this branch took the place of.
    ///
    /// A renderer keys the branch on this so that the resource behind the
    /// original leaf survives being wrapped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_content_id: Option<ContentId>,
}

/// Key a rendering layer should use for a node among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RenderKey {
    /// Keyed on a content block's identity.
    Content(ContentId),
    /// Keyed on the node itself.
    Node(NodeId),
}

impl LeafNode {
    /// Creates a leaf with a fresh node ID.
    #[must_use]
    pub fn new(content_id: ContentId) -> Self {
        Self {
            id: NodeId::new(),
            content_id,
        }
    }
}

impl BranchNode {
    /// Creates a branch with equal sizes for all children.
    #[must_use]
    pub fn new(
        direction: SplitDirection,
        children: Vec<LayoutNode>,
        primary_content_id: Option<ContentId>,
    ) -> Self {
        let mut branch = Self {
            id: NodeId::new(),
            direction,
            children,
            sizes: Vec::new(),
            primary_content_id,
        };
        branch.normalize_sizes_equal();
        branch
    }

    /// Creates the single-leaf branch used as a fresh layout root.
    ///
    /// The root stays a branch even with one child, so going from one block
    /// to two never changes the root's variant.
    #[must_use]
    pub fn wrapping(direction: SplitDirection, content_id: ContentId) -> Self {
        Self::new(
            direction,
            vec![LayoutNode::Leaf(LeafNode::new(content_id.clone()))],
            Some(content_id),
        )
    }

    /// Resets every size to `1 / children.len()`.
    pub fn normalize_sizes_equal(&mut self) {
        let count = self.children.len();
        self.sizes = vec![1.0 / count as f64; count];
    }

    /// Rescales the sizes so they sum to one, keeping their proportions.
    ///
    /// Falls back to equal sizes if the weights cannot be rescaled.
    pub fn normalize_sizes_proportional(&mut self) {
        let sum: f64 = self.sizes.iter().sum();
        if self.sizes.len() != self.children.len() || !sum.is_finite() || sum <= 0.0 {
            self.normalize_sizes_equal();
            return;
        }
        for size in &mut self.sizes {
            *size /= sum;
        }
    }

    /// Removes the child at `index` along with its size slot.
    ///
    /// Sizes are left un-normalized.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove_child(&mut self, index: usize) -> LayoutNode {
        if index < self.sizes.len() {
            self.sizes.remove(index);
        }
        self.children.remove(index)
    }

    /// Inserts a child at `index` with the given weight.
    ///
    /// Sizes are left un-normalized.
    ///
    /// # Panics
    ///
    /// Panics if `index > children.len()`.
    pub fn insert_child(&mut self, index: usize, child: LayoutNode, weight: f64) {
        self.children.insert(index, child);
        let slot = index.min(self.sizes.len());
        self.sizes.insert(slot, weight);
    }

    /// Returns the index of the direct child with the given ID.
    #[must_use]
    pub fn child_index(&self, node_id: NodeId) -> Option<usize> {
        self.children.iter().position(|child| child.id() == node_id)
    }

    /// Checks this branch's own sizes against its children.
    ///
    /// # Errors
    ///
    /// Returns `LayoutError::InvalidSizes` if the sizes do not fit.
    pub fn check_sizes(&self, tolerance: f64) -> Result<(), LayoutError> {
        check_sizes(&self.sizes, self.children.len(), tolerance).map_err(|reason| {
            LayoutError::InvalidSizes {
                node: self.id,
                reason,
            }
        })
    }
}

/// Checks that `sizes` has one positive, finite weight per child and sums to
/// one within `tolerance`.
///
/// # Errors
///
/// Returns a description of the first problem found.
pub fn check_sizes(sizes: &[f64], child_count: usize, tolerance: f64) -> Result<(), String> {
    if sizes.len() != child_count {
        return Err(format!(
            "expected {child_count} sizes, got {}",
            sizes.len()
        ));
    }
    if let Some(bad) = sizes.iter().find(|s| !s.is_finite() || **s <= 0.0) {
        return Err(format!("size {bad} is not a positive fraction"));
    }
    if child_count == 0 {
        return Ok(());
    }
    let sum: f64 = sizes.iter().sum();
    if (sum - 1.0).abs() > tolerance {
        return Err(format!("sizes sum to {sum}, expected 1"));
    }
    Ok(())
}

impl LayoutNode {
    /// Creates a leaf node with a fresh ID.
    #[must_use]
    pub fn leaf(content_id: impl Into<ContentId>) -> Self {
        Self::Leaf(LeafNode::new(content_id.into()))
    }

    /// Creates a branch node with equal sizes and no primary content ID.
    #[must_use]
    pub fn branch(direction: SplitDirection, children: Vec<Self>) -> Self {
        Self::Branch(BranchNode::new(direction, children, None))
    }

    /// Returns the node's ID.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        match self {
            Self::Leaf(leaf) => leaf.id,
            Self::Branch(branch) => branch.id,
        }
    }

    /// Returns true if this is a leaf node.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// Returns true if this is a branch node.
    #[must_use]
    pub const fn is_branch(&self) -> bool {
        matches!(self, Self::Branch(_))
    }

    /// Returns the leaf if this is a leaf node.
    #[must_use]
    pub const fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Branch(_) => None,
        }
    }

    /// Returns the branch if this is a branch node.
    #[must_use]
    pub const fn as_branch(&self) -> Option<&BranchNode> {
        match self {
            Self::Leaf(_) => None,
            Self::Branch(branch) => Some(branch),
        }
    }

    /// Returns a mutable reference to the branch if this is a branch node.
    #[must_use]
    pub fn as_branch_mut(&mut self) -> Option<&mut BranchNode> {
        match self {
            Self::Leaf(_) => None,
            Self::Branch(branch) => Some(branch),
        }
    }

    /// Content ID this node stands for: its own for a leaf, the primary
    /// content ID for a branch.
    #[must_use]
    pub fn representative_content_id(&self) -> Option<&ContentId> {
        match self {
            Self::Leaf(leaf) => Some(&leaf.content_id),
            Self::Branch(branch) => branch.primary_content_id.as_ref(),
        }
    }

    /// Returns the key a renderer should use for this node among its siblings.
    #[must_use]
    pub fn render_key(&self) -> RenderKey {
        match self.representative_content_id() {
            Some(content_id) => RenderKey::Content(content_id.clone()),
            None => RenderKey::Node(self.id()),
        }
    }

    // ========================================================================
    // Tree Traversal Methods
    // ========================================================================

    /// Finds a node (leaf or branch) by ID.
    #[must_use]
    pub fn find_node_by_id(&self, node_id: NodeId) -> Option<&Self> {
        if self.id() == node_id {
            return Some(self);
        }
        match self {
            Self::Leaf(_) => None,
            Self::Branch(branch) => branch
                .children
                .iter()
                .find_map(|child| child.find_node_by_id(node_id)),
        }
    }

    /// Finds a node by ID and returns a mutable reference.
    #[must_use]
    pub fn find_node_by_id_mut(&mut self, node_id: NodeId) -> Option<&mut Self> {
        if self.id() == node_id {
            return Some(self);
        }
        match self {
            Self::Leaf(_) => None,
            Self::Branch(branch) => branch
                .children
                .iter_mut()
                .find_map(|child| child.find_node_by_id_mut(node_id)),
        }
    }

    /// Finds the leaf node displaying the given block.
    #[must_use]
    pub fn find_node_by_content_id(&self, content_id: &ContentId) -> Option<&Self> {
        match self {
            Self::Leaf(leaf) => (leaf.content_id == *content_id).then_some(self),
            Self::Branch(branch) => branch
                .children
                .iter()
                .find_map(|child| child.find_node_by_content_id(content_id)),
        }
    }

    /// Returns true if a leaf in this tree displays the given block.
    #[must_use]
    pub fn contains_content(&self, content_id: &ContentId) -> bool {
        self.find_node_by_content_id(content_id).is_some()
    }

    /// Finds the parent branch of a node and the node's index in it.
    ///
    /// Returns `None` for the node this is called on, and for unknown IDs.
    #[must_use]
    pub fn find_parent(&self, node_id: NodeId) -> Option<(&BranchNode, usize)> {
        let Self::Branch(branch) = self else {
            return None;
        };
        if let Some(index) = branch.child_index(node_id) {
            return Some((branch, index));
        }
        branch
            .children
            .iter()
            .find_map(|child| child.find_parent(node_id))
    }

    /// Finds the parent branch of a node and returns a mutable reference.
    #[must_use]
    pub fn find_parent_mut(&mut self, node_id: NodeId) -> Option<(&mut BranchNode, usize)> {
        let Self::Branch(branch) = self else {
            return None;
        };
        if let Some(index) = branch.child_index(node_id) {
            return Some((branch, index));
        }
        branch
            .children
            .iter_mut()
            .find_map(|child| child.find_parent_mut(node_id))
    }

    /// Returns the first leaf reached by always descending into the first child.
    ///
    /// Returns `None` only for a branch without children.
    #[must_use]
    pub fn first_leaf(&self) -> Option<&LeafNode> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Branch(branch) => branch.children.first().and_then(Self::first_leaf),
        }
    }

    /// Returns every leaf's content ID in visual order.
    #[must_use]
    pub fn content_ids(&self) -> Vec<ContentId> {
        let mut ids = Vec::new();
        self.collect_content_ids(&mut ids);
        ids
    }

    fn collect_content_ids(&self, ids: &mut Vec<ContentId>) {
        match self {
            Self::Leaf(leaf) => ids.push(leaf.content_id.clone()),
            Self::Branch(branch) => {
                for child in &branch.children {
                    child.collect_content_ids(ids);
                }
            }
        }
    }

    /// Returns every branch in the tree, pre-order.
    #[must_use]
    pub fn branches(&self) -> Vec<&BranchNode> {
        let mut out = Vec::new();
        self.collect_branches(&mut out);
        out
    }

    fn collect_branches<'a>(&'a self, out: &mut Vec<&'a BranchNode>) {
        if let Self::Branch(branch) = self {
            out.push(branch);
            for child in &branch.children {
                child.collect_branches(out);
            }
        }
    }

    /// Returns the number of leaves in the tree.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Branch(branch) => branch.children.iter().map(Self::leaf_count).sum(),
        }
    }

    /// Returns the nesting depth. A leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf(_) => 0,
            Self::Branch(branch) => {
                1 + branch
                    .children
                    .iter()
                    .map(Self::depth)
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    /// Serializes the tree to its JSON persistence form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a tree from its JSON persistence form.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a layout tree.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
