//! Tree normalization
//!
//! Operations that can leave the tree in a non-canonical shape (close,
//! move) finish with [`cleanup_tree`]. It drops empty branches, promotes
//! single-child branches to their child everywhere except at the root, and
//! repairs the sizes of any branch whose children changed.

use super::tree::{BranchNode, LayoutNode, check_sizes};
use super::types::SplitDirection;

/// Normalizes a tree, post-order.
///
/// - Leaves pass through unchanged.
/// - Branches that end up with no children disappear; if the root is one of
///   them the result is `None`.
/// - A non-root branch with exactly one child is replaced by that child.
///   The root keeps its branch variant even with a single child.
/// - A branch that lost children here, or whose sizes no longer fit its
///   children, gets equal sizes. Other branches keep their weights.
#[must_use]
pub fn cleanup_tree(root: LayoutNode, tolerance: f64) -> Option<LayoutNode> {
    cleanup_node(root, true, tolerance)
}

fn cleanup_node(node: LayoutNode, is_root: bool, tolerance: f64) -> Option<LayoutNode> {
    let mut branch = match node {
        LayoutNode::Branch(branch) => branch,
        leaf @ LayoutNode::Leaf(_) => return Some(leaf),
    };

    let original = std::mem::take(&mut branch.children);
    let original_count = original.len();
    let mut children: Vec<LayoutNode> = original
        .into_iter()
        .filter_map(|child| cleanup_node(child, false, tolerance))
        .collect();

    if children.is_empty() {
        return None;
    }
    if children.len() == 1 && !is_root {
        return children.pop();
    }

    branch.children = children;
    if branch.children.len() != original_count
        || check_sizes(&branch.sizes, branch.children.len(), tolerance).is_err()
    {
        branch.normalize_sizes_equal();
    }
    Some(LayoutNode::Branch(branch))
}

/// Wraps a bare leaf root in a single-child branch.
///
/// Older persisted layouts may have a leaf at the root; the engine only
/// produces branch roots. Any other tree is returned unchanged.
#[must_use]
pub fn migrate_legacy_root(root: LayoutNode, direction: SplitDirection) -> LayoutNode {
    match root {
        LayoutNode::Leaf(leaf) => {
            let primary = leaf.content_id.clone();
            LayoutNode::Branch(BranchNode::new(
                direction,
                vec![LayoutNode::Leaf(leaf)],
                Some(primary),
            ))
        }
        branch @ LayoutNode::Branch(_) => branch,
    }
}
