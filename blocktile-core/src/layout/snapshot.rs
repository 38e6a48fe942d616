//! Per-workspace layout snapshots
//!
//! When the user switches workspaces the whole engine state is parked in a
//! [`WorkspaceSnapshot`] keyed by [`WorkspaceId`], and brought back when
//! they return. Snapshots are cloned on the way in and on the way out, so
//! the live tree never aliases a stored one.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::tree::LayoutNode;
use super::types::{ContentId, WorkspaceId};

/// Errors that can occur while persisting snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Reading or writing the snapshot file failed.
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot file is not valid JSON for this format.
    #[error("snapshot format error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Saved engine state for one workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshot {
    /// Layout tree at save time.
    pub tree: LayoutNode,
    /// Block that was maximized at save time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximized_content_id: Option<ContentId>,
    /// Full layout hidden behind the maximized block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_tree_before_maximize: Option<LayoutNode>,
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
}

impl WorkspaceSnapshot {
    /// Creates a snapshot stamped with the current time.
    #[must_use]
    pub fn new(
        tree: LayoutNode,
        maximized_content_id: Option<ContentId>,
        saved_tree_before_maximize: Option<LayoutNode>,
    ) -> Self {
        Self {
            tree,
            maximized_content_id,
            saved_tree_before_maximize,
            saved_at: Utc::now(),
        }
    }

    /// Returns every block this snapshot still refers to.
    #[must_use]
    pub fn content_ids(&self) -> BTreeSet<ContentId> {
        let mut ids: BTreeSet<ContentId> = self.tree.content_ids().into_iter().collect();
        if let Some(saved) = &self.saved_tree_before_maximize {
            ids.extend(saved.content_ids());
        }
        ids
    }
}

/// Snapshots for all parked workspaces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceSnapshots {
    snapshots: BTreeMap<WorkspaceId, WorkspaceSnapshot>,
}

impl WorkspaceSnapshots {
    /// Creates an empty snapshot map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a snapshot, replacing any previous one for the workspace.
    pub fn insert(&mut self, workspace_id: WorkspaceId, snapshot: WorkspaceSnapshot) {
        self.snapshots.insert(workspace_id, snapshot);
    }

    /// Returns the snapshot for a workspace.
    #[must_use]
    pub fn get(&self, workspace_id: &WorkspaceId) -> Option<&WorkspaceSnapshot> {
        self.snapshots.get(workspace_id)
    }

    /// Returns true if a snapshot exists for the workspace.
    #[must_use]
    pub fn contains(&self, workspace_id: &WorkspaceId) -> bool {
        self.snapshots.contains_key(workspace_id)
    }

    /// Removes a workspace's snapshot, returning it if there was one.
    pub fn remove(&mut self, workspace_id: &WorkspaceId) -> Option<WorkspaceSnapshot> {
        self.snapshots.remove(workspace_id)
    }

    /// Returns the number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns true if no snapshots are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Returns the IDs of all parked workspaces.
    #[must_use]
    pub fn workspace_ids(&self) -> Vec<WorkspaceId> {
        self.snapshots.keys().cloned().collect()
    }

    /// Returns every block referenced by any stored snapshot.
    #[must_use]
    pub fn referenced_content_ids(&self) -> BTreeSet<ContentId> {
        self.snapshots
            .values()
            .flat_map(WorkspaceSnapshot::content_ids)
            .collect()
    }

    /// Writes all snapshots to a JSON file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_to_file(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        tracing::debug!(path = %path.display(), count = self.len(), "Saved workspace snapshots");
        Ok(())
    }

    /// Reads snapshots from a JSON file. A missing file yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self, SnapshotError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let json = fs::read_to_string(path)?;
        let snapshots: Self = serde_json::from_str(&json)?;
        tracing::debug!(path = %path.display(), count = snapshots.len(), "Loaded workspace snapshots");
        Ok(snapshots)
    }
}
