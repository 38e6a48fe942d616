//! `blocktile` Core Library
//!
//! This crate provides the layout engine for a tiling workspace: a tree of
//! splits and content blocks that can be split, closed, dragged around,
//! resized, maximized and parked per workspace.
//!
//! # Crate Structure
//!
//! - [`layout`] - Layout tree, engine operations, block store seam and workspace snapshots
//! - [`config`] - Engine settings and their TOML persistence
//! - [`tracing`] - Structured logging setup and standard span names

// Enable missing_docs warning for public API documentation
#![warn(missing_docs)]

pub mod config;
pub mod layout;
pub mod tracing;

// =============================================================================
// Convenience re-exports
// =============================================================================

pub use config::{ConfigError, ConfigManager, LayoutSettings, LoggingSettings};
pub use layout::{
    BlockRecord, BlockSpec, BlockStore, BranchNode, CleanupReport, ContentId, DropPosition,
    LayoutEngine, LayoutError, LayoutNode, LeafNode, MemoryBlockStore, MoveResult, NodeId,
    RenderKey, SnapshotError, SplitDirection, StoreError, WorkspaceId, WorkspaceSnapshot,
    WorkspaceSnapshots,
};
pub use self::tracing::{
    TracingConfig, TracingError, TracingLevel, TracingOutput, init_tracing,
    is_tracing_initialized,
};
