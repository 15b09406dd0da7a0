//! Core domain types and algorithms.
//!
//! Module order follows data dependency:
//! - identity: CommitId, BranchName, TagName
//! - cell / edge: the graph's node and link types
//! - snapshot: inbound repository state
//! - event: outbound renderer events
//! - store: pending/committed graph store
//! - diff: snapshot diffing and topological insertion
//! - layout: packed grid layout
//! - highlight: display-state machine

pub mod cell;
pub mod diff;
pub mod edge;
pub mod error;
pub mod event;
pub mod highlight;
pub mod identity;
pub mod layout;
pub mod snapshot;
pub mod store;

pub use cell::{Cell, CellKind, CellShape, Position};
pub use diff::{
    ChangeSet, Tracked, apply_additions, apply_branch_shapes, apply_removals, apply_updates, diff,
    insertion_order,
};
pub use edge::{Edge, EdgeKey};
pub use error::{CoreError, InvalidId};
pub use event::GraphEvent;
pub use highlight::{DisplayState, HighlightMachine};
pub use identity::{BranchName, CommitId, TagName};
pub use layout::{CancelToken, LayoutOutcome, Placement, compute_layout};
pub use snapshot::{BranchInfo, CommitInfo, RepoSnapshot, TagInfo};
pub use store::GraphStore;
