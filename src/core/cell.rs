//! Cell: one commit rendered as a node in the history graph.
//!
//! A cell is created once per identifier and destroyed only when the diff
//! engine decides the commit no longer exists in the repository snapshot.
//! Parent references are stored as supplied at creation; child references
//! are back-links grown as later commits arrive and are not owned.

use serde::{Deserialize, Serialize};

use super::identity::CommitId;

/// Where a commit lives relative to the remote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Neither local nor remote membership was reported.
    Default,
    LocalOnly,
    RemoteOnly,
    /// Present both locally and on the remote.
    Both,
    /// Invisible placeholder; edges touching one render dashed.
    Placeholder,
}

impl CellKind {
    /// Kind derived from snapshot membership flags.
    pub fn from_membership(is_local: bool, is_remote: bool) -> Self {
        match (is_local, is_remote) {
            (true, true) => CellKind::Both,
            (true, false) => CellKind::LocalOnly,
            (false, true) => CellKind::RemoteOnly,
            (false, false) => CellKind::Default,
        }
    }
}

/// Extra glyph drawn for branch heads. Reset and recomputed every cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellShape {
    Default,
    LocalBranchTip,
    RemoteBranchTip,
    TrackedBranchTip,
}

/// Grid position assigned by the layout engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

/// A node in the graph store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CommitId,
    /// Commit time; used only for ordering, ties broken by ancestry.
    pub timestamp: i64,
    /// 0-2 parent references, as supplied at creation. A parent may be
    /// absent from the store (pruned ancestor); such references stay in
    /// place and are filtered at query time.
    pub parents: Vec<CommitId>,
    /// Back-links to commits that name this one as a parent.
    pub children: Vec<CommitId>,
    pub kind: CellKind,
    pub shape: CellShape,
    /// `None` until the layout engine first places the cell.
    pub position: Option<Position>,
}

impl Cell {
    pub(crate) fn new(id: CommitId, timestamp: i64, parents: Vec<CommitId>, kind: CellKind) -> Self {
        Self {
            id,
            timestamp,
            parents,
            children: Vec::new(),
            kind,
            shape: CellShape::Default,
            position: None,
        }
    }

    /// A cell becomes visible once it has received a position.
    pub fn is_visible(&self) -> bool {
        self.position.is_some()
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, CellKind::Placeholder)
    }

    pub fn is_direct_child_of(&self, other: &CommitId) -> bool {
        self.parents.contains(other)
    }
}
