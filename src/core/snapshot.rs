//! Inbound snapshot types supplied by the repository collaborator.
//!
//! One snapshot describes the complete commit/branch/tag state of the
//! repository at a point in time. The diff engine compares it against the
//! previous cycle's tracked sets; the snapshot itself is never mutated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::identity::{BranchName, CommitId, TagName};

/// One commit as reported by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub id: CommitId,
    pub timestamp: i64,
    pub parents: Vec<CommitId>,
    pub is_local: bool,
    pub is_remote: bool,
}

/// One branch head as reported by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub name: BranchName,
    pub head: CommitId,
    pub is_tracked: bool,
}

/// One tag as reported by the backend. Tags are immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInfo {
    pub name: TagName,
    pub commit: CommitId,
}

/// A complete repository snapshot for one update cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSnapshot {
    pub commits: Vec<CommitInfo>,
    pub branches: Vec<BranchInfo>,
    pub tags: Vec<TagInfo>,
}

impl RepoSnapshot {
    /// Index commits by id for parent resolution during insertion.
    pub fn commit_index(&self) -> BTreeMap<&CommitId, &CommitInfo> {
        self.commits.iter().map(|c| (&c.id, c)).collect()
    }
}
