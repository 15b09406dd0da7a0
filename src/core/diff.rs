//! Diff engine: tracked membership vs. fresh snapshot.
//!
//! Produces one `ChangeSet` per update cycle:
//! - to-add / to-remove by commit-set difference
//! - to-update by local/remote membership XOR (locality flips)
//! - branch and tag deltas by name
//! - conflicting re-insertions (same id, different parentage) folded into
//!   to-add; the store resolves them by eviction
//!
//! Insertion ordering is an iterative post-order DFS so parents always reach
//! the store before their children, without recursion depth limits on long
//! histories.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::cell::CellKind;
use super::event::GraphEvent;
use super::identity::{BranchName, CommitId, TagName};
use super::snapshot::{BranchInfo, CommitInfo, RepoSnapshot};
use super::store::GraphStore;

/// Membership sets carried between cycles. Rebuilt from the snapshot after
/// every successful merge; a cancelled cycle leaves them untouched so the
/// next diff starts from the last merged state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tracked {
    pub commits: BTreeSet<CommitId>,
    pub local: BTreeSet<CommitId>,
    pub remote: BTreeSet<CommitId>,
    pub branches: BTreeMap<BranchName, BranchInfo>,
    pub tags: BTreeSet<TagName>,
}

impl Tracked {
    pub fn from_snapshot(snapshot: &RepoSnapshot) -> Self {
        let mut tracked = Tracked::default();
        for commit in &snapshot.commits {
            tracked.commits.insert(commit.id.clone());
            if commit.is_local {
                tracked.local.insert(commit.id.clone());
            }
            if commit.is_remote {
                tracked.remote.insert(commit.id.clone());
            }
        }
        for branch in &snapshot.branches {
            tracked.branches.insert(branch.name.clone(), branch.clone());
        }
        for tag in &snapshot.tags {
            tracked.tags.insert(tag.name.clone());
        }
        tracked
    }
}

/// Output of one diff run. All-empty means the cycle is a no-op and every
/// downstream step is skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub to_add: Vec<CommitId>,
    pub to_remove: Vec<CommitId>,
    pub to_update: Vec<CommitId>,
    pub branches_added: Vec<BranchName>,
    pub branches_changed: Vec<BranchName>,
    pub branches_removed: Vec<BranchName>,
    pub tags_added: Vec<TagName>,
    pub tags_removed: Vec<TagName>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty()
            && self.to_remove.is_empty()
            && self.to_update.is_empty()
            && self.branches_added.is_empty()
            && self.branches_changed.is_empty()
            && self.branches_removed.is_empty()
            && self.tags_added.is_empty()
            && self.tags_removed.is_empty()
    }
}

/// Commits a cell keeps as parents: at most two, in snapshot order.
fn effective_parents(info: &CommitInfo) -> (Option<CommitId>, Option<CommitId>) {
    let mut it = info.parents.iter().cloned();
    (it.next(), it.next())
}

/// Compare tracked membership against a fresh snapshot.
///
/// The store is consulted only to detect conflicting re-insertions: a commit
/// that persists by id but whose parentage differs from the stored cell goes
/// back into to-add, and `add_cell` evicts the stale cell on insertion.
pub fn diff(tracked: &Tracked, snapshot: &RepoSnapshot, store: &GraphStore) -> ChangeSet {
    let mut change = ChangeSet::default();

    let snap_commits: BTreeSet<CommitId> =
        snapshot.commits.iter().map(|c| c.id.clone()).collect();
    let snap_local: BTreeSet<CommitId> = snapshot
        .commits
        .iter()
        .filter(|c| c.is_local)
        .map(|c| c.id.clone())
        .collect();
    let snap_remote: BTreeSet<CommitId> = snapshot
        .commits
        .iter()
        .filter(|c| c.is_remote)
        .map(|c| c.id.clone())
        .collect();

    let mut to_add: BTreeSet<CommitId> =
        snap_commits.difference(&tracked.commits).cloned().collect();
    let to_remove: BTreeSet<CommitId> =
        tracked.commits.difference(&snap_commits).cloned().collect();

    // Same id, different parentage: evict-and-reinsert.
    for info in &snapshot.commits {
        if to_add.contains(&info.id) {
            continue;
        }
        if let Some(cell) = store.cell(&info.id) {
            let (p1, p2) = effective_parents(info);
            let incoming: Vec<CommitId> = [p1, p2].into_iter().flatten().collect();
            if cell.parents != incoming {
                to_add.insert(info.id.clone());
            }
        }
    }

    // Locality flips: XOR of membership, minus anything being added or
    // removed this cycle (to-add gets its kind at insertion).
    let mut to_update: BTreeSet<CommitId> = BTreeSet::new();
    to_update.extend(tracked.local.symmetric_difference(&snap_local).cloned());
    to_update.extend(tracked.remote.symmetric_difference(&snap_remote).cloned());
    let to_update: BTreeSet<CommitId> = to_update
        .into_iter()
        .filter(|id| !to_remove.contains(id) && !to_add.contains(id))
        .collect();

    change.to_add = to_add.into_iter().collect();
    change.to_remove = to_remove.into_iter().collect();
    change.to_update = to_update.into_iter().collect();

    for branch in &snapshot.branches {
        match tracked.branches.get(&branch.name) {
            None => change.branches_added.push(branch.name.clone()),
            Some(prev) if prev.head != branch.head => {
                change.branches_changed.push(branch.name.clone());
            }
            Some(_) => {}
        }
    }
    let snap_branches: BTreeSet<&BranchName> =
        snapshot.branches.iter().map(|b| &b.name).collect();
    for name in tracked.branches.keys() {
        if !snap_branches.contains(name) {
            change.branches_removed.push(name.clone());
        }
    }

    let snap_tags: BTreeSet<&TagName> = snapshot.tags.iter().map(|t| &t.name).collect();
    for tag in &snapshot.tags {
        if !tracked.tags.contains(&tag.name) {
            change.tags_added.push(tag.name.clone());
        }
    }
    for name in &tracked.tags {
        if !snap_tags.contains(name) {
            change.tags_removed.push(name.clone());
        }
    }

    change
}

/// Linearize to-add so every commit follows its to-add parents.
///
/// Iterative post-order DFS with an explicit stack: peek the top commit,
/// push parents that still need insertion, pop into the queue once all
/// parents are resolved. Parents already in the store, or absent from the
/// snapshot entirely (pruned ancestors), count as resolved.
pub fn insertion_order(change: &ChangeSet, snapshot: &RepoSnapshot) -> Vec<CommitId> {
    let index = snapshot.commit_index();
    let pending: BTreeSet<&CommitId> = change.to_add.iter().collect();

    let mut queue = Vec::with_capacity(change.to_add.len());
    let mut visited: BTreeSet<CommitId> = BTreeSet::new();
    let mut stack: Vec<CommitId> = change.to_add.clone();

    while let Some(top) = stack.last().cloned() {
        if visited.contains(&top) {
            stack.pop();
            continue;
        }
        let Some(info) = index.get(&top) else {
            // Seeds come from the snapshot, so this cannot happen; drop it
            // rather than loop.
            stack.pop();
            visited.insert(top);
            continue;
        };
        let mut blocked = false;
        for parent in info.parents.iter().take(2) {
            if pending.contains(parent) && !visited.contains(parent) {
                stack.push(parent.clone());
                blocked = true;
            }
        }
        if !blocked {
            stack.pop();
            visited.insert(top.clone());
            queue.push(top);
        }
    }

    queue
}

/// Apply removals ahead of insertion.
pub fn apply_removals(store: &mut GraphStore, change: &ChangeSet) {
    for id in &change.to_remove {
        store.remove_cell(id);
    }
}

/// Drain the insertion queue into the store, wiring each commit to its
/// already-present parents. Kind is computed from local/remote membership.
pub fn apply_additions(store: &mut GraphStore, order: &[CommitId], snapshot: &RepoSnapshot) {
    let index = snapshot.commit_index();
    for id in order {
        let Some(info) = index.get(id) else { continue };
        let (p1, p2) = effective_parents(info);
        let kind = CellKind::from_membership(info.is_local, info.is_remote);
        store.add_cell(info.id.clone(), info.timestamp, p1, p2, kind);
    }
}

/// Flip kinds for commits whose locality changed.
pub fn apply_updates(store: &mut GraphStore, change: &ChangeSet, snapshot: &RepoSnapshot) {
    let index = snapshot.commit_index();
    for id in &change.to_update {
        if let Some(info) = index.get(id) {
            store.set_kind(id, CellKind::from_membership(info.is_local, info.is_remote));
        }
    }
}

/// Recompute branch-tip shapes from scratch: prior assignments are invalid
/// whenever any head moved, so reset everything and re-mark current heads.
/// Returns one `CellShape` event per cell whose glyph actually changed.
pub fn apply_branch_shapes(store: &mut GraphStore, snapshot: &RepoSnapshot) -> Vec<GraphEvent> {
    use super::cell::CellShape;

    let mut prior: BTreeMap<CommitId, CellShape> = store.reset_shapes().into_iter().collect();
    let mut events = Vec::new();
    for branch in &snapshot.branches {
        let Some(cell) = store.cell(&branch.head) else {
            continue;
        };
        let shape = if branch.is_tracked {
            CellShape::TrackedBranchTip
        } else if cell.kind == CellKind::RemoteOnly {
            CellShape::RemoteBranchTip
        } else {
            CellShape::LocalBranchTip
        };
        store.set_shape(&branch.head, shape);
        if prior.remove(&branch.head) != Some(shape) {
            events.push(GraphEvent::CellShape {
                id: branch.head.clone(),
                shape,
            });
        }
    }
    // Former heads that kept no branch revert to the default glyph.
    for (id, _) in prior {
        events.push(GraphEvent::CellShape {
            id,
            shape: CellShape::Default,
        });
    }
    events
}
