//! Graph store: cells, edges, and the pending/committed discipline.
//!
//! Mutations accumulate in pending lists until `merge()` commits them in one
//! step - the only mutation boundary the renderer ever observes. Layout runs
//! against the live view (index minus pending removals) before the merge, so
//! it can see which cells are new this cycle. `discard_pending()` rolls an
//! uncommitted cycle back to the last merged state.
//!
//! Invariant: every edge's endpoints exist in the cell index at insertion
//! time. Operations on unknown ids are no-ops returning `None`/`false`.

use std::collections::{BTreeMap, BTreeSet};

use super::cell::{Cell, CellKind, CellShape, Position};
use super::edge::{Edge, EdgeKey};
use super::event::GraphEvent;
use super::identity::CommitId;

#[derive(Debug, Default)]
pub struct GraphStore {
    /// Every known cell, including pending additions and pending removals.
    cells: BTreeMap<CommitId, Cell>,
    /// Authoritative (merged) cell set.
    committed_cells: BTreeSet<CommitId>,
    /// Every known edge, including pending additions and pending removals.
    edges: BTreeMap<EdgeKey, Edge>,
    /// Authoritative (merged) edge set.
    committed_edges: BTreeSet<EdgeKey>,

    pending_added_cells: Vec<CommitId>,
    pending_removed_cells: Vec<CommitId>,
    pending_added_edges: Vec<EdgeKey>,
    pending_removed_edges: Vec<EdgeKey>,

    /// Committed cells overwritten by an eviction this cycle, kept so a
    /// cancelled cycle can restore them.
    displaced: Vec<Cell>,

    /// Cells whose shape is currently non-default, for bulk reset when
    /// branch heads are recomputed.
    shaped: BTreeSet<CommitId>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cell, evicting any existing cell with the same id first
    /// (conflicting re-insertion resolves by eviction, never an error).
    ///
    /// The cell is registered as a child of each parent that is currently
    /// live, with one edge per such parent. Parents absent from the store
    /// stay as dangling references: the snapshot may legitimately omit
    /// ancestors, and those chains simply lay out as roots.
    pub fn add_cell(
        &mut self,
        id: CommitId,
        timestamp: i64,
        parent1: Option<CommitId>,
        parent2: Option<CommitId>,
        kind: CellKind,
    ) -> &Cell {
        if self.cells.contains_key(&id) {
            tracing::debug!(id = %id, "evicting conflicting cell before re-insert");
            self.remove_cell(&id);
            if let Some(old) = self.cells.get(&id) {
                // Still in the index means it was committed; keep a copy
                // so discard_pending can restore it.
                self.displaced.push(old.clone());
            }
        }

        let parents: Vec<CommitId> = [parent1, parent2].into_iter().flatten().collect();
        let cell = Cell::new(id.clone(), timestamp, parents.clone(), kind);
        self.cells.insert(id.clone(), cell);
        self.pending_added_cells.push(id.clone());

        for parent in &parents {
            if !self.is_live(parent) {
                continue;
            }
            if let Some(pc) = self.cells.get_mut(parent)
                && !pc.children.contains(&id)
            {
                pc.children.push(id.clone());
            }
            self.add_edge(EdgeKey::new(parent.clone(), id.clone()));
        }

        // Live cells already naming this id as a parent reattach as
        // children; an eviction would otherwise sever their edges for good.
        let child_ids: Vec<CommitId> = self
            .cells
            .values()
            .filter(|c| c.id != id && c.parents.contains(&id) && self.is_live(&c.id))
            .map(|c| c.id.clone())
            .collect();
        for child in child_ids {
            if let Some(cell) = self.cells.get_mut(&id)
                && !cell.children.contains(&child)
            {
                cell.children.push(child.clone());
            }
            self.add_edge(EdgeKey::new(id.clone(), child));
        }

        &self.cells[&id]
    }

    /// Insert an edge, re-establishing one marked for removal this cycle.
    fn add_edge(&mut self, key: EdgeKey) {
        if self.edges.contains_key(&key) && !self.pending_removed_edges.contains(&key) {
            return;
        }
        self.edges.insert(key.clone(), Edge::new(key.clone()));
        if !self.pending_added_edges.contains(&key) {
            self.pending_added_edges.push(key);
        }
    }

    /// Remove a cell and every edge incident to it. Children become
    /// rootless; they are not re-parented and not removed recursively.
    ///
    /// Returns false for unknown ids.
    pub fn remove_cell(&mut self, id: &CommitId) -> bool {
        if !self.cells.contains_key(id) || self.pending_removed_cells.contains(id) {
            return false;
        }

        let incident: Vec<EdgeKey> = self
            .edges
            .keys()
            .filter(|k| k.touches(id))
            .cloned()
            .collect();
        for key in incident {
            self.remove_edge(&key);
        }

        // Unlink the back-reference from each parent. The cell's own parent
        // and child lists stay as created; children keep a dangling parent
        // reference that query paths filter out.
        let parents = self.cells[id].parents.clone();
        for parent in parents {
            if let Some(pc) = self.cells.get_mut(&parent) {
                pc.children.retain(|c| c != id);
            }
        }

        self.shaped.remove(id);

        if let Some(pos) = self.pending_added_cells.iter().position(|p| p == id) {
            // Added earlier this same cycle and never committed: cancel the
            // addition outright instead of recording a removal.
            self.pending_added_cells.remove(pos);
            self.cells.remove(id);
        } else {
            self.pending_removed_cells.push(id.clone());
        }
        true
    }

    fn remove_edge(&mut self, key: &EdgeKey) {
        if !self.edges.contains_key(key) || self.pending_removed_edges.contains(key) {
            return;
        }
        if let Some(pos) = self.pending_added_edges.iter().position(|k| k == key) {
            self.pending_added_edges.remove(pos);
            self.edges.remove(key);
        } else {
            self.pending_removed_edges.push(key.clone());
        }
    }

    /// Commit pending additions and removals into the authoritative sets,
    /// returning the ordered add/remove events for the renderer.
    ///
    /// Called exactly once per update cycle, after layout has run.
    pub fn merge(&mut self) -> Vec<GraphEvent> {
        let mut events = Vec::new();

        for key in std::mem::take(&mut self.pending_removed_edges) {
            self.committed_edges.remove(&key);
            if !self.pending_added_edges.contains(&key) {
                self.edges.remove(&key);
            }
            events.push(GraphEvent::EdgeRemoved { key });
        }
        for id in std::mem::take(&mut self.pending_removed_cells) {
            self.committed_cells.remove(&id);
            if !self.pending_added_cells.contains(&id) {
                self.cells.remove(&id);
            }
            events.push(GraphEvent::CellRemoved { id });
        }
        for id in std::mem::take(&mut self.pending_added_cells) {
            self.committed_cells.insert(id.clone());
            events.push(GraphEvent::CellAdded { id });
        }
        for key in std::mem::take(&mut self.pending_added_edges) {
            self.committed_edges.insert(key.clone());
            events.push(GraphEvent::EdgeAdded { key });
        }

        self.displaced.clear();
        events
    }

    /// Roll back everything since the last merge. Used when a cycle is
    /// cancelled mid-layout: the store must return to the merged state.
    pub fn discard_pending(&mut self) {
        for id in std::mem::take(&mut self.pending_added_cells) {
            self.cells.remove(&id);
        }
        let removed_marks: BTreeSet<EdgeKey> =
            self.pending_removed_edges.iter().cloned().collect();
        for key in std::mem::take(&mut self.pending_added_edges) {
            // A committed edge re-added after a removal mark stays in the
            // index; clearing the mark below restores it.
            if !removed_marks.contains(&key) {
                self.edges.remove(&key);
            }
        }

        // Evicted committed cells come back; cells marked for removal never
        // left the index, so clearing the mark suffices for them.
        for cell in std::mem::take(&mut self.displaced) {
            self.cells.insert(cell.id.clone(), cell);
        }
        self.pending_removed_cells.clear();
        self.pending_removed_edges.clear();

        // Back-links may reference cancelled additions or miss restored
        // cells; rebuild them from the parent lists, which are authoritative.
        let ids: Vec<CommitId> = self.cells.keys().cloned().collect();
        for id in &ids {
            if let Some(cell) = self.cells.get_mut(id) {
                cell.children.clear();
            }
        }
        for id in &ids {
            let parents = self
                .cells
                .get(id)
                .map(|c| c.parents.clone())
                .unwrap_or_default();
            for parent in parents {
                if let Some(pc) = self.cells.get_mut(&parent) {
                    pc.children.push(id.clone());
                }
            }
        }
    }

    /// Set the kind of an existing cell in place.
    pub fn set_kind(&mut self, id: &CommitId, kind: CellKind) -> bool {
        match self.cells.get_mut(id) {
            Some(cell) => {
                cell.kind = kind;
                true
            }
            None => false,
        }
    }

    /// Set the shape of an existing cell, tracking non-default shapes for
    /// bulk reset.
    pub fn set_shape(&mut self, id: &CommitId, shape: CellShape) -> bool {
        match self.cells.get_mut(id) {
            Some(cell) => {
                cell.shape = shape;
                if shape == CellShape::Default {
                    self.shaped.remove(id);
                } else {
                    self.shaped.insert(id.clone());
                }
                true
            }
            None => false,
        }
    }

    /// Reset every tracked non-default shape back to default, returning the
    /// affected ids with the shape each carried. Used when branch-head
    /// recomputation invalidates prior shape assignments.
    pub fn reset_shapes(&mut self) -> Vec<(CommitId, CellShape)> {
        let ids: Vec<CommitId> = std::mem::take(&mut self.shaped).into_iter().collect();
        let mut reset = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(cell) = self.cells.get_mut(&id) {
                let prior = cell.shape;
                cell.shape = CellShape::Default;
                reset.push((id, prior));
            }
        }
        reset
    }

    /// Parents and children of a cell that are currently live.
    pub fn relatives(&self, id: &CommitId) -> Vec<CommitId> {
        let Some(cell) = self.cells.get(id) else {
            return Vec::new();
        };
        cell.parents
            .iter()
            .chain(cell.children.iter())
            .filter(|r| self.is_live(r))
            .cloned()
            .collect()
    }

    pub fn is_neighbor(&self, a: &CommitId, b: &CommitId) -> bool {
        self.relatives(a).contains(b)
    }

    /// Record a layout placement. Returns whether the position changed from
    /// the previous layout, or `None` for unknown ids.
    pub fn apply_placement(&mut self, id: &CommitId, row: usize, column: usize) -> Option<bool> {
        let cell = self.cells.get_mut(id)?;
        let position = Position { row, column };
        let moved = cell.position != Some(position);
        cell.position = Some(position);
        Some(moved)
    }

    /// Set an edge's highlight-visibility flag. Returns whether the flag
    /// changed, or `None` for unknown edges.
    pub fn set_edge_highlight(&mut self, key: &EdgeKey, visible: bool) -> Option<bool> {
        let edge = self.edges.get_mut(key)?;
        let changed = edge.highlight_visible != visible;
        edge.highlight_visible = visible;
        Some(changed)
    }

    /// An edge renders dashed when either endpoint is a placeholder.
    pub fn edge_is_dashed(&self, key: &EdgeKey) -> bool {
        [&key.source, &key.target].into_iter().any(|id| {
            self.cells
                .get(id)
                .map(|c| c.is_placeholder())
                .unwrap_or(false)
        })
    }

    pub fn cell(&self, id: &CommitId) -> Option<&Cell> {
        self.cells.get(id)
    }

    pub fn edge(&self, key: &EdgeKey) -> Option<&Edge> {
        self.edges.get(key)
    }

    /// Live view: in the index and not marked for removal. An evicted id
    /// that was re-added this cycle counts as live again. This is what
    /// layout operates on between diff application and merge.
    pub fn is_live(&self, id: &CommitId) -> bool {
        self.cells.contains_key(id)
            && (!self.pending_removed_cells.contains(id) || self.pending_added_cells.contains(id))
    }

    pub fn live_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values().filter(|c| self.is_live(&c.id))
    }

    pub fn is_committed(&self, id: &CommitId) -> bool {
        self.committed_cells.contains(id)
    }

    pub fn committed_cells(&self) -> impl Iterator<Item = &Cell> {
        self.committed_cells.iter().filter_map(|id| self.cells.get(id))
    }

    pub fn committed_edges(&self) -> impl Iterator<Item = &Edge> {
        self.committed_edges.iter().filter_map(|k| self.edges.get(k))
    }

    /// Cells added since the last merge, in insertion order.
    pub fn pending_added(&self) -> &[CommitId] {
        &self.pending_added_cells
    }

    pub fn incident_edges(&self, id: &CommitId) -> Vec<EdgeKey> {
        self.edges.keys().filter(|k| k.touches(id)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> CommitId {
        CommitId::parse(s).unwrap()
    }

    fn store_abc() -> GraphStore {
        // a <- b <- c
        let mut store = GraphStore::new();
        store.add_cell(id("a"), 1, None, None, CellKind::Both);
        store.add_cell(id("b"), 2, Some(id("a")), None, CellKind::Both);
        store.add_cell(id("c"), 3, Some(id("b")), None, CellKind::Both);
        store
    }

    #[test]
    fn add_wires_children_and_edges() {
        let store = store_abc();
        assert_eq!(store.cell(&id("a")).unwrap().children, vec![id("b")]);
        assert!(store.edge(&EdgeKey::new(id("a"), id("b"))).is_some());
        assert!(store.edge(&EdgeKey::new(id("b"), id("c"))).is_some());
    }

    #[test]
    fn merge_commits_pending_in_order() {
        let mut store = store_abc();
        assert!(!store.is_committed(&id("a")));
        let events = store.merge();
        assert!(store.is_committed(&id("a")));
        assert!(store.is_committed(&id("c")));
        // Cells before edges on the add side.
        let first_edge = events
            .iter()
            .position(|e| matches!(e, GraphEvent::EdgeAdded { .. }))
            .unwrap();
        let last_cell = events
            .iter()
            .rposition(|e| matches!(e, GraphEvent::CellAdded { .. }))
            .unwrap();
        assert!(last_cell < first_edge);
        assert_eq!(store.pending_added().len(), 0);
    }

    #[test]
    fn remove_drops_incident_edges_and_backlinks() {
        let mut store = store_abc();
        store.merge();

        assert!(store.remove_cell(&id("b")));
        let events = store.merge();
        assert!(events.contains(&GraphEvent::CellRemoved { id: id("b") }));
        assert!(events.contains(&GraphEvent::EdgeRemoved {
            key: EdgeKey::new(id("a"), id("b")),
        }));
        assert!(events.contains(&GraphEvent::EdgeRemoved {
            key: EdgeKey::new(id("b"), id("c")),
        }));
        assert!(store.cell(&id("b")).is_none());
        // c is rootless now, not removed.
        assert!(store.cell(&id("c")).is_some());
        assert!(store.relatives(&id("c")).is_empty());
        assert!(store.cell(&id("a")).unwrap().children.is_empty());
    }

    #[test]
    fn unknown_ids_are_noops() {
        let mut store = store_abc();
        assert!(!store.remove_cell(&id("zz")));
        assert!(!store.set_kind(&id("zz"), CellKind::Both));
        assert!(!store.set_shape(&id("zz"), CellShape::LocalBranchTip));
        assert!(store.relatives(&id("zz")).is_empty());
        assert_eq!(store.apply_placement(&id("zz"), 0, 0), None);
    }

    #[test]
    fn eviction_replaces_cell_and_edges() {
        let mut store = store_abc();
        store.merge();

        // Same id, different parentage: old cell evicted, new one inserted.
        store.add_cell(id("c"), 3, Some(id("a")), None, CellKind::LocalOnly);
        assert!(store.is_live(&id("c")));
        let events = store.merge();
        assert!(events.contains(&GraphEvent::CellRemoved { id: id("c") }));
        assert!(events.contains(&GraphEvent::CellAdded { id: id("c") }));

        let c = store.cell(&id("c")).unwrap();
        assert_eq!(c.parents, vec![id("a")]);
        assert!(store.edge(&EdgeKey::new(id("b"), id("c"))).is_none());
        assert!(store.edge(&EdgeKey::new(id("a"), id("c"))).is_some());
    }

    #[test]
    fn eviction_preserves_child_links() {
        let mut store = store_abc();
        store.add_cell(id("d"), 4, Some(id("c")), None, CellKind::Both);
        store.merge();

        // c rewritten to sit directly on a; d is untouched and must keep
        // its edge to the replacement cell.
        store.add_cell(id("c"), 3, Some(id("a")), None, CellKind::Both);
        store.merge();

        assert!(store.edge(&EdgeKey::new(id("c"), id("d"))).is_some());
        assert!(store.relatives(&id("c")).contains(&id("d")));
        assert!(store.relatives(&id("d")).contains(&id("c")));
        assert_eq!(store.cell(&id("c")).unwrap().children, vec![id("d")]);
    }

    #[test]
    fn add_then_remove_same_cycle_cancels_out() {
        let mut store = store_abc();
        store.merge();

        store.add_cell(id("d"), 4, Some(id("c")), None, CellKind::Both);
        store.remove_cell(&id("d"));
        let events = store.merge();
        assert!(events.is_empty());
        assert!(store.cell(&id("d")).is_none());
        assert!(store.cell(&id("c")).unwrap().children.is_empty());
    }

    #[test]
    fn relatives_are_parents_and_children() {
        let mut store = store_abc();
        store.merge();
        assert_eq!(store.relatives(&id("b")), vec![id("a"), id("c")]);
        assert!(store.is_neighbor(&id("b"), &id("a")));
        assert!(!store.is_neighbor(&id("a"), &id("c")));
    }

    #[test]
    fn shape_reset_returns_tracked_ids() {
        let mut store = store_abc();
        store.merge();
        store.set_shape(&id("a"), CellShape::LocalBranchTip);
        store.set_shape(&id("c"), CellShape::TrackedBranchTip);

        let reset = store.reset_shapes();
        assert_eq!(
            reset,
            vec![
                (id("a"), CellShape::LocalBranchTip),
                (id("c"), CellShape::TrackedBranchTip),
            ]
        );
        assert_eq!(store.cell(&id("a")).unwrap().shape, CellShape::Default);
        assert!(store.reset_shapes().is_empty());
    }

    #[test]
    fn discard_pending_restores_merged_state() {
        let mut store = store_abc();
        store.merge();

        store.remove_cell(&id("c"));
        store.add_cell(id("d"), 4, Some(id("b")), None, CellKind::Both);
        // Eviction inside the cycle as well.
        store.add_cell(id("b"), 2, None, None, CellKind::LocalOnly);

        store.discard_pending();

        assert!(store.cell(&id("d")).is_none());
        let b = store.cell(&id("b")).unwrap();
        assert_eq!(b.parents, vec![id("a")]);
        assert_eq!(b.kind, CellKind::Both);
        assert_eq!(b.children, vec![id("c")]);
        assert!(store.is_live(&id("c")));
        assert!(store.edge(&EdgeKey::new(id("b"), id("c"))).is_some());
        // A subsequent merge sees nothing pending.
        assert!(store.merge().is_empty());
    }

    #[test]
    fn dashed_derives_from_placeholder_endpoint() {
        let mut store = store_abc();
        let key = EdgeKey::new(id("a"), id("b"));
        assert!(!store.edge_is_dashed(&key));
        store.set_kind(&id("a"), CellKind::Placeholder);
        assert!(store.edge_is_dashed(&key));
    }

    #[test]
    fn placement_reports_moved() {
        let mut store = store_abc();
        store.merge();
        assert_eq!(store.apply_placement(&id("a"), 0, 0), Some(true));
        assert_eq!(store.apply_placement(&id("a"), 0, 0), Some(false));
        assert_eq!(store.apply_placement(&id("a"), 1, 0), Some(true));
        assert!(store.cell(&id("a")).unwrap().is_visible());
    }
}
