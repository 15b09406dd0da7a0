//! The model: exclusive owner of graph, layout, and highlight state.
//!
//! One `Model` instance is constructed explicitly and driven by whoever owns
//! the update loop; there is no global current model. All mutation funnels
//! through `update_cycle` and the interaction methods, which the run loop
//! serializes on a single thread.

use crate::core::diff::{
    apply_additions, apply_branch_shapes, apply_removals, apply_updates, diff, insertion_order,
};
use crate::core::highlight::HighlightMachine;
use crate::core::layout::{CancelToken, LayoutOutcome, compute_layout};
use crate::core::snapshot::RepoSnapshot;
use crate::core::store::GraphStore;
use crate::core::{ChangeSet, CommitId, GraphEvent, Tracked};

/// Result of one update cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The snapshot matched the tracked state; nothing was touched.
    Unchanged,
    /// Layout was cancelled; the store was rolled back to the last merge.
    Cancelled,
    /// The cycle merged. Events are ordered: removals, additions,
    /// placements. The change-set rides along for callers that render
    /// branch/tag decorations.
    Completed {
        events: Vec<GraphEvent>,
        change: ChangeSet,
    },
}

#[derive(Debug, Default)]
pub struct Model {
    store: GraphStore,
    tracked: Tracked,
    highlight: HighlightMachine,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn highlight(&self) -> &HighlightMachine {
        &self.highlight
    }

    /// Run one atomic update cycle against a fresh snapshot.
    ///
    /// Order matters: removals and additions go in first so layout sees the
    /// cycle's live membership, then layout (the only cancellable stretch),
    /// then kind updates and branch shapes, then the single merge. Tracked
    /// sets advance only after a successful merge, so a cancelled cycle
    /// re-diffs from the last merged state next time.
    pub fn update_cycle(&mut self, snapshot: &RepoSnapshot, cancel: &CancelToken) -> CycleOutcome {
        let change = diff(&self.tracked, snapshot, &self.store);
        if change.is_empty() {
            return CycleOutcome::Unchanged;
        }
        tracing::debug!(
            to_add = change.to_add.len(),
            to_remove = change.to_remove.len(),
            to_update = change.to_update.len(),
            "applying change-set"
        );

        apply_removals(&mut self.store, &change);
        let order = insertion_order(&change, snapshot);
        apply_additions(&mut self.store, &order, snapshot);

        let placements = match compute_layout(&self.store, cancel) {
            LayoutOutcome::Cancelled => {
                self.store.discard_pending();
                return CycleOutcome::Cancelled;
            }
            LayoutOutcome::Completed(placements) => placements,
        };

        apply_updates(&mut self.store, &change, snapshot);
        let shape_events = apply_branch_shapes(&mut self.store, snapshot);

        let mut events = self.store.merge();
        for placement in &placements {
            if let Some(moved) =
                self.store
                    .apply_placement(&placement.id, placement.row, placement.column)
            {
                events.push(GraphEvent::CellPlaced {
                    id: placement.id.clone(),
                    row: placement.row,
                    column: placement.column,
                    moved,
                });
            }
        }
        events.extend(shape_events);

        // Losing the selected commit drops the whole selection neighborhood.
        // Forget removed ids before the reset so no state event for a cell
        // follows its removal in the same batch.
        let selection_removed = self
            .highlight
            .selection()
            .is_some_and(|sel| change.to_remove.contains(sel));
        self.highlight.forget(&change.to_remove);
        if selection_removed {
            events.extend(self.highlight.reset_all(&mut self.store));
        }
        self.tracked = Tracked::from_snapshot(snapshot);
        CycleOutcome::Completed { events, change }
    }

    pub fn select(&mut self, id: &CommitId) -> Vec<GraphEvent> {
        self.highlight.select(&mut self.store, id)
    }

    pub fn hover(&mut self, id: &CommitId, entering: bool) -> Vec<GraphEvent> {
        self.highlight.hover(&mut self.store, id, entering)
    }

    pub fn emphasize(&mut self, id: &CommitId) -> Vec<GraphEvent> {
        self.highlight.emphasize(&self.store, id)
    }

    pub fn emphasis_done(&mut self, id: &CommitId) -> Vec<GraphEvent> {
        self.highlight.end_emphasis(id)
    }

    pub fn clear_selection(&mut self) -> Vec<GraphEvent> {
        self.highlight.clear_selection(&mut self.store)
    }

    pub fn reset_highlights(&mut self) -> Vec<GraphEvent> {
        self.highlight.reset_all(&mut self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CellKind, CommitInfo, DisplayState, EdgeKey, Position};

    fn id(s: &str) -> CommitId {
        CommitId::parse(s).unwrap()
    }

    fn commit(s: &str, ts: i64, parents: &[&str]) -> CommitInfo {
        CommitInfo {
            id: id(s),
            timestamp: ts,
            parents: parents.iter().map(|p| id(p)).collect(),
            is_local: true,
            is_remote: true,
        }
    }

    fn snapshot(commits: Vec<CommitInfo>) -> RepoSnapshot {
        RepoSnapshot {
            commits,
            branches: vec![],
            tags: vec![],
        }
    }

    fn abc() -> RepoSnapshot {
        snapshot(vec![
            commit("a", 1, &[]),
            commit("b", 2, &["a"]),
            commit("c", 3, &["a"]),
        ])
    }

    #[test]
    fn first_cycle_builds_and_places_the_graph() {
        let mut model = Model::new();
        let outcome = model.update_cycle(&abc(), &CancelToken::new());
        let CycleOutcome::Completed { events, change } = outcome else {
            panic!("expected completed cycle");
        };
        assert_eq!(change.to_add.len(), 3);

        // Placements follow the add events and cover every cell.
        let placed: Vec<&CommitId> = events
            .iter()
            .filter_map(|e| match e {
                GraphEvent::CellPlaced { id, .. } => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(placed.len(), 3);

        let a = model.store().cell(&id("a")).unwrap();
        assert_eq!(a.position, Some(Position { row: 0, column: 0 }));
        assert!(model.store().is_committed(&id("c")));
    }

    #[test]
    fn identical_snapshot_is_a_noop() {
        let mut model = Model::new();
        let cancel = CancelToken::new();
        model.update_cycle(&abc(), &cancel);
        assert!(matches!(
            model.update_cycle(&abc(), &cancel),
            CycleOutcome::Unchanged
        ));
    }

    #[test]
    fn removed_commit_drops_with_incident_edges() {
        let mut model = Model::new();
        let cancel = CancelToken::new();
        model.update_cycle(&abc(), &cancel);

        let pruned = snapshot(vec![commit("a", 1, &[]), commit("b", 2, &["a"])]);
        let CycleOutcome::Completed { events, change } =
            model.update_cycle(&pruned, &cancel)
        else {
            panic!("expected completed cycle");
        };
        assert_eq!(change.to_remove, vec![id("c")]);
        assert!(events.contains(&GraphEvent::CellRemoved { id: id("c") }));
        assert!(events.contains(&GraphEvent::EdgeRemoved {
            key: EdgeKey::new(id("a"), id("c")),
        }));
        assert!(model.store().cell(&id("c")).is_none());
    }

    #[test]
    fn cancelled_cycle_preserves_merged_state_and_retries() {
        let mut model = Model::new();
        let cancel = CancelToken::new();
        model.update_cycle(&abc(), &cancel);

        let grown = snapshot(vec![
            commit("a", 1, &[]),
            commit("b", 2, &["a"]),
            commit("c", 3, &["a"]),
            commit("d", 4, &["c"]),
        ]);
        cancel.cancel();
        assert!(matches!(
            model.update_cycle(&grown, &cancel),
            CycleOutcome::Cancelled
        ));
        assert!(model.store().cell(&id("d")).is_none());
        assert!(model.store().is_committed(&id("c")));

        // The next cycle proceeds cleanly from the last merged state.
        cancel.reset();
        let CycleOutcome::Completed { change, .. } = model.update_cycle(&grown, &cancel)
        else {
            panic!("expected completed cycle");
        };
        assert_eq!(change.to_add, vec![id("d")]);
        assert!(model.store().is_committed(&id("d")));
    }

    #[test]
    fn selection_survives_unrelated_cycles_but_not_removal() {
        let mut model = Model::new();
        let cancel = CancelToken::new();
        model.update_cycle(&abc(), &cancel);

        model.select(&id("c"));
        assert_eq!(model.highlight().observed(&id("c")), DisplayState::Selected);

        let pruned = snapshot(vec![commit("a", 1, &[]), commit("b", 2, &["a"])]);
        let CycleOutcome::Completed { events, .. } = model.update_cycle(&pruned, &cancel)
        else {
            panic!("expected completed cycle");
        };
        assert!(model.highlight().selection().is_none());

        // The neighborhood reverts, but the removed cell itself gets no
        // state event after its removal.
        assert!(events.contains(&GraphEvent::CellState {
            id: id("a"),
            state: DisplayState::Standard,
        }));
        assert!(!events.iter().any(
            |e| matches!(e, GraphEvent::CellState { id: cid, .. } if *cid == id("c"))
        ));
    }
}
