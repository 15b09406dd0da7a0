//! Highlight state machine.
//!
//! Durable state is exactly two structures: the persistent id -> state map
//! (`Standard` is the default and never stored) and the blocked set of cells
//! under an emphasis animation. Everything the renderer sees is a pure
//! function of (persistent state, blocked membership, hover overlay), so the
//! "restore previous state after a transient override" rule is an explicit
//! computation instead of mutation ordering.
//!
//! Rules:
//! - select: one selection at most; the selection and its relatives get
//!   persistent states, everything else reverts to standard
//! - hover: transient overlay; secondary tint while a selection is active
//! - emphasize: blocks the cell against all other transitions until the
//!   animation completes; emphasis outlives reset_all
//! - edges: visible only while both endpoints are in the active set

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::event::GraphEvent;
use super::identity::CommitId;
use super::store::GraphStore;

/// Observable display state of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayState {
    Standard,
    /// Primary highlight: selection neighborhood, or plain hover.
    Highlighted,
    /// Secondary highlight: hover exploration while a selection is active.
    SoftHighlighted,
    Selected,
    Emphasized,
}

#[derive(Debug, Default)]
pub struct HighlightMachine {
    /// Persistent states; `Standard` is encoded by absence.
    persistent: BTreeMap<CommitId, DisplayState>,
    /// Cells immune to transitions while their emphasis animation runs.
    blocked: BTreeSet<CommitId>,
    selection: Option<CommitId>,
    /// At most one transient hover overlay.
    hover: Option<(CommitId, DisplayState)>,
}

impl HighlightMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<&CommitId> {
        self.selection.as_ref()
    }

    /// The state the renderer should draw right now.
    pub fn observed(&self, id: &CommitId) -> DisplayState {
        if self.blocked.contains(id) {
            return DisplayState::Emphasized;
        }
        if let Some((hovered, overlay)) = &self.hover
            && hovered == id
        {
            return *overlay;
        }
        self.persistent
            .get(id)
            .copied()
            .unwrap_or(DisplayState::Standard)
    }

    /// Select a cell: it becomes `Selected`, its relatives `Highlighted`,
    /// and any previous selection neighborhood reverts to standard.
    pub fn select(&mut self, store: &mut GraphStore, id: &CommitId) -> Vec<GraphEvent> {
        if store.cell(id).is_none() {
            return Vec::new();
        }

        let relatives = store.relatives(id);
        let mut active: BTreeSet<CommitId> = relatives.iter().cloned().collect();
        active.insert(id.clone());

        let mut affected: BTreeSet<CommitId> = self.persistent.keys().cloned().collect();
        affected.extend(active.iter().cloned());
        if let Some((hovered, _)) = &self.hover {
            affected.insert(hovered.clone());
        }
        let before = self.observe_all(&affected);

        self.persistent.clear();
        self.persistent.insert(id.clone(), DisplayState::Selected);
        for relative in &relatives {
            self.persistent
                .insert(relative.clone(), DisplayState::Highlighted);
        }
        self.selection = Some(id.clone());

        // A pointer resting on the new neighborhood no longer overlays it;
        // a hover elsewhere drops to the secondary tint.
        let hover_in_neighborhood =
            matches!(&self.hover, Some((hovered, _)) if active.contains(hovered));
        if hover_in_neighborhood {
            self.hover = None;
        } else if let Some((_, overlay)) = &mut self.hover {
            *overlay = DisplayState::SoftHighlighted;
        }

        let mut events = self.state_deltas(&affected, &before);
        self.refresh_edges(store, &affected, &active, &mut events);
        events
    }

    /// Hover overlay. While a selection is active, hovering the selection
    /// itself or one of its neighbors changes nothing; other cells get the
    /// secondary tint instead of the primary one.
    pub fn hover(&mut self, store: &mut GraphStore, id: &CommitId, entering: bool) -> Vec<GraphEvent> {
        if store.cell(id).is_none() || self.blocked.contains(id) {
            return Vec::new();
        }

        if entering {
            let overlay = match &self.selection {
                Some(sel) => {
                    if sel == id || store.is_neighbor(sel, id) {
                        return Vec::new();
                    }
                    DisplayState::SoftHighlighted
                }
                None => DisplayState::Highlighted,
            };
            let before = self.observed(id);
            self.hover = Some((id.clone(), overlay));
            self.delta(id, before)
        } else {
            match &self.hover {
                Some((hovered, _)) if hovered == id => {
                    let before = self.observed(id);
                    self.hover = None;
                    self.delta(id, before)
                }
                _ => Vec::new(),
            }
        }
    }

    /// Begin an emphasis ("jump to and flash") animation: the cell is
    /// forced to `Emphasized` and blocked against every other transition.
    pub fn emphasize(&mut self, store: &GraphStore, id: &CommitId) -> Vec<GraphEvent> {
        if store.cell(id).is_none() {
            return Vec::new();
        }
        let before = self.observed(id);
        self.blocked.insert(id.clone());
        self.delta(id, before)
    }

    /// Emphasis animation finished: unblock and fall back to the last
    /// persistent state (or the live hover overlay, or standard).
    pub fn end_emphasis(&mut self, id: &CommitId) -> Vec<GraphEvent> {
        if !self.blocked.remove(id) {
            return Vec::new();
        }
        self.delta(id, DisplayState::Emphasized)
    }

    /// Drop every persistent entry, forcing all cells back to standard.
    /// The blocked set survives: emphasis outlives a reset.
    pub fn reset_all(&mut self, store: &mut GraphStore) -> Vec<GraphEvent> {
        let affected: BTreeSet<CommitId> = self.persistent.keys().cloned().collect();
        let before = self.observe_all(&affected);

        self.persistent.clear();
        self.selection = None;

        let mut events = self.state_deltas(&affected, &before);
        self.refresh_edges(store, &affected, &BTreeSet::new(), &mut events);
        events
    }

    /// Entry point for explicit deselection.
    pub fn clear_selection(&mut self, store: &mut GraphStore) -> Vec<GraphEvent> {
        self.reset_all(store)
    }

    /// Forget cells that no longer exist. Emits nothing: the renderer
    /// already saw their removal.
    pub fn forget(&mut self, ids: &[CommitId]) {
        for id in ids {
            self.persistent.remove(id);
            self.blocked.remove(id);
            if self.selection.as_ref() == Some(id) {
                self.selection = None;
            }
            if let Some((hovered, _)) = &self.hover
                && hovered == id
            {
                self.hover = None;
            }
        }
    }

    fn observe_all(&self, ids: &BTreeSet<CommitId>) -> BTreeMap<CommitId, DisplayState> {
        ids.iter().map(|id| (id.clone(), self.observed(id))).collect()
    }

    fn state_deltas(
        &self,
        ids: &BTreeSet<CommitId>,
        before: &BTreeMap<CommitId, DisplayState>,
    ) -> Vec<GraphEvent> {
        let mut events = Vec::new();
        for id in ids {
            let now = self.observed(id);
            if before.get(id) != Some(&now) {
                events.push(GraphEvent::CellState {
                    id: id.clone(),
                    state: now,
                });
            }
        }
        events
    }

    fn delta(&self, id: &CommitId, before: DisplayState) -> Vec<GraphEvent> {
        let now = self.observed(id);
        if now == before {
            Vec::new()
        } else {
            vec![GraphEvent::CellState {
                id: id.clone(),
                state: now,
            }]
        }
    }

    /// Re-derive highlight visibility for every edge incident to the
    /// affected cells. Only changed flags produce events, so edges already
    /// covered by the active selection never flicker.
    fn refresh_edges(
        &self,
        store: &mut GraphStore,
        around: &BTreeSet<CommitId>,
        active: &BTreeSet<CommitId>,
        events: &mut Vec<GraphEvent>,
    ) {
        let mut seen: BTreeSet<super::edge::EdgeKey> = BTreeSet::new();
        for id in around {
            for key in store.incident_edges(id) {
                if !seen.insert(key.clone()) {
                    continue;
                }
                let visible = active.contains(&key.source) && active.contains(&key.target);
                if store.set_edge_highlight(&key, visible) == Some(true) {
                    events.push(GraphEvent::EdgeHighlight { key, visible });
                }
            }
        }
    }
}
