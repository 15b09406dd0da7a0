//! Left-packed tree layout.
//!
//! Columns: cells sorted by timestamp descending; the oldest cell gets
//! column 0 and columns grow with recency. Exact-time ties order a direct
//! child before its parent; unrelated ties fall back to id order so the
//! result stays total and deterministic.
//!
//! Rows: a per-row "max column used" ledger. Each chain takes the smallest
//! row whose ledger does not exceed the chain head's column, follows the
//! most-recently-timestamped unvisited child link downward, and settles the
//! ledger once with the chain's maximum column. Linear history therefore
//! forms long single-row lanes; rows only split at real divergence points.
//!
//! Layout never mutates the store. The caller applies the returned
//! placements after a completed run; a cancelled run changes nothing.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::identity::CommitId;
use super::store::GraphStore;

/// Cooperative cancellation flag, checked at every cell placement.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// One computed position, with the row/column-changed flag the renderer
/// uses to decide whether to animate the transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub id: CommitId,
    pub row: usize,
    pub column: usize,
    pub moved: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LayoutOutcome {
    Completed(Vec<Placement>),
    Cancelled,
}

/// Compute positions for every live cell.
pub fn compute_layout(store: &GraphStore, cancel: &CancelToken) -> LayoutOutcome {
    let order = sorted_cells(store);
    let n = order.len();
    let index_of: BTreeMap<&CommitId, usize> =
        order.iter().enumerate().map(|(i, c)| (&c.id, i)).collect();
    let column = |i: usize| n - 1 - i;

    let mut placements = Vec::with_capacity(n);
    let mut visited: BTreeSet<usize> = BTreeSet::new();
    // ledger[row] = highest column occupied in that row so far
    let mut ledger: Vec<usize> = Vec::new();

    // Oldest first, so early chains claim low columns and low rows.
    for start in (0..n).rev() {
        if visited.contains(&start) {
            continue;
        }
        let start_col = column(start);
        let row = match ledger.iter().position(|&used| used <= start_col) {
            Some(row) => row,
            None => {
                ledger.push(0);
                ledger.len() - 1
            }
        };

        let mut chain_max = start_col;
        let mut current = start;
        loop {
            if cancel.is_cancelled() {
                tracing::debug!(placed = placements.len(), "layout cancelled");
                return LayoutOutcome::Cancelled;
            }
            let cell = order[current];
            let col = column(current);
            chain_max = chain_max.max(col);
            let moved = cell.position.map(|p| (p.row, p.column)) != Some((row, col));
            placements.push(Placement {
                id: cell.id.clone(),
                row,
                column: col,
                moved,
            });
            visited.insert(current);

            // Follow the most recent unvisited child; the sorted index is
            // already "recency with ties resolved", so take the smallest.
            let next = cell
                .children
                .iter()
                .filter_map(|child| index_of.get(child).copied())
                .filter(|i| !visited.contains(i))
                .min();
            match next {
                Some(i) => current = i,
                None => break,
            }
        }

        // One ledger settlement per chain: per-node updates would let a
        // long-travelled descendant lane corrupt packing for unrelated
        // subtrees above it.
        ledger[row] = ledger[row].max(chain_max);
    }

    LayoutOutcome::Completed(placements)
}

/// Live cells, newest first, ties resolved child-before-parent then by id.
fn sorted_cells(store: &GraphStore) -> Vec<&super::cell::Cell> {
    let mut order: Vec<&super::cell::Cell> = store.live_cells().collect();
    order.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.id.cmp(&a.id))
    });

    // Within each equal-timestamp run, bubble direct children ahead of
    // their parents. Runs are tiny (same-second commits), so a fixpoint
    // pass is fine and keeps the comparator above a total order.
    let mut run_start = 0;
    while run_start < order.len() {
        let ts = order[run_start].timestamp;
        let mut run_end = run_start;
        while run_end + 1 < order.len() && order[run_end + 1].timestamp == ts {
            run_end += 1;
        }
        if run_end > run_start {
            loop {
                let mut swapped = false;
                for i in run_start..run_end {
                    if order[i + 1].is_direct_child_of(&order[i].id) {
                        order.swap(i, i + 1);
                        swapped = true;
                    }
                }
                if !swapped {
                    break;
                }
            }
        }
        run_start = run_end + 1;
    }
    order
}
