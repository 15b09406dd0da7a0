//! Outbound event stream consumed by the rendering collaborator.

use serde::{Deserialize, Serialize};

use super::cell::CellShape;
use super::edge::EdgeKey;
use super::highlight::DisplayState;
use super::identity::CommitId;

/// One discrete change the renderer must apply.
///
/// Within a cycle events arrive in a fixed order: cell/edge removals, then
/// cell/edge additions, then placements, then shape changes, then
/// highlight-state changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphEvent {
    CellAdded {
        id: CommitId,
    },
    CellRemoved {
        id: CommitId,
    },
    EdgeAdded {
        key: EdgeKey,
    },
    EdgeRemoved {
        key: EdgeKey,
    },
    /// Position after layout; `moved` is false when row and column are
    /// unchanged from the previous layout (renderer skips the transition).
    CellPlaced {
        id: CommitId,
        row: usize,
        column: usize,
        moved: bool,
    },
    /// Branch-tip glyph changed after head recomputation.
    CellShape {
        id: CommitId,
        shape: CellShape,
    },
    CellState {
        id: CommitId,
        state: DisplayState,
    },
    EdgeHighlight {
        key: EdgeKey,
        visible: bool,
    },
}
