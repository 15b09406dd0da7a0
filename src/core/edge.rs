//! Edge: a directed parent -> child link between two cells.
//!
//! EdgeKey: identity tuple (source = parent, target = child)
//! Edge: key + highlight-visibility flag
//!
//! Endpoint positions and dashed style are derived from the store at render
//! time, not stored here; the highlight flag is the one piece of edge state
//! that is independent of the endpoints.

use serde::{Deserialize, Serialize};

use super::identity::CommitId;

/// Edge identity tuple. Edges are unique by (source, target).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    /// Parent commit.
    pub source: CommitId,
    /// Child commit.
    pub target: CommitId,
}

impl EdgeKey {
    pub fn new(source: CommitId, target: CommitId) -> Self {
        Self { source, target }
    }

    pub fn touches(&self, id: &CommitId) -> bool {
        self.source == *id || self.target == *id
    }
}

/// A directed edge in the graph store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub key: EdgeKey,
    /// True while both endpoints are in the active highlight/selection set.
    pub highlight_visible: bool,
}

impl Edge {
    pub fn new(key: EdgeKey) -> Self {
        Self {
            key,
            highlight_visible: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touches_either_endpoint() {
        let a = CommitId::parse("a").unwrap();
        let b = CommitId::parse("b").unwrap();
        let c = CommitId::parse("c").unwrap();
        let key = EdgeKey::new(a.clone(), b.clone());
        assert!(key.touches(&a));
        assert!(key.touches(&b));
        assert!(!key.touches(&c));
    }
}
