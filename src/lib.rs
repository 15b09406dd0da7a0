//! revgraph: the model core of an interactive commit-history viewer.
//!
//! Turns repository snapshots into an incrementally updated, laid-out
//! cell/edge graph with a highlight state machine. The repository backend
//! and the renderer stay outside: snapshots come in as plain data
//! (`RepoSnapshot`), changes go out as a `GraphEvent` stream.

#![forbid(unsafe_code)]

pub mod config;
pub mod core;
pub mod error;
pub mod model;
pub mod telemetry;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

// Re-export the working set at crate root for convenience
pub use crate::config::{LoggingConfig, ModelConfig};
pub use crate::core::{
    BranchInfo, BranchName, CancelToken, Cell, CellKind, CellShape, ChangeSet, CommitId,
    CommitInfo, DisplayState, Edge, EdgeKey, GraphEvent, GraphStore, Position, RepoSnapshot,
    TagInfo, TagName, Tracked,
};
pub use crate::model::{CycleOutcome, Model, ModelLoop, ModelMessage, run_model_loop};
