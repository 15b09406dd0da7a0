//! Model module - the single-writer runtime around the graph core.
//!
//! Provides:
//! - `Model`: explicit owner of store, diff tracking, layout, and highlights
//! - `run_model_loop` / `ModelLoop`: the state thread and its channels

pub mod run;
pub mod runtime;

pub use run::{ModelLoop, ModelMessage, run_model_loop};
pub use runtime::{CycleOutcome, Model};
