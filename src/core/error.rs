//! Core capability errors (identifier parsing and validation).
//!
//! These are bounded and stable: core errors represent refusal states for
//! malformed input, not library implementation details. Lookups of unknown
//! identifiers are deliberately NOT errors - store operations return `None`
//! and callers check.

use thiserror::Error;

/// Invalid identifier.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum InvalidId {
    #[error("commit id `{raw}` is invalid: {reason}")]
    Commit { raw: String, reason: String },
    #[error("branch name `{raw}` is invalid: {reason}")]
    Branch { raw: String, reason: String },
    #[error("tag name `{raw}` is invalid: {reason}")]
    Tag { raw: String, reason: String },
}

/// Canonical error enum for the graph core.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    InvalidId(#[from] InvalidId),
}
