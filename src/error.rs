use thiserror::Error;

use crate::config::ConfigError;
use crate::core::CoreError;

/// Crate-level convenience error: a thin wrapper over the capability
/// errors, not a catch-all.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("model loop is no longer running")]
    ModelStopped,
}
