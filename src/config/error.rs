//! Errors raised while loading chain settings and scores.

use std::path::PathBuf;
use thiserror::Error;

/// Why a score or chain configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The score file could not be read from disk.
    #[error("cannot read score '{path}': {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The text is not valid YAML, or names an unknown beat.
    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The score parsed but cannot be played, e.g. a join with no timers.
    #[error("invalid score: {0}")]
    InvalidConfig(String),

    #[error("missing required field: {0}")]
    MissingField(String),
}
