use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of the high-score key-value store.
///
/// These never reach the player as a crash; `HighScores` logs them and falls
/// back to an in-memory table for the rest of the session.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("score store I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("score store {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode scores: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ArcadeError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}
