//! Error types for sapscope-core

use thiserror::Error;

/// Main error type for the sapscope-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Enumeration or fetch of a candidate file failed
    #[error("source error for {file_key}: {message}")]
    Source { file_key: String, message: String },

    /// The oracle module failed to load or its startup sequence trapped.
    /// Fatal to classification: no pipeline run is possible without it.
    #[error("oracle load error: {0}")]
    OracleLoad(String),

    /// A per-call oracle failure (bad pointer, trap during classification)
    #[error("oracle error: {0}")]
    Oracle(String),

    /// The arena's bump offset would pass its fixed ceiling.
    ///
    /// There is no free operation, so this is the expected end state of a
    /// long batch over large files, not a bug.
    #[error("arena exhausted: requested {requested} bytes at offset {offset} (capacity {capacity})")]
    ArenaExhausted {
        requested: usize,
        offset: usize,
        capacity: usize,
    },
}

/// Result type alias for sapscope-core
pub type Result<T> = std::result::Result<T, Error>;
