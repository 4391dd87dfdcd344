use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures at the storage boundary.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The data directory cannot be reached at all.
    #[error("Storage unavailable at {}: {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The blob exists but is not valid JSON.
    #[error("Malformed file {name}: {source}")]
    ReadMalformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Writing or removing a blob failed. Usually transient.
    #[error("Failed to write {name}: {source}")]
    WriteFailed {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to serialize {name}: {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Whether the session can keep going after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StorageError::Unavailable { .. })
    }
}
