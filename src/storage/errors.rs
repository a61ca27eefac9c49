use thiserror::Error;

use crate::scoring::SnapshotError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Match {0} belongs to another user")]
    Forbidden(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}
