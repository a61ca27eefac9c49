use thiserror::Error;

use crate::scoring::{CommandRejection, SnapshotError};
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Command rejected: {0}")]
    Rejected(#[from] CommandRejection),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
