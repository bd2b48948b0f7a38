//! Error types for the task store and its durable backend.

use std::io;

use crate::task::TaskId;

/// Failures of the durable key-value backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend could not be read or written.
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    /// The collection could not be encoded or decoded.
    #[error("invalid task data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by task store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Task text was empty or whitespace only.
    #[error("task text cannot be empty")]
    EmptyText,

    /// A due date could not be parsed.
    #[error("invalid due date '{0}'")]
    InvalidDueDate(String),

    /// No task carries the given id.
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// The durable backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StoreError {
    /// Rejected input; prior state is unchanged.
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::EmptyText | StoreError::InvalidDueDate(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
