//! Task error types.

use diary_core::TaskId;
use diary_store::StoreError;
use thiserror::Error;

/// Errors from task operations.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Client input rejected.
    #[error("{0}")]
    Validation(String),

    /// No task with this ID.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TaskError {
    /// Shorthand for a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<rusqlite::Error> for TaskError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(StoreError::Sqlite(err))
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, TaskError>;
