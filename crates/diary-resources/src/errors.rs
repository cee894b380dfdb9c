//! Resource error types.

use diary_core::ResourceId;
use diary_store::StoreError;
use thiserror::Error;

/// Errors from resource operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Client input rejected.
    #[error("{0}")]
    Validation(String),

    /// No resource with this ID.
    #[error("resource not found: {0}")]
    NotFound(ResourceId),

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResourceError {
    /// Shorthand for a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<rusqlite::Error> for ResourceError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(StoreError::Sqlite(err))
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ResourceError>;
