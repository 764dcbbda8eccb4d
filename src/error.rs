use thiserror::Error;

use crate::word::WordId;

/// Rejections raised before a store is touched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WordError {
    #[error("word name must not be empty")]
    EmptyName,
}

/// Errors surfaced by word stores.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] WordError),

    #[error("word {0} not found")]
    NotFound(WordId),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// True when the failure came from the backing store rather than the input.
    /// These are safe to retry; nothing was written.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            StoreError::Sqlite(_) | StoreError::Io(_) | StoreError::Unavailable(_)
        )
    }
}
