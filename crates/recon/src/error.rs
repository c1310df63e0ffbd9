use thiserror::Error;

use crate::model::LocalId;

/// Failure reported by a [`ContentRepository`](crate::store::ContentRepository).
///
/// The reconciler only needs one bit of information from a store error:
/// can the run keep going? See [`StoreError::is_fatal`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced record does not exist.
    #[error("record {0} not found")]
    NotFound(LocalId),
    /// The store refused a single write (bad value, constraint, etc.).
    #[error("write rejected: {0}")]
    Rejected(String),
    /// The store itself is unusable. Every further call would fail too.
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    /// Snapshot file could not be read or written.
    #[error("snapshot IO error: {0}")]
    Io(String),
    /// Snapshot file exists but is not a valid snapshot.
    #[error("snapshot format error: {0}")]
    Format(String),
}

impl StoreError {
    /// Fatal errors abort the run; the rest only fail the current record.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io(_) | Self::Format(_))
    }
}

/// Recoverable failure scoped to one record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record has no stable key")]
    MissingKey,
    #[error("invalid record: {0}")]
    Invalid(String),
    #[error("sub-resource '{resource}' for '{key}' failed: {message}")]
    SubFetch {
        key: String,
        resource: String,
        message: String,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Run-fatal failure. Already-applied writes stay applied.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("content repository failure: {0}")]
    Store(#[source] StoreError),
    #[error("invalid run options: {0}")]
    Options(String),
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// A local export file that cannot be read as a whole.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("malformed export XML: {0}")]
    Xml(String),
    #[error("malformed thumbnail CSV: {0}")]
    Csv(String),
}
