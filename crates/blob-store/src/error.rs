//! Error types for the blob store.

use crate::store::RevisionId;

/// Errors that can occur when working with the blob store.
///
/// Connectivity failures are surfaced unmodified to callers; retry and
/// backoff policy belong to the store implementation, not the layers
/// above it.
#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    /// Revision not found
    #[error("revision not found: {0}")]
    NotFound(RevisionId),

    /// Store unreachable or the connection was lost
    #[error("connection error: {0}")]
    Connection(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Opaque backend error
    #[error("backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Result type alias for blob store operations.
pub type Result<T> = std::result::Result<T, BlobStoreError>;
