//! Error types for object-storage targets.

/// Errors reported by an object-storage publish target.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    /// Upload rejected or failed by the backing store
    #[error("object storage error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// Invalid target configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for object-storage operations.
pub type Result<T> = std::result::Result<T, ObjectStoreError>;
