use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// User-defined revision metadata: string keys mapped to arbitrary
/// scalar or structured JSON values.
///
/// The keys `_historyCount`, `_commitOrder`, and `_id` are reserved for
/// derived fields emitted by the versioning layer.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Opaque revision identity, assigned by the store at write time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct RevisionId(Uuid);

impl RevisionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One stored revision of a file, minus its content.
///
/// Content is fetched lazily through [`BlobStore::read`]; history
/// queries only need the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionRecord {
    pub id: RevisionId,
    pub filename: String,
    /// Store-assigned upload time, monotonically increasing per store.
    pub uploaded_at: DateTime<Utc>,
    /// Store-assigned insertion order; tiebreak for equal timestamps.
    pub sequence: u64,
    pub metadata: Metadata,
}

/// Minimal capability set the versioning core requires from a
/// document-oriented blob store.
///
/// Every call is scoped by bucket name: the store enforces no
/// cross-bucket isolation of its own beyond naming. Implementations
/// must be safe for concurrent reads and writes; timeout policy lives
/// behind this trait, not above it.
#[async_trait]
pub trait BlobStore: Send + Sync + fmt::Debug {
    /// Persist content and metadata as a new revision of `filename`,
    /// returning the store-assigned id.
    async fn put(
        &self,
        bucket: &str,
        filename: &str,
        content: Bytes,
        metadata: Metadata,
    ) -> Result<RevisionId>;

    /// All revisions of `filename`, ascending by upload order.
    async fn find_by_filename(&self, bucket: &str, filename: &str) -> Result<Vec<RevisionRecord>>;

    /// Content of a single revision.
    async fn read(&self, bucket: &str, id: RevisionId) -> Result<Bytes>;

    /// Remove a revision. Returns false if it was already gone.
    async fn delete_by_id(&self, bucket: &str, id: RevisionId) -> Result<bool>;

    /// True iff at least one revision of `filename` exists.
    async fn exists_by_filename(&self, bucket: &str, filename: &str) -> Result<bool>;

    /// Distinct filenames with at least one revision in `bucket`.
    async fn list_filenames(&self, bucket: &str) -> Result<Vec<String>>;

    /// Buckets known to the store, as structured names.
    async fn list_buckets(&self) -> Result<Vec<String>>;
}
