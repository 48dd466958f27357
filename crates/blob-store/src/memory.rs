use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use crate::error::{BlobStoreError, Result};
use crate::store::{BlobStore, Metadata, RevisionId, RevisionRecord};

/// In-memory blob store.
///
/// Backs the test suites and ephemeral embedding; data is lost when the
/// last handle drops. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    /// bucket name -> revisions in insertion order
    buckets: HashMap<String, Vec<StoredRevision>>,
    /// Global insertion counter, the upload-order tiebreak
    sequence: u64,
    /// Last assigned upload time, to keep timestamps strictly monotonic
    last_upload: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct StoredRevision {
    record: RevisionRecord,
    content: Bytes,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        bucket: &str,
        filename: &str,
        content: Bytes,
        metadata: Metadata,
    ) -> Result<RevisionId> {
        let mut inner = self.inner.write();

        // Upload timestamps must stay strictly monotonic even when the
        // clock does not advance between consecutive writes.
        let now = Utc::now();
        let uploaded_at = match inner.last_upload {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        inner.last_upload = Some(uploaded_at);
        inner.sequence += 1;

        let id = RevisionId::new();
        let record = RevisionRecord {
            id,
            filename: filename.to_string(),
            uploaded_at,
            sequence: inner.sequence,
            metadata,
        };
        inner
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .push(StoredRevision { record, content });

        Ok(id)
    }

    async fn find_by_filename(&self, bucket: &str, filename: &str) -> Result<Vec<RevisionRecord>> {
        let inner = self.inner.read();
        // Insertion order is upload order: put() assigns monotonic
        // timestamps and sequence numbers.
        Ok(inner
            .buckets
            .get(bucket)
            .map(|revisions| {
                revisions
                    .iter()
                    .filter(|stored| stored.record.filename == filename)
                    .map(|stored| stored.record.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn read(&self, bucket: &str, id: RevisionId) -> Result<Bytes> {
        let inner = self.inner.read();
        inner
            .buckets
            .get(bucket)
            .and_then(|revisions| {
                revisions
                    .iter()
                    .find(|stored| stored.record.id == id)
                    .map(|stored| stored.content.clone())
            })
            .ok_or(BlobStoreError::NotFound(id))
    }

    async fn delete_by_id(&self, bucket: &str, id: RevisionId) -> Result<bool> {
        let mut inner = self.inner.write();
        let Some(revisions) = inner.buckets.get_mut(bucket) else {
            return Ok(false);
        };
        let before = revisions.len();
        revisions.retain(|stored| stored.record.id != id);
        Ok(revisions.len() < before)
    }

    async fn exists_by_filename(&self, bucket: &str, filename: &str) -> Result<bool> {
        let inner = self.inner.read();
        Ok(inner
            .buckets
            .get(bucket)
            .is_some_and(|revisions| {
                revisions
                    .iter()
                    .any(|stored| stored.record.filename == filename)
            }))
    }

    async fn list_filenames(&self, bucket: &str) -> Result<Vec<String>> {
        let inner = self.inner.read();
        let names: BTreeSet<String> = inner
            .buckets
            .get(bucket)
            .map(|revisions| {
                revisions
                    .iter()
                    .map(|stored| stored.record.filename.clone())
                    .collect()
            })
            .unwrap_or_default();
        Ok(names.into_iter().collect())
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        let inner = self.inner.read();
        let mut names: Vec<String> = inner.buckets.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
