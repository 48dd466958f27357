use std::sync::Arc;

use bytes::Bytes;
use serde_json::{json, Value};
use tracing::debug;

use blob_store::{BlobStore, BlobStoreError, Metadata, RevisionId};

use crate::revision::Revision;
use crate::select::{select, Select};
use crate::writer::RevisionWriter;

/// All revisions of files under one logical namespace.
///
/// A bucket borrows the registry's shared store handle and scopes every
/// query by its name; the underlying store enforces no cross-bucket
/// isolation beyond naming. Histories are append-only: a commit never
/// touches existing revisions.
#[derive(Debug, Clone)]
pub struct VersionedBucket {
    name: String,
    store: Arc<dyn BlobStore>,
}

#[derive(Debug, thiserror::Error)]
pub enum BucketError {
    /// No revision of the filename exists
    #[error("no revision of '{0}'")]
    NotFound(String),
    /// A version index pointed outside the filename's history
    #[error("version {version} out of range for '{filename}' with {count} revisions")]
    VersionOutOfRange {
        filename: String,
        version: i64,
        count: usize,
    },
    /// Store failure, propagated unmodified
    #[error("blob store error: {0}")]
    Store(#[from] BlobStoreError),
}

impl VersionedBucket {
    pub(crate) fn new(name: &str, store: Arc<dyn BlobStore>) -> Self {
        Self {
            name: name.to_string(),
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True iff at least one revision of `filename` exists.
    pub async fn exists(&self, filename: &str) -> Result<bool, BucketError> {
        Ok(self.store.exists_by_filename(&self.name, filename).await?)
    }

    /// Every revision of `filename`, filtered and ordered by `query`.
    ///
    /// The full history is fetched and ranked in memory: per-filename
    /// revision counts are histories, not bulk data. Every call is a
    /// fresh fetch, so reads observe the caller's own writes.
    pub async fn find(
        &self,
        filename: &str,
        query: &Select<'_>,
    ) -> Result<Vec<Revision>, BucketError> {
        let records = self.store.find_by_filename(&self.name, filename).await?;
        let revisions = records
            .into_iter()
            .map(|record| Revision::new(&self.name, record))
            .collect();
        Ok(select(revisions, query))
    }

    /// The single best match for `query`, or `None`.
    pub async fn find_one(
        &self,
        filename: &str,
        query: &Select<'_>,
    ) -> Result<Option<Revision>, BucketError> {
        Ok(self.find(filename, query).await?.into_iter().next())
    }

    /// Resolve a signed version index: -1 is HEAD, -2 the revision
    /// before it, and a non-negative index is the absolute
    /// chronological position (0 = oldest).
    pub async fn head(&self, filename: &str, version: i64) -> Result<Revision, BucketError> {
        let mut records = self.store.find_by_filename(&self.name, filename).await?;
        if records.is_empty() {
            return Err(BucketError::NotFound(filename.to_string()));
        }

        let count = records.len();
        let index = if version < 0 {
            (count as i64).checked_add(version)
        } else {
            Some(version)
        };
        let index = match index {
            Some(index) if index >= 0 && (index as usize) < count => index as usize,
            _ => {
                return Err(BucketError::VersionOutOfRange {
                    filename: filename.to_string(),
                    version,
                    count,
                })
            }
        };

        let record = records.swap_remove(index);
        Ok(Revision::new(&self.name, record))
    }

    /// Append a new revision of `filename`.
    ///
    /// Unless `bare`, the new metadata is the prior HEAD's metadata
    /// overlaid with `metadata` (the caller wins per key), so commits
    /// only need to name changed fields. Not atomic against a
    /// concurrent delete of the same filename: the inherited HEAD may
    /// be removed before the new revision lands, and the last write
    /// wins at the store.
    pub async fn commit(
        &self,
        filename: &str,
        content: Bytes,
        metadata: Metadata,
        bare: bool,
    ) -> Result<RevisionId, BucketError> {
        let metadata = if bare {
            metadata
        } else {
            match self.find_one(filename, &Select::default()).await? {
                Some(head) => {
                    let mut merged = head.metadata().clone();
                    merged.extend(metadata);
                    merged
                }
                None => metadata,
            }
        };

        let id = self
            .store
            .put(&self.name, filename, content, metadata)
            .await?;
        debug!(bucket = %self.name, filename = %filename, id = %id, "committed revision");
        Ok(id)
    }

    /// Drop the `count` most recent revisions of `filename`. Sugar over
    /// [`delete`](Self::delete) with the default newest-first order.
    /// Returns the number actually removed, which may be less than
    /// `count`.
    pub async fn revert(&self, filename: &str, count: usize) -> Result<usize, BucketError> {
        self.delete(filename, &Select::default().limit(count)).await
    }

    /// Permanently remove every revision of `filename` matched by
    /// `query`, resolved through the same logic as
    /// [`find`](Self::find).
    ///
    /// The query's limit bounds how many go; an unbounded query removes
    /// every match. Returns the number actually removed.
    pub async fn delete(&self, filename: &str, query: &Select<'_>) -> Result<usize, BucketError> {
        let targets = self.find(filename, query).await?;
        let mut removed = 0;
        for revision in &targets {
            if self.store.delete_by_id(&self.name, revision.id()).await? {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(bucket = %self.name, filename = %filename, removed, "deleted revisions");
        }
        Ok(removed)
    }

    /// Total revisions of `filename`, unfiltered.
    pub async fn count(&self, filename: &str) -> Result<usize, BucketError> {
        Ok(self
            .store
            .find_by_filename(&self.name, filename)
            .await?
            .len())
    }

    /// Metadata of the revision `version` resolves to, augmented with
    /// `_historyCount` (total revisions of the filename) and
    /// `_commitOrder` (the revision's absolute chronological index), so
    /// a caller holding a negative version reference can recover "the
    /// Nth commit out of M".
    pub async fn info(&self, filename: &str, version: i64) -> Result<Metadata, BucketError> {
        let revision = self.head(filename, version).await?;
        let count = self.count(filename).await?;

        let commit_order = if version < 0 {
            count as i64 + version
        } else {
            version
        };

        let mut metadata = revision.metadata().clone();
        metadata.insert("_historyCount".to_string(), json!(count));
        metadata.insert("_commitOrder".to_string(), json!(commit_order));
        Ok(metadata)
    }

    /// All revisions of `filename`, newest first, each projected to
    /// `{_id, ...metadata}`.
    pub async fn history(&self, filename: &str) -> Result<Vec<Metadata>, BucketError> {
        let revisions = self.find(filename, &Select::default()).await?;
        Ok(revisions
            .into_iter()
            .map(|revision| {
                let mut entry = revision.metadata().clone();
                entry.insert("_id".to_string(), Value::String(revision.id().to_string()));
                entry
            })
            .collect())
    }

    /// Fetch a revision's content from the store.
    pub async fn read(&self, revision: &Revision) -> Result<Bytes, BucketError> {
        Ok(self.store.read(&self.name, revision.id()).await?)
    }

    /// Distinct filenames with at least one revision in this bucket.
    pub async fn filenames(&self) -> Result<Vec<String>, BucketError> {
        Ok(self.store.list_filenames(&self.name).await?)
    }

    /// Stage a new revision of `filename`: bytes written to the
    /// returned writer stay local until
    /// [`finish`](RevisionWriter::finish).
    pub fn writer(&self, filename: &str) -> RevisionWriter {
        RevisionWriter::new(self.clone(), filename)
    }

    /// Stage a revision whose content extends the current HEAD's.
    pub async fn appender(&self, filename: &str) -> Result<RevisionWriter, BucketError> {
        let mut writer = RevisionWriter::new(self.clone(), filename);
        if let Some(head) = self.find_one(filename, &Select::default()).await? {
            writer.preload(self.read(&head).await?);
        }
        Ok(writer)
    }
}
