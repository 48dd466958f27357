use chrono::{DateTime, Utc};

use blob_store::{Metadata, RevisionId, RevisionRecord};

/// One stored version of a file, bound to the bucket that owns it.
///
/// Carries identity, upload order, and metadata; content stays in the
/// store and is fetched lazily through
/// [`VersionedBucket::read`](crate::bucket::VersionedBucket::read) or
/// [`NamespaceRegistry::export`](crate::registry::NamespaceRegistry::export).
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    bucket: String,
    record: RevisionRecord,
}

impl Revision {
    pub(crate) fn new(bucket: &str, record: RevisionRecord) -> Self {
        Self {
            bucket: bucket.to_string(),
            record,
        }
    }

    pub fn id(&self) -> RevisionId {
        self.record.id
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn filename(&self) -> &str {
        &self.record.filename
    }

    /// Store-assigned upload time; the newest revision of a filename is
    /// its HEAD.
    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.record.uploaded_at
    }

    pub fn metadata(&self) -> &Metadata {
        &self.record.metadata
    }
}
