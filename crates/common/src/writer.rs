use std::io::{self, Write};

use bytes::Bytes;

use blob_store::{Metadata, RevisionId};

use crate::bucket::{BucketError, VersionedBucket};

/// Buffers bytes for one new revision and persists them in a single
/// store round-trip on [`finish`](Self::finish).
///
/// Nothing reaches the store until then; dropping the writer discards
/// the staged content. Obtained from
/// [`VersionedBucket::writer`](crate::bucket::VersionedBucket::writer)
/// or [`appender`](crate::bucket::VersionedBucket::appender), which
/// preloads the current HEAD content so writes extend it.
#[derive(Debug)]
pub struct RevisionWriter {
    bucket: VersionedBucket,
    filename: String,
    buffer: Vec<u8>,
}

impl RevisionWriter {
    pub(crate) fn new(bucket: VersionedBucket, filename: &str) -> Self {
        Self {
            bucket,
            filename: filename.to_string(),
            buffer: Vec::new(),
        }
    }

    pub(crate) fn preload(&mut self, content: Bytes) {
        self.buffer = content.to_vec();
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Bytes staged so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Commit the staged bytes as a new revision, with the usual
    /// metadata inheritance unless `bare`.
    pub async fn finish(self, metadata: Metadata, bare: bool) -> Result<RevisionId, BucketError> {
        self.bucket
            .commit(&self.filename, Bytes::from(self.buffer), metadata, bare)
            .await
    }
}

impl Write for RevisionWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
