use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::error::Result;

/// String metadata attached to an uploaded object as headers.
pub type ObjectMetadata = BTreeMap<String, String>;

/// Capability an object-storage target must provide: store one object
/// with metadata headers at bucket/key.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        content: Bytes,
        metadata: &ObjectMetadata,
    ) -> Result<()>;
}

/// One object recorded by [`MemoryObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content: Bytes,
    pub metadata: ObjectMetadata,
}

/// In-memory target that records uploads, for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    inner: Arc<RwLock<HashMap<String, HashMap<String, StoredObject>>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The object at bucket/key, if one was uploaded.
    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.inner
            .read()
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
    }

    /// Total objects across all buckets.
    pub fn len(&self) -> usize {
        self.inner.read().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStoreClient for MemoryObjectStore {
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        content: Bytes,
        metadata: &ObjectMetadata,
    ) -> Result<()> {
        self.inner
            .write()
            .entry(bucket.to_string())
            .or_default()
            .insert(
                key.to_string(),
                StoredObject {
                    content,
                    metadata: metadata.clone(),
                },
            );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_and_get() {
        let store = MemoryObjectStore::new();

        let mut metadata = ObjectMetadata::new();
        metadata.insert("author".to_string(), "x".to_string());

        store
            .upload_object("releases", "report.txt", Bytes::from("v1"), &metadata)
            .await
            .unwrap();

        let object = store.get("releases", "report.txt").unwrap();
        assert_eq!(object.content.as_ref(), b"v1");
        assert_eq!(object.metadata.get("author").unwrap(), "x");

        assert_eq!(store.len(), 1);
        assert!(store.get("releases", "missing.txt").is_none());
        assert!(store.get("other", "report.txt").is_none());
    }

    #[tokio::test]
    async fn test_upload_overwrites() {
        let store = MemoryObjectStore::new();

        let metadata = ObjectMetadata::new();
        store
            .upload_object("releases", "report.txt", Bytes::from("v1"), &metadata)
            .await
            .unwrap();
        store
            .upload_object("releases", "report.txt", Bytes::from("v2"), &metadata)
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        let object = store.get("releases", "report.txt").unwrap();
        assert_eq!(object.content.as_ref(), b"v2");
    }
}
