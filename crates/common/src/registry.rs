use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info};

use blob_store::{BlobStore, BlobStoreError};
use object_store::ObjectStoreClient;

use crate::bucket::VersionedBucket;
use crate::publish::{metadata_headers, Destination, DestinationError, PublishConfig};
use crate::revision::Revision;

/// Discovers and owns the versioned buckets of one store connection.
///
/// Buckets are cached: the first access to a name creates the bucket,
/// and every later access returns the same logical bucket. The registry
/// is the single writer of its cache; buckets borrow the shared store
/// handle for the registry's lifetime.
///
/// [`close`](Self::close) releases the store handle explicitly and is
/// idempotent; dropping the registry closes it as well.
#[derive(Debug)]
pub struct NamespaceRegistry {
    inner: Mutex<Option<Inner>>,
}

#[derive(Debug)]
struct Inner {
    store: Arc<dyn BlobStore>,
    buckets: HashMap<String, VersionedBucket>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The registry was closed; the store handle is gone
    #[error("registry is closed")]
    Closed,
    /// Malformed publish destination, failed fast
    #[error("invalid destination: {0}")]
    InvalidDestination(#[from] DestinationError),
    /// Store failure, propagated unmodified
    #[error("blob store error: {0}")]
    Store(#[from] BlobStoreError),
    /// Local filesystem failure during export
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NamespaceRegistry {
    /// Open a registry over `store`, seeding the bucket cache from the
    /// store's structured bucket enumeration.
    pub async fn open(store: Arc<dyn BlobStore>) -> Result<Self, RegistryError> {
        let names = store.list_buckets().await?;
        let buckets = names
            .into_iter()
            .map(|name| {
                let bucket = VersionedBucket::new(&name, store.clone());
                (name, bucket)
            })
            .collect();
        debug!("opened namespace registry");
        Ok(Self {
            inner: Mutex::new(Some(Inner { store, buckets })),
        })
    }

    fn store(&self) -> Result<Arc<dyn BlobStore>, RegistryError> {
        self.inner
            .lock()
            .as_ref()
            .map(|inner| inner.store.clone())
            .ok_or(RegistryError::Closed)
    }

    /// The bucket bound to `name`, created and cached on first access.
    pub fn bucket(&self, name: &str) -> Result<VersionedBucket, RegistryError> {
        let mut guard = self.inner.lock();
        let inner = guard.as_mut().ok_or(RegistryError::Closed)?;
        let bucket = inner
            .buckets
            .entry(name.to_string())
            .or_insert_with(|| VersionedBucket::new(name, inner.store.clone()));
        Ok(bucket.clone())
    }

    /// True iff a bucket of that name is known to this registry.
    pub fn exists(&self, name: &str) -> bool {
        self.inner
            .lock()
            .as_ref()
            .is_some_and(|inner| inner.buckets.contains_key(name))
    }

    pub fn list(&self) -> Vec<VersionedBucket> {
        self.inner
            .lock()
            .as_ref()
            .map(|inner| inner.buckets.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Release the store handle. Safe to call more than once; every
    /// operation after the first call fails with
    /// [`RegistryError::Closed`].
    pub fn close(&self) {
        if self.inner.lock().take().is_some() {
            debug!("released store connection");
        }
    }

    /// Write a revision's content to the local filesystem.
    ///
    /// A directory target gets the revision's filename appended; any
    /// other target path is written verbatim, overwriting an existing
    /// file. Returns the absolute path written.
    pub async fn export(
        &self,
        revision: &Revision,
        target: impl AsRef<Path>,
    ) -> Result<PathBuf, RegistryError> {
        let store = self.store()?;
        let content = store.read(revision.bucket(), revision.id()).await?;

        let target = target.as_ref();
        let target = if target.is_dir() {
            target.join(revision.filename())
        } else {
            target.to_path_buf()
        };

        tokio::fs::write(&target, &content).await?;
        let absolute = std::path::absolute(&target)?;
        info!(
            bucket = %revision.bucket(),
            filename = %revision.filename(),
            path = %absolute.display(),
            "exported revision"
        );
        Ok(absolute)
    }

    /// Publish a revision to an S3-compatible object store at
    /// `scheme://bucket/key`; an empty key uses the revision's
    /// filename.
    ///
    /// The target is built from `config` (explicit values, then
    /// environment, then local defaults). Upload failures are logged
    /// and reported as `Ok(false)`: publishing is a best-effort side
    /// channel, and the authoritative revision history is never rolled
    /// back over it. A malformed destination fails fast instead.
    pub async fn publish(
        &self,
        revision: &Revision,
        destination: &str,
        config: &PublishConfig,
    ) -> Result<bool, RegistryError> {
        let destination: Destination = destination.parse()?;
        let target = config.resolve();
        self.publish_to(&target, revision, &destination).await
    }

    /// Publish through a caller-supplied object-store client.
    pub async fn publish_to(
        &self,
        client: &dyn ObjectStoreClient,
        revision: &Revision,
        destination: &Destination,
    ) -> Result<bool, RegistryError> {
        let store = self.store()?;
        let content = store.read(revision.bucket(), revision.id()).await?;
        let key = destination.key().unwrap_or_else(|| revision.filename());
        let headers = metadata_headers(revision.metadata());

        match client
            .upload_object(destination.bucket(), key, content, &headers)
            .await
        {
            Ok(()) => {
                info!(bucket = %destination.bucket(), key = %key, "published revision");
                Ok(true)
            }
            Err(err) => {
                error!(bucket = %destination.bucket(), key = %key, %err, "publish failed");
                Ok(false)
            }
        }
    }
}

impl Drop for NamespaceRegistry {
    fn drop(&mut self) {
        self.close();
    }
}
