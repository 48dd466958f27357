//! S3-compatible publish target built on [`object_store`].

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{ObjectMetadata, ObjectStoreClient};
use crate::error::{ObjectStoreError, Result};

/// S3-compatible object-storage target (AWS S3, MinIO, ...).
///
/// Holds endpoint and credentials only; publish destinations name the
/// bucket per call, so a bucket-bound client is built for each upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3ObjectStore {
    endpoint: String,
    access_key: String,
    secret_key: String,
    /// Optional region (defaults to "us-east-1")
    region: Option<String>,
}

impl S3ObjectStore {
    pub fn new(endpoint: &str, access_key: &str, secret_key: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            region: None,
        }
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    fn build(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        let builder = AmazonS3Builder::new()
            .with_endpoint(&self.endpoint)
            .with_access_key_id(&self.access_key)
            .with_secret_access_key(&self.secret_key)
            .with_bucket_name(bucket)
            .with_region(self.region.as_deref().unwrap_or("us-east-1"))
            .with_allow_http(self.endpoint.starts_with("http://"));

        Ok(Arc::new(builder.build().map_err(|e| {
            ObjectStoreError::InvalidConfig(e.to_string())
        })?))
    }
}

#[async_trait]
impl ObjectStoreClient for S3ObjectStore {
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        content: Bytes,
        metadata: &ObjectMetadata,
    ) -> Result<()> {
        let store = self.build(bucket)?;

        let mut attributes = Attributes::new();
        for (name, value) in metadata {
            attributes.insert(
                Attribute::Metadata(Cow::Owned(name.clone())),
                value.clone().into(),
            );
        }
        let mut opts = PutOptions::default();
        opts.attributes = attributes;

        let path = ObjectPath::from(key);
        debug!(bucket = %bucket, key = %key, size = content.len(), "uploading object");
        store.put_opts(&path, content.into(), opts).await?;
        Ok(())
    }
}
