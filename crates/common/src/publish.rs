use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use blob_store::Metadata;
use object_store::{ObjectMetadata, S3ObjectStore};

/// Endpoint used when neither the config nor the environment names one.
const DEFAULT_ENDPOINT: &str = "http://localhost:9000";

const ENDPOINT_VAR: &str = "S3_ENDPOINT";
const ACCESS_KEY_VAR: &str = "AWS_ACCESS_KEY_ID";
const SECRET_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DestinationError {
    #[error("malformed destination URI '{uri}': {reason}")]
    Malformed { uri: String, reason: String },
    #[error("destination '{0}' names no bucket")]
    MissingBucket(String),
}

/// Parsed publish target: `scheme://bucket/key`.
///
/// The scheme is carried by the URI but not interpreted here (the
/// object-store client validates what it talks to); the authority is
/// the target bucket and the path the object key. An empty key falls
/// back to the published revision's filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    bucket: String,
    key: Option<String>,
}

impl Destination {
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

impl FromStr for Destination {
    type Err = DestinationError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(uri).map_err(|e| DestinationError::Malformed {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;

        let bucket = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| DestinationError::MissingBucket(uri.to_string()))?
            .to_string();

        let key = url.path().trim_start_matches('/');
        let key = (!key.is_empty()).then(|| key.to_string());

        Ok(Self { bucket, key })
    }
}

/// Endpoint and credentials for the object-store target of a publish.
///
/// Every field is optional; resolution order is explicit value, then
/// environment (`S3_ENDPOINT`, `AWS_ACCESS_KEY_ID`,
/// `AWS_SECRET_ACCESS_KEY`), then `http://localhost:9000` for the
/// endpoint and empty credentials. The empty-credential default suits
/// local development targets only; production callers must supply real
/// credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishConfig {
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl PublishConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn access_key_id(mut self, access_key_id: &str) -> Self {
        self.access_key_id = Some(access_key_id.to_string());
        self
    }

    pub fn secret_access_key(mut self, secret_access_key: &str) -> Self {
        self.secret_access_key = Some(secret_access_key.to_string());
        self
    }

    /// Resolve into a concrete S3 target.
    pub fn resolve(&self) -> S3ObjectStore {
        let endpoint = self
            .endpoint
            .clone()
            .or_else(|| env::var(ENDPOINT_VAR).ok())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let access_key = self
            .access_key_id
            .clone()
            .or_else(|| env::var(ACCESS_KEY_VAR).ok())
            .unwrap_or_default();
        let secret_key = self
            .secret_access_key
            .clone()
            .or_else(|| env::var(SECRET_KEY_VAR).ok())
            .unwrap_or_default();

        S3ObjectStore::new(&endpoint, &access_key, &secret_key)
    }
}

/// Revision metadata as string object headers: string values go through
/// verbatim, everything else as compact JSON.
pub(crate) fn metadata_headers(metadata: &Metadata) -> ObjectMetadata {
    metadata
        .iter()
        .map(|(key, value)| {
            let header = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            (key.clone(), header)
        })
        .collect()
}
