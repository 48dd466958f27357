//! Shared test utilities for the versioning integration tests
#![allow(dead_code)]

use std::sync::Arc;

use common::prelude::*;
use serde_json::Value;

/// Registry over a fresh in-memory store.
pub async fn setup_registry() -> NamespaceRegistry {
    NamespaceRegistry::open(Arc::new(MemoryBlobStore::new()))
        .await
        .unwrap()
}

/// Registry plus a handle on the shared store, for tests that seed the
/// store directly.
pub async fn setup_registry_with_store() -> (NamespaceRegistry, Arc<MemoryBlobStore>) {
    let store = Arc::new(MemoryBlobStore::new());
    let registry = NamespaceRegistry::open(store.clone()).await.unwrap();
    (registry, store)
}

pub fn meta(pairs: &[(&str, Value)]) -> Metadata {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
