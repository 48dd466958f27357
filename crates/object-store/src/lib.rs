//! Object-storage publish targets for strata.
//!
//! Revision history lives authoritatively in the blob store; publishing
//! copies a single revision out to an S3-compatible object store as a
//! best-effort side channel. This crate holds the [`ObjectStoreClient`]
//! capability trait, the [`S3ObjectStore`] target built on the
//! `object_store` crate, and [`MemoryObjectStore`] for tests.

pub mod client;
pub mod error;
pub mod s3;

pub use client::{MemoryObjectStore, ObjectMetadata, ObjectStoreClient, StoredObject};
pub use error::{ObjectStoreError, Result};
pub use s3::S3ObjectStore;
