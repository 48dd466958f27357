//! Blob store collaborator interface for strata.
//!
//! The versioning core talks to a document-oriented blob store through
//! the [`BlobStore`] trait. The store assigns revision identity and
//! upload order; everything above it only reads, appends, and deletes.
//! [`MemoryBlobStore`] is an in-process implementation for tests and
//! ephemeral embedding.

pub mod error;
pub mod memory;
pub mod store;

pub use error::{BlobStoreError, Result};
pub use memory::MemoryBlobStore;
pub use store::{BlobStore, Metadata, RevisionId, RevisionRecord};
