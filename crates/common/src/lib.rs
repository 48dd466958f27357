/**
 * Revisions of files grouped into buckets.
 * One [`bucket::VersionedBucket`] owns the ordered
 *  revision history of every filename in its namespace.
 */
pub mod bucket;
/**
 * Publish destinations (`scheme://bucket/key`) and the
 *  endpoint/credential resolution for the object-store target.
 */
pub mod publish;
/**
 * Discovery and ownership of buckets over one store
 *  connection, plus export to the local filesystem and
 *  best-effort publish to object storage.
 */
pub mod registry;
/**
 * One stored version of a file, bound to the bucket
 *  that owns it.
 */
pub mod revision;
/**
 * Pure filter/rank layer over candidate revisions.
 *  No I/O; predicate and rank failures are policy here,
 *  not exceptions.
 */
pub mod select;
/**
 * Staged writes: buffer bytes locally, persist a single
 *  revision on finish.
 */
pub mod writer;

pub mod prelude {
    pub use crate::bucket::{BucketError, VersionedBucket};
    pub use crate::publish::{Destination, DestinationError, PublishConfig};
    pub use crate::registry::{NamespaceRegistry, RegistryError};
    pub use crate::revision::Revision;
    pub use crate::select::{select, EvalError, MetadataView, RankKey, Select};
    pub use crate::writer::RevisionWriter;
    pub use blob_store::{BlobStore, BlobStoreError, MemoryBlobStore, Metadata, RevisionId};
    pub use object_store::{MemoryObjectStore, ObjectMetadata, ObjectStoreClient, ObjectStoreError};
}
