//! Persistence for generated metadata records
//!
//! Records are append-only. The store assigns each one an id and a timestamp
//! from its own clock; "latest" means the greatest timestamp.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreRepository;
pub use memory::InMemoryMetadataRepository;

use crate::models::{Metadata, StoredMetadata};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait MetadataRepository: Send + Sync {
    /// Append a record and return its generated id.
    async fn store(&self, metadata: &Metadata) -> Result<String>;

    /// Most recently stored record, or `Error::NotFound` when there is none.
    async fn fetch_latest(&self) -> Result<StoredMetadata>;
}
