use super::MetadataRepository;
use crate::models::{Metadata, StoredMetadata};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Process-local store. Contents are lost on restart.
#[derive(Clone, Default)]
pub struct InMemoryMetadataRepository {
    records: Arc<Mutex<Vec<StoredMetadata>>>,
}

impl InMemoryMetadataRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic mid-push cannot leave a partial record, so a poisoned lock is
    // still usable.
    fn records(&self) -> MutexGuard<'_, Vec<StoredMetadata>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl MetadataRepository for InMemoryMetadataRepository {
    async fn store(&self, metadata: &Metadata) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();
        let mut records = self.records();
        // The store's clock never runs backwards relative to insertion order.
        let now = Utc::now();
        let timestamp = records
            .last()
            .map_or(now, |last| last.timestamp.max(now));
        records.push(StoredMetadata {
            id: id.clone(),
            timestamp,
            metadata: metadata.clone(),
        });
        tracing::info!("Stored metadata record {}", id);
        Ok(id)
    }

    async fn fetch_latest(&self) -> Result<StoredMetadata> {
        let records = self.records();
        // Later insertions win timestamp ties.
        records
            .iter()
            .enumerate()
            .max_by_key(|(index, record)| (record.timestamp, *index))
            .map(|(_, record)| record.clone())
            .ok_or_else(|| Error::NotFound("No document found".to_string()))
    }
}
