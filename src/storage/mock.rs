use super::{public_url, BlobStorage};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockBlobStorage {
    files: Arc<Mutex<HashMap<String, (Vec<u8>, String)>>>,
    base_url: String,
    upload_count: Arc<Mutex<usize>>,
    fail_writes: bool,
}

impl MockBlobStorage {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            base_url: "https://mock-storage.example.com".to_string(),
            upload_count: Arc::new(Mutex::new(0)),
            fail_writes: false,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Make every write fail with a storage error.
    pub fn failing(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    pub fn get_file(&self, key: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(key)
            .map(|(data, _)| data.clone())
    }

    pub fn get_content_type(&self, key: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, content_type)| content_type.clone())
    }

    pub fn get_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for MockBlobStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStorage for MockBlobStorage {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<String> {
        let mut count = self.upload_count.lock().unwrap();
        *count += 1;

        if self.fail_writes {
            return Err(Error::StorageWrite(format!("Mock write failure for {}", key)));
        }

        self.files.lock().unwrap().insert(
            key.to_string(),
            (data.to_vec(), content_type.to_string()),
        );
        Ok(public_url(&self.base_url, key))
    }
}
