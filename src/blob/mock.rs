use crate::blob::BlobStore;
use crate::store::DeleteOutcome;
use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct MockBlobStore {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, name: &str, bytes: Vec<u8>) {
        self.blobs.write().await.insert(name.to_string(), bytes);
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }
}

#[async_trait::async_trait]
impl BlobStore for MockBlobStore {
    async fn upload_from_path(&self, name: &str, path: &Path) -> u16 {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                self.put(name, bytes).await;
                201
            }
            Err(_) => 500,
        }
    }

    async fn delete_if_exists(&self, name: &str) -> Result<DeleteOutcome> {
        Ok(match self.blobs.write().await.remove(name) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::Absent,
        })
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.blobs.read().await.contains_key(name))
    }
}
