use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{CatalogError, Result};
use crate::image::ports::{ImageBlobStore, UploadStream};

type Blobs = Arc<RwLock<HashMap<(String, String), Vec<u8>>>>;

/// Process-local blob store for dev mode and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Blobs,
    next_id: Arc<AtomicU64>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, category: &str, id: &str) -> Option<Vec<u8>> {
        self.blobs
            .read()
            .await
            .get(&(category.to_string(), id.to_string()))
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn allocate_id(&self) -> String {
        format!("{:016x}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

struct MemoryUploadStream {
    blobs: Blobs,
    key: (String, String),
    buffer: Vec<u8>,
}

#[async_trait]
impl UploadStream for MemoryUploadStream {
    async fn send(&mut self, chunk: Vec<u8>) -> Result<()> {
        self.buffer.extend_from_slice(&chunk);
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<String> {
        let MemoryUploadStream { blobs, key, buffer } = *self;
        let id = key.1.clone();
        blobs.write().await.insert(key, buffer);
        Ok(id)
    }
}

#[async_trait]
impl ImageBlobStore for MemoryBlobStore {
    async fn start_upload(&self, category: &str) -> Result<Box<dyn UploadStream>> {
        Ok(Box::new(MemoryUploadStream {
            blobs: Arc::clone(&self.blobs),
            key: (category.to_string(), self.allocate_id()),
            buffer: Vec::new(),
        }))
    }

    async fn replace(
        &self,
        category: &str,
        id: &str,
        image: Vec<u8>,
        create_if_not_exist: bool,
    ) -> Result<String> {
        let key = (category.to_string(), id.to_string());
        let mut blobs = self.blobs.write().await;
        if !create_if_not_exist && !blobs.contains_key(&key) {
            return Err(CatalogError::NotFound(format!("image {}/{}", category, id)));
        }
        blobs.insert(key, image);
        Ok(id.to_string())
    }

    async fn delete(&self, category: &str, id: &str) -> Result<()> {
        self.blobs
            .write()
            .await
            .remove(&(category.to_string(), id.to_string()))
            .map(|_| ())
            .ok_or_else(|| CatalogError::NotFound(format!("image {}/{}", category, id)))
    }
}
