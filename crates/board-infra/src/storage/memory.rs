//! In-memory binary store - used in tests and ephemeral deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use board_core::error::StorageError;
use board_core::ports::{BinaryStore, StoredBlob};

struct BlobEntry {
    bytes: Vec<u8>,
    stored_at: DateTime<Utc>,
    has_thumbnail: bool,
}

/// Blob store keeping everything in a `HashMap`.
///
/// Thumbnails are recorded as a flag; no pixels are rendered.
/// Note: Data is lost on process restart.
pub struct InMemoryBinaryStore {
    blobs: RwLock<HashMap<String, BlobEntry>>,
}

impl InMemoryBinaryStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Bytes of a stored blob.
    pub async fn get(&self, locator: &str) -> Option<Vec<u8>> {
        self.blobs.read().await.get(locator).map(|e| e.bytes.clone())
    }

    pub async fn has_thumbnail(&self, locator: &str) -> bool {
        self.blobs
            .read()
            .await
            .get(locator)
            .is_some_and(|e| e.has_thumbnail)
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    /// Pretend a blob was stored at `stored_at`.
    pub async fn backdate(&self, locator: &str, stored_at: DateTime<Utc>) {
        if let Some(entry) = self.blobs.write().await.get_mut(locator) {
            entry.stored_at = stored_at;
        }
    }
}

impl Default for InMemoryBinaryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BinaryStore for InMemoryBinaryStore {
    async fn store(&self, bytes: &[u8], original_name: &str) -> Result<String, StorageError> {
        let locator = match original_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
                format!("{}.{}", Uuid::new_v4(), ext.to_ascii_lowercase())
            }
            _ => Uuid::new_v4().to_string(),
        };

        self.blobs.write().await.insert(
            locator.clone(),
            BlobEntry {
                bytes: bytes.to_vec(),
                stored_at: Utc::now(),
                has_thumbnail: false,
            },
        );
        Ok(locator)
    }

    async fn derive_thumbnail(&self, locator: &str) -> Result<String, StorageError> {
        let mut blobs = self.blobs.write().await;
        let entry = blobs
            .get_mut(locator)
            .ok_or_else(|| StorageError::InvalidLocator(locator.to_string()))?;
        entry.has_thumbnail = true;
        Ok(format!("thumb_{}", locator))
    }

    async fn delete(&self, locator: &str) -> Result<(), StorageError> {
        self.blobs.write().await.remove(locator);
        Ok(())
    }

    async fn exists(&self, locator: &str) -> Result<bool, StorageError> {
        Ok(self.blobs.read().await.contains_key(locator))
    }

    async fn list_locators(&self) -> Result<Vec<StoredBlob>, StorageError> {
        Ok(self
            .blobs
            .read()
            .await
            .iter()
            .map(|(locator, entry)| StoredBlob {
                locator: locator.clone(),
                modified_at: entry.stored_at,
            })
            .collect())
    }
}
