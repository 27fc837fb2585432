//! Binary storage port - where uploaded files and their thumbnails live.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StorageError;

/// A blob currently held by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub locator: String,
    pub modified_at: DateTime<Utc>,
}

/// Binary store trait - abstraction over blob backends (local disk, in-memory).
#[async_trait]
pub trait BinaryStore: Send + Sync {
    /// Persist `bytes` and return a stable locator.
    async fn store(&self, bytes: &[u8], original_name: &str) -> Result<String, StorageError>;

    /// Render a thumbnail of a stored image and return its locator.
    async fn derive_thumbnail(&self, locator: &str) -> Result<String, StorageError>;

    /// Remove a blob and any thumbnail derived from it.
    /// A missing blob is not an error.
    async fn delete(&self, locator: &str) -> Result<(), StorageError>;

    /// Check whether a blob exists.
    async fn exists(&self, locator: &str) -> Result<bool, StorageError>;

    /// Enumerate every stored blob (thumbnails excluded).
    async fn list_locators(&self) -> Result<Vec<StoredBlob>, StorageError>;
}
