//! In-Memory Connector
//!
//! Object map backed by DashMap. Writers buffer privately and publish the
//! whole object on `complete`, so readers never observe a partial write.
//! Useful for ephemeral scratch mounts and for exercising backends without
//! touching a real storage service.

use crate::connector::{Connector, ConnectorConfig, StorageReader, StorageWriter};
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::io::ErrorKind;
use std::sync::Arc;

const MEMORY_BLOCK_SIZE: u64 = 64 * 1024;

// =============================================================================
// Memory Connector
// =============================================================================

/// Connector holding objects in process memory
pub struct MemoryConnector {
    objects: Arc<DashMap<String, Bytes>>,
}

impl MemoryConnector {
    /// Create an empty connector
    pub fn new() -> Self {
        Self {
            objects: Arc::new(DashMap::new()),
        }
    }

    /// Create a connector from translated configuration
    pub fn from_config(_conf: &ConnectorConfig) -> Self {
        Self::new()
    }

    /// Number of stored objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.objects.contains_key(path))
    }

    async fn open(&self, path: &str) -> Result<Box<dyn StorageReader>> {
        let bytes = self
            .objects
            .get(path)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    ErrorKind::NotFound,
                    format!("no such object: {}", path),
                ))
            })?;
        Ok(Box::new(MemoryReader { bytes, consumed: false }))
    }

    async fn create(&self, path: &str) -> Result<Box<dyn StorageWriter>> {
        Ok(Box::new(MemoryWriter {
            objects: self.objects.clone(),
            path: path.to_string(),
            buffer: Vec::new(),
        }))
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        Ok(self.objects.remove(path).is_some())
    }

    async fn block_size(&self, _path: &str) -> Result<u64> {
        Ok(MEMORY_BLOCK_SIZE)
    }

    async fn file_locations(&self, _path: &str) -> Result<Vec<String>> {
        // Supported, but memory objects have no placement to hint at.
        Ok(Vec::new())
    }
}

// =============================================================================
// Stream Handles
// =============================================================================

struct MemoryWriter {
    objects: Arc<DashMap<String, Bytes>>,
    path: String,
    buffer: Vec<u8>,
}

#[async_trait]
impl StorageWriter for MemoryWriter {
    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(buf);
        Ok(())
    }

    async fn complete(self: Box<Self>) -> Result<()> {
        self.objects.insert(self.path, Bytes::from(self.buffer));
        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

struct MemoryReader {
    bytes: Bytes,
    consumed: bool,
}

#[async_trait]
impl StorageReader for MemoryReader {
    async fn read_to_end(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        if self.consumed {
            return Ok(0);
        }
        self.consumed = true;
        buf.extend_from_slice(&self.bytes);
        Ok(self.bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_roundtrip() {
        let connector = MemoryConnector::new();

        let mut writer = connector.create("/obj").await.unwrap();
        writer.write_all(b"in memory").await.unwrap();
        writer.complete().await.unwrap();

        let mut reader = connector.open("/obj").await.unwrap();
        let mut buf = Vec::new();
        assert_eq!(reader.read_to_end(&mut buf).await.unwrap(), 9);
        assert_eq!(buf, b"in memory");
    }

    #[tokio::test]
    async fn test_not_visible_before_complete() {
        let connector = MemoryConnector::new();

        let mut writer = connector.create("/obj").await.unwrap();
        writer.write_all(b"pending").await.unwrap();
        assert!(!connector.exists("/obj").await.unwrap());

        writer.complete().await.unwrap();
        assert!(connector.exists("/obj").await.unwrap());
    }

    #[tokio::test]
    async fn test_abort_discards() {
        let connector = MemoryConnector::new();

        let mut writer = connector.create("/obj").await.unwrap();
        writer.write_all(b"discard").await.unwrap();
        writer.abort().await.unwrap();

        assert!(!connector.exists("/obj").await.unwrap());
        assert_eq!(connector.object_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_idempotent() {
        let connector = MemoryConnector::new();

        let mut writer = connector.create("/obj").await.unwrap();
        writer.write_all(b"x").await.unwrap();
        writer.complete().await.unwrap();

        assert!(connector.delete("/obj").await.unwrap());
        assert!(!connector.delete("/obj").await.unwrap());
    }

    #[tokio::test]
    async fn test_locations_supported_but_empty() {
        let connector = MemoryConnector::new();
        assert!(connector.file_locations("/anything").await.unwrap().is_empty());
    }
}
