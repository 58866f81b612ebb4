//! Local Filesystem Connector
//!
//! Drives `tokio::fs` against a local directory tree. Writes land in a
//! temporary file and are renamed into place on `complete`, so an object is
//! never visible half-written.

use crate::connector::{Connector, ConnectorConfig, StorageReader, StorageWriter};
use crate::error::Result;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Optional root directory every path is resolved under
pub const ROOT_KEY: &str = "local.root";
/// Block size the connector reports, in bytes
pub const BLOCK_SIZE_KEY: &str = "local.block.size.bytes";

const DEFAULT_BLOCK_SIZE: u64 = 4096;

// =============================================================================
// Local Connector
// =============================================================================

/// Connector for the local filesystem
pub struct LocalConnector {
    root: Option<PathBuf>,
    block_size: u64,
}

impl LocalConnector {
    /// Create a connector rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Create a connector from translated configuration
    pub fn from_config(conf: &ConnectorConfig) -> Result<Self> {
        let root = conf.get(ROOT_KEY).map(PathBuf::from);
        let block_size = match conf.get(BLOCK_SIZE_KEY) {
            Some(raw) => raw.parse().map_err(|_| {
                crate::error::Error::Configuration(format!(
                    "{} must be an integer byte count, got '{}'",
                    BLOCK_SIZE_KEY, raw
                ))
            })?,
            None => DEFAULT_BLOCK_SIZE,
        };
        Ok(Self { root, block_size })
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path.trim_start_matches('/')),
            None => PathBuf::from(path),
        }
    }
}

#[async_trait]
impl Connector for LocalConnector {
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(fs::try_exists(self.resolve(path)).await?)
    }

    async fn open(&self, path: &str) -> Result<Box<dyn StorageReader>> {
        let file = fs::File::open(self.resolve(path)).await?;
        Ok(Box::new(LocalReader { file }))
    }

    async fn create(&self, path: &str) -> Result<Box<dyn StorageWriter>> {
        let final_path = self.resolve(path);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp_path = tmp_sibling(&final_path);
        let file = fs::File::create(&tmp_path).await?;

        Ok(Box::new(LocalWriter {
            file,
            tmp_path,
            final_path,
        }))
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        match fs::remove_file(self.resolve(path)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn block_size(&self, _path: &str) -> Result<u64> {
        Ok(self.block_size)
    }

    async fn file_locations(&self, _path: &str) -> Result<Vec<String>> {
        Ok(vec!["localhost".to_string()])
    }
}

/// Temporary sibling path the pending object is written to
fn tmp_sibling(final_path: &Path) -> PathBuf {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    final_path.with_file_name(format!(".{}.tmp.{:x}", name, nanos))
}

// =============================================================================
// Stream Handles
// =============================================================================

struct LocalWriter {
    file: fs::File,
    tmp_path: PathBuf,
    final_path: PathBuf,
}

#[async_trait]
impl StorageWriter for LocalWriter {
    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.file.write_all(buf).await?;
        Ok(())
    }

    async fn complete(mut self: Box<Self>) -> Result<()> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        fs::rename(&self.tmp_path, &self.final_path).await?;
        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<()> {
        drop(self.file);
        match fs::remove_file(&self.tmp_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

struct LocalReader {
    file: fs::File,
}

#[async_trait]
impl StorageReader for LocalReader {
    async fn read_to_end(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        Ok(self.file.read_to_end(buf).await?)
    }
}
