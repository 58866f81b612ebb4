//! Storage connectors
//!
//! A connector is the client protocol a generic backend drives to perform
//! actual I/O. The under-storage layer treats it as opaque: it is constructed
//! from a translated [`ConnectorConfig`] and consulted per operation, with no
//! retries, timeouts, or recovery layered on top.
//!
//! Connector implementations are looked up by name in a [`ConnectorRegistry`],
//! mirroring how the original connector protocol loads client implementations
//! at runtime: an implementation name that nothing registered fails the first
//! file operation, not backend construction.

pub mod local;
pub mod memory;

pub use local::LocalConnector;
pub use memory::MemoryConnector;

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// Connector Configuration
// =============================================================================

/// Key under which factories inject the connector implementation name
pub const IMPL_KEY: &str = "connector.impl";

/// Flat, connector-specific configuration produced by key translation
///
/// Unlike [`crate::conf::MountConfiguration`] this is a single-tier map: the
/// layering has already been resolved by the time keys are translated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectorConfig {
    entries: BTreeMap<String, String>,
}

impl ConnectorConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Look up a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|v| v.as_str())
    }

    /// Look up a key that must be present
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| Error::MissingConfiguration {
            key: key.to_string(),
        })
    }

    /// Iterate over every `(key, value)` pair
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// =============================================================================
// Stream Handles
// =============================================================================

/// Writable stream handle returned by `create`
///
/// Nothing written becomes visible to `exists`/`open` until [`complete`]
/// returns; [`abort`] (or dropping the handle) discards everything written.
///
/// [`complete`]: StorageWriter::complete
/// [`abort`]: StorageWriter::abort
#[async_trait]
pub trait StorageWriter: Send {
    /// Append bytes to the pending object
    async fn write_all(&mut self, buf: &[u8]) -> Result<()>;

    /// Finalize the object, making it visible atomically
    async fn complete(self: Box<Self>) -> Result<()>;

    /// Discard the pending object
    async fn abort(self: Box<Self>) -> Result<()>;
}

/// Readable stream handle returned by `open`
#[async_trait]
pub trait StorageReader: Send {
    /// Read the remainder of the object into `buf`, returning bytes read
    async fn read_to_end(&mut self, buf: &mut Vec<u8>) -> Result<usize>;
}

// =============================================================================
// Connector Trait
// =============================================================================

/// Client protocol a generic backend delegates file operations to
///
/// Thread safety is the connector's own contract; the under-storage layer
/// re-verifies nothing beyond the `Send + Sync` bound.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Whether an object exists at `path`
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Open an object for reading
    async fn open(&self, path: &str) -> Result<Box<dyn StorageReader>>;

    /// Create an object, returning a writer that finalizes explicitly
    async fn create(&self, path: &str) -> Result<Box<dyn StorageWriter>>;

    /// Delete an object; deleting an absent path is a no-op returning `false`
    async fn delete(&self, path: &str) -> Result<bool>;

    /// Native block size for `path`
    async fn block_size(&self, path: &str) -> Result<u64>;

    /// Physical locations holding `path`, as host hints
    async fn file_locations(&self, path: &str) -> Result<Vec<String>>;
}

// =============================================================================
// Connector Registry
// =============================================================================

type ConnectorCtor = Box<dyn Fn(&ConnectorConfig) -> Result<Arc<dyn Connector>> + Send + Sync>;

/// Table of connector constructors, keyed by implementation name
///
/// Built once before first use; embedding processes register additional
/// client implementations (a real OSS or HDFS client) under the names the
/// backend factories inject.
pub struct ConnectorRegistry {
    ctors: BTreeMap<String, ConnectorCtor>,
}

impl ConnectorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            ctors: BTreeMap::new(),
        }
    }

    /// Create a registry with the built-in connectors registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("local", |conf| {
            let connector = LocalConnector::from_config(conf)?;
            Ok(Arc::new(connector) as Arc<dyn Connector>)
        });
        registry.register("memory", |_conf| {
            Ok(Arc::new(MemoryConnector::new()) as Arc<dyn Connector>)
        });
        registry
    }

    /// Register a constructor under an implementation name
    pub fn register<F>(&mut self, name: impl Into<String>, ctor: F)
    where
        F: Fn(&ConnectorConfig) -> Result<Arc<dyn Connector>> + Send + Sync + 'static,
    {
        self.ctors.insert(name.into(), Box::new(ctor));
    }

    /// Construct the connector named by `implementation`
    pub fn construct(
        &self,
        implementation: &str,
        conf: &ConnectorConfig,
    ) -> Result<Arc<dyn Connector>> {
        let ctor = self
            .ctors
            .get(implementation)
            .ok_or_else(|| Error::ConnectorUnavailable {
                implementation: implementation.to_string(),
            })?;
        ctor(conf)
    }

    /// Registered implementation names
    pub fn implementations(&self) -> Vec<&str> {
        self.ctors.keys().map(|k| k.as_str()).collect()
    }
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_defaults_registered() {
        let registry = ConnectorRegistry::with_defaults();
        let impls = registry.implementations();
        assert!(impls.contains(&"local"));
        assert!(impls.contains(&"memory"));
    }

    #[test]
    fn test_unknown_implementation() {
        let registry = ConnectorRegistry::with_defaults();
        let result = registry.construct("oss-native", &ConnectorConfig::new());
        assert_matches!(
            result.err(),
            Some(Error::ConnectorUnavailable { implementation }) if implementation == "oss-native"
        );
    }

    #[test]
    fn test_construct_memory() {
        let registry = ConnectorRegistry::with_defaults();
        assert!(registry.construct("memory", &ConnectorConfig::new()).is_ok());
    }

    #[test]
    fn test_connector_config_roundtrip() {
        let mut conf = ConnectorConfig::new();
        conf.set("fs.oss.endpoint", "oss-cn-hangzhou.aliyuncs.com");
        assert_eq!(conf.get("fs.oss.endpoint"), Some("oss-cn-hangzhou.aliyuncs.com"));
        assert_matches!(
            conf.require("fs.oss.accessKeyId"),
            Err(Error::MissingConfiguration { .. })
        );
    }
}
