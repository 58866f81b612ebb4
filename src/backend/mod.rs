//! Under-Storage Backends
//!
//! Uniform file-access interface over pluggable remote storage backends:
//! - HDFS: generic connector-driven backend, full capabilities
//! - OSS: specialized adapter reusing the generic engine with translated
//!   configuration keys and selectively disabled capabilities
//! - Local: generic engine over the local-filesystem connector

pub mod generic;
pub mod hdfs;
pub mod local;
pub mod oss;
pub mod registry;

pub use generic::GenericUnderStorage;
pub use hdfs::HdfsUnderStorageFactory;
pub use local::LocalUnderStorageFactory;
pub use oss::{OssUnderStorage, OssUnderStorageFactory};
pub use registry::UnderStorageRegistry;

use crate::conf::MountConfiguration;
use crate::connector::{StorageReader, StorageWriter};
use crate::error::Result;
use crate::uri::StorageUri;
use async_trait::async_trait;
use std::sync::Arc;

// =============================================================================
// Capabilities
// =============================================================================

/// Optional operation a backend may or may not support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Enumerating the physical locations holding a file
    FileLocations,
    /// Querying the connector for a file's native block size
    NativeBlockSize,
}

/// Fixed per-instance set of supported optional operations
///
/// Once an operation is declared unsupported, every call path for it reports
/// the same "not supported" outcome and never reaches the connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySet {
    supported: Vec<Capability>,
}

impl CapabilitySet {
    /// Everything supported; the generic connector-backed engine default
    pub fn full() -> Self {
        Self {
            supported: vec![Capability::FileLocations, Capability::NativeBlockSize],
        }
    }

    /// Object-store profile: no location hints, no native block size
    pub fn object_store() -> Self {
        Self { supported: vec![] }
    }

    /// Whether `capability` is supported
    pub fn supports(&self, capability: Capability) -> bool {
        self.supported.contains(&capability)
    }
}

// =============================================================================
// Location Hints
// =============================================================================

/// Outcome of a file-location query
///
/// `NotSupported` is a first-class advisory outcome, distinguishable from
/// both an empty successful result and an error; callers branch on it to
/// suppress locality optimizations, never to report failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locations {
    /// The backend enumerated the hosts holding the file (possibly none)
    Supported(Vec<String>),
    /// The backend cannot enumerate locations; no locality hint available
    NotSupported,
}

impl Locations {
    /// Whether the backend supports location enumeration
    pub fn is_supported(&self) -> bool {
        matches!(self, Locations::Supported(_))
    }

    /// Location hints, if the backend supports them
    pub fn hints(&self) -> Option<&[String]> {
        match self {
            Locations::Supported(hosts) => Some(hosts),
            Locations::NotSupported => None,
        }
    }
}

// =============================================================================
// UnderStorage Trait
// =============================================================================

/// Uniform file-access contract every backend honors
///
/// One instance per mount; instances are not shared across mounts. Operations
/// delegate to the underlying connector with no retries or recovery, so
/// connector failures surface immediately as [`crate::Error::Io`].
#[async_trait]
pub trait UnderStorage: Send + Sync {
    /// Backend-kind identifier, constant per kind (`"oss"`, `"hdfs"`, ...)
    fn under_fs_type(&self) -> &'static str;

    /// Optional operations this backend supports
    fn capabilities(&self) -> &CapabilitySet;

    /// Whether a file exists at `path`
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Create a file, returning a writer handle
    ///
    /// No partial file is visible to [`exists`](UnderStorage::exists) until
    /// the writer is explicitly finalized.
    async fn create(&self, path: &str) -> Result<Box<dyn StorageWriter>>;

    /// Open a file for reading
    async fn open(&self, path: &str) -> Result<Box<dyn StorageReader>>;

    /// Delete a file; deleting an absent path reports `false`, not an error
    async fn delete_file(&self, path: &str) -> Result<bool>;

    /// Block size for `path`, or the configured default when the backend has
    /// no native notion of block size
    async fn block_size_bytes(&self, path: &str) -> Result<u64>;

    /// Advisory physical locations holding `path`
    async fn file_locations(&self, path: &str) -> Result<Locations>;
}

/// Shared handle to a mounted backend
pub type UnderStorageRef = Arc<dyn UnderStorage>;

// =============================================================================
// Factory Trait
// =============================================================================

/// Constructs a backend instance for URIs it recognizes
///
/// Construction validates required configuration, translates generic keys to
/// connector-specific names, and wires the instance to its URI. It performs
/// no network I/O; the connector client opens lazily on first use.
pub trait UnderStorageFactory: Send + Sync {
    /// Factory name, used for diagnostics
    fn name(&self) -> &'static str;

    /// Whether this factory handles `uri`
    fn supports(&self, uri: &StorageUri) -> bool;

    /// Build a backend for `uri` from the layered configuration
    fn create(&self, uri: &StorageUri, conf: MountConfiguration) -> Result<UnderStorageRef>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_sets() {
        let full = CapabilitySet::full();
        assert!(full.supports(Capability::FileLocations));
        assert!(full.supports(Capability::NativeBlockSize));

        let object = CapabilitySet::object_store();
        assert!(!object.supports(Capability::FileLocations));
        assert!(!object.supports(Capability::NativeBlockSize));
    }

    #[test]
    fn test_locations_sentinel_distinct_from_empty() {
        let empty = Locations::Supported(vec![]);
        assert!(empty.is_supported());
        assert_eq!(empty.hints(), Some(&[][..]));

        let unsupported = Locations::NotSupported;
        assert!(!unsupported.is_supported());
        assert_eq!(unsupported.hints(), None);

        assert_ne!(empty, unsupported);
    }
}
