//! Backend Factory Registry
//!
//! Maps a storage URI to the factory that builds its backend. Factories are
//! registered once at construction and evaluated in registration order;
//! the first factory accepting the URI wins, and a URI nothing accepts is an
//! error surfaced to the caller, never silently defaulted.

use crate::backend::{UnderStorage, UnderStorageFactory, UnderStorageRef};
use crate::conf::MountConfiguration;
use crate::connector::ConnectorRegistry;
use crate::error::{Error, Result};
use crate::uri::StorageUri;
use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};
use std::sync::Arc;
use tracing::{debug, info};

lazy_static! {
    static ref MOUNTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "understore_mounts_total",
        "Backend mounts created, by scheme",
        &["scheme"]
    )
    .unwrap();
    static ref MOUNT_FAILURES_TOTAL: IntCounter = register_int_counter!(
        "understore_mount_failures_total",
        "Mount attempts that failed"
    )
    .unwrap();
}

// =============================================================================
// Under-Storage Registry
// =============================================================================

/// Ordered table of backend factories
///
/// Built once before first use and immutable afterwards; lookups are
/// read-only and safe from any number of threads without locking. Concurrent
/// `create` calls for the same URI may race to construct two instances for
/// one logical mount; deduplication is a caller concern.
pub struct UnderStorageRegistry {
    factories: Vec<Arc<dyn UnderStorageFactory>>,
}

impl UnderStorageRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Create a registry with the built-in factories registered
    ///
    /// Registration order: hdfs, oss, local.
    pub fn with_default_factories(connectors: Arc<ConnectorRegistry>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::HdfsUnderStorageFactory::new(
            connectors.clone(),
        )));
        registry.register(Arc::new(super::OssUnderStorageFactory::new(
            connectors.clone(),
        )));
        registry.register(Arc::new(super::LocalUnderStorageFactory::new(connectors)));
        registry
    }

    /// Append a factory; later registrations lose ties to earlier ones
    pub fn register(&mut self, factory: Arc<dyn UnderStorageFactory>) {
        debug!(factory = factory.name(), "registering under-storage factory");
        self.factories.push(factory);
    }

    /// Find the first factory accepting `uri`
    pub fn find(&self, uri: &StorageUri) -> Result<&Arc<dyn UnderStorageFactory>> {
        self.factories
            .iter()
            .find(|factory| factory.supports(uri))
            .ok_or_else(|| Error::NoMatchingBackend {
                uri: uri.to_string(),
            })
    }

    /// Build a backend for `uri`: find the factory and delegate construction
    pub fn create(&self, uri: &StorageUri, conf: MountConfiguration) -> Result<UnderStorageRef> {
        let factory = self.find(uri).inspect_err(|_| {
            MOUNT_FAILURES_TOTAL.inc();
        })?;

        match factory.create(uri, conf) {
            Ok(backend) => {
                MOUNTS_TOTAL.with_label_values(&[uri.scheme()]).inc();
                info!(
                    uri = %uri,
                    backend = backend.under_fs_type(),
                    "mounted under-storage backend"
                );
                Ok(backend)
            }
            Err(e) => {
                MOUNT_FAILURES_TOTAL.inc();
                Err(e)
            }
        }
    }

    /// Names of the registered factories, in registration order
    pub fn factory_names(&self) -> Vec<&'static str> {
        self.factories.iter().map(|f| f.name()).collect()
    }
}

impl Default for UnderStorageRegistry {
    fn default() -> Self {
        Self::with_default_factories(Arc::new(ConnectorRegistry::with_defaults()))
    }
}
