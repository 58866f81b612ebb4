//! Generic Connector-Driven Backend
//!
//! Reusable backend engine implementing the uniform file interface against an
//! opaque connector client. Everything backend-specific arrives through
//! configuration: the translated connector keys, the injected implementation
//! name, and the capability set. Specialized adapters embed this engine and
//! override only what their backend kind cannot satisfy.

use crate::backend::{Capability, CapabilitySet, Locations, UnderStorage};
use crate::conf::{keys, MountConfiguration};
use crate::connector::{
    Connector, ConnectorConfig, ConnectorRegistry, StorageReader, StorageWriter, IMPL_KEY,
};
use crate::error::Result;
use crate::uri::StorageUri;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

// =============================================================================
// Generic Engine
// =============================================================================

/// Connector-driven backend engine
///
/// The connector client is resolved from the registry on the first file
/// operation; construction itself performs no I/O. An implementation name
/// nothing registered fails that first operation, not the mount.
pub struct GenericUnderStorage {
    kind: &'static str,
    uri: StorageUri,
    conf: MountConfiguration,
    connector_conf: ConnectorConfig,
    connectors: Arc<ConnectorRegistry>,
    capabilities: CapabilitySet,
    client: OnceCell<Arc<dyn Connector>>,
}

impl GenericUnderStorage {
    /// Create an engine wired to a translated connector configuration
    pub fn new(
        kind: &'static str,
        uri: StorageUri,
        conf: MountConfiguration,
        connector_conf: ConnectorConfig,
        connectors: Arc<ConnectorRegistry>,
        capabilities: CapabilitySet,
    ) -> Self {
        Self {
            kind,
            uri,
            conf,
            connector_conf,
            connectors,
            capabilities,
            client: OnceCell::new(),
        }
    }

    /// The mount's URI
    pub fn uri(&self) -> &StorageUri {
        &self.uri
    }

    /// The mount's layered configuration
    pub fn conf(&self) -> &MountConfiguration {
        &self.conf
    }

    /// Resolve the connector client, constructing it on first use
    async fn client(&self) -> Result<&Arc<dyn Connector>> {
        self.client
            .get_or_try_init(|| async {
                let implementation = self.connector_conf.require(IMPL_KEY)?;
                debug!(
                    backend = self.kind,
                    implementation, "constructing connector client"
                );
                self.connectors.construct(implementation, &self.connector_conf)
            })
            .await
    }
}

#[async_trait]
impl UnderStorage for GenericUnderStorage {
    fn under_fs_type(&self) -> &'static str {
        self.kind
    }

    fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        self.client().await?.exists(path).await
    }

    async fn create(&self, path: &str) -> Result<Box<dyn StorageWriter>> {
        self.client().await?.create(path).await
    }

    async fn open(&self, path: &str) -> Result<Box<dyn StorageReader>> {
        self.client().await?.open(path).await
    }

    async fn delete_file(&self, path: &str) -> Result<bool> {
        self.client().await?.delete(path).await
    }

    async fn block_size_bytes(&self, path: &str) -> Result<u64> {
        if self.capabilities.supports(Capability::NativeBlockSize) {
            self.client().await?.block_size(path).await
        } else {
            self.conf.get_bytes(keys::BLOCK_SIZE_BYTES_DEFAULT)
        }
    }

    async fn file_locations(&self, path: &str) -> Result<Locations> {
        if self.capabilities.supports(Capability::FileLocations) {
            let hosts = self.client().await?.file_locations(path).await?;
            Ok(Locations::Supported(hosts))
        } else {
            debug!(
                backend = self.kind,
                path, "file_locations suppressed: backend does not support location hints"
            );
            Ok(Locations::NotSupported)
        }
    }
}
