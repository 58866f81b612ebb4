//! Local-Filesystem Backend
//!
//! `file://` mounts served by the generic engine over the local connector.
//! The mount URI's path becomes the connector's root directory, so backend
//! paths stay relative to the mount the way they do for remote backends.

use crate::backend::{CapabilitySet, GenericUnderStorage, UnderStorageFactory, UnderStorageRef};
use crate::conf::{keys, MountConfiguration};
use crate::connector::{local, ConnectorConfig, ConnectorRegistry, IMPL_KEY};
use crate::error::Result;
use crate::uri::StorageUri;
use std::sync::Arc;

/// Connector implementation name the factory injects
pub const LOCAL_CONNECTOR_IMPL: &str = "local";

fn translate(uri: &StorageUri, conf: &MountConfiguration) -> ConnectorConfig {
    let mut connector_conf = ConnectorConfig::new();
    for (key, value) in conf.iter() {
        connector_conf.set(key, value);
    }

    connector_conf.set(local::ROOT_KEY, uri.path());
    let implementation = conf.get(keys::CONNECTOR_IMPL).unwrap_or(LOCAL_CONNECTOR_IMPL);
    connector_conf.set(IMPL_KEY, implementation);
    connector_conf
}

// =============================================================================
// Local Factory
// =============================================================================

/// Factory for `file://` mounts
pub struct LocalUnderStorageFactory {
    connectors: Arc<ConnectorRegistry>,
}

impl LocalUnderStorageFactory {
    /// Create a factory resolving connectors from `connectors`
    pub fn new(connectors: Arc<ConnectorRegistry>) -> Self {
        Self { connectors }
    }
}

impl UnderStorageFactory for LocalUnderStorageFactory {
    fn name(&self) -> &'static str {
        "local"
    }

    fn supports(&self, uri: &StorageUri) -> bool {
        uri.scheme() == "file"
    }

    fn create(&self, uri: &StorageUri, conf: MountConfiguration) -> Result<UnderStorageRef> {
        let connector_conf = translate(uri, &conf);
        Ok(Arc::new(GenericUnderStorage::new(
            "local",
            uri.clone(),
            conf,
            connector_conf,
            self.connectors.clone(),
            CapabilitySet::full(),
        )))
    }
}
