//! HDFS Backend
//!
//! The generic engine used directly: HDFS is the connector protocol's native
//! filesystem, so no capability is disabled and translation only maps the
//! generic endpoint onto the connector's default-filesystem key.

use crate::backend::{CapabilitySet, GenericUnderStorage, UnderStorageFactory, UnderStorageRef};
use crate::conf::{keys, MountConfiguration};
use crate::connector::{ConnectorConfig, ConnectorRegistry, IMPL_KEY};
use crate::error::Result;
use crate::uri::StorageUri;
use std::sync::Arc;

/// Connector implementation name the factory injects
pub const HDFS_CONNECTOR_IMPL: &str = "hdfs-native";

const KEY_TRANSLATIONS: &[(&str, &str)] = &[(keys::ENDPOINT, "fs.defaultFS")];

fn translate(conf: &MountConfiguration) -> ConnectorConfig {
    let mut connector_conf = ConnectorConfig::new();
    for (key, value) in conf.iter() {
        let translated = KEY_TRANSLATIONS
            .iter()
            .find(|(generic, _)| *generic == key)
            .map(|(_, specific)| *specific)
            .unwrap_or(key);
        connector_conf.set(translated, value);
    }

    let implementation = conf.get(keys::CONNECTOR_IMPL).unwrap_or(HDFS_CONNECTOR_IMPL);
    connector_conf.set(IMPL_KEY, implementation);
    connector_conf
}

// =============================================================================
// HDFS Factory
// =============================================================================

/// Factory for `hdfs://` mounts
pub struct HdfsUnderStorageFactory {
    connectors: Arc<ConnectorRegistry>,
}

impl HdfsUnderStorageFactory {
    /// Create a factory resolving connectors from `connectors`
    pub fn new(connectors: Arc<ConnectorRegistry>) -> Self {
        Self { connectors }
    }
}

impl UnderStorageFactory for HdfsUnderStorageFactory {
    fn name(&self) -> &'static str {
        "hdfs"
    }

    fn supports(&self, uri: &StorageUri) -> bool {
        uri.scheme() == "hdfs"
    }

    fn create(&self, uri: &StorageUri, conf: MountConfiguration) -> Result<UnderStorageRef> {
        let connector_conf = translate(&conf);
        Ok(Arc::new(GenericUnderStorage::new(
            "hdfs",
            uri.clone(),
            conf,
            connector_conf,
            self.connectors.clone(),
            CapabilitySet::full(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::UnderStorage;

    #[test]
    fn test_translation_maps_endpoint() {
        let conf = MountConfiguration::defaults_with_options([(
            keys::ENDPOINT,
            "hdfs://namenode:8020",
        )]);
        let connector_conf = translate(&conf);

        assert_eq!(connector_conf.get("fs.defaultFS"), Some("hdfs://namenode:8020"));
        assert_eq!(connector_conf.get(IMPL_KEY), Some(HDFS_CONNECTOR_IMPL));
        assert_eq!(connector_conf.get(keys::ENDPOINT), None);
    }

    #[test]
    fn test_create_full_capabilities() {
        let factory =
            HdfsUnderStorageFactory::new(Arc::new(ConnectorRegistry::with_defaults()));
        let uri = StorageUri::parse("hdfs://namenode:8020/warehouse").unwrap();
        let backend = factory
            .create(&uri, MountConfiguration::builder().build())
            .unwrap();

        assert_eq!(backend.under_fs_type(), "hdfs");
        assert!(backend
            .capabilities()
            .supports(crate::backend::Capability::FileLocations));
    }
}
