//! OSS Backend Adapter
//!
//! Aliyun OSS support built almost entirely out of the generic engine: the
//! factory rewrites generic configuration keys into the connector's `fs.oss.*`
//! names and injects the connector implementation constant; the adapter
//! overrides the two operations object stores cannot satisfy (location hints,
//! native block size) and delegates everything else.

use crate::backend::{
    CapabilitySet, GenericUnderStorage, Locations, UnderStorage, UnderStorageFactory,
    UnderStorageRef,
};
use crate::conf::{keys, MountConfiguration};
use crate::connector::{ConnectorConfig, ConnectorRegistry, StorageReader, StorageWriter, IMPL_KEY};
use crate::error::{Error, Result};
use crate::uri::StorageUri;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Connector implementation name the factory injects
pub const OSS_CONNECTOR_IMPL: &str = "oss-native";

/// Generic keys OSS cannot be mounted without
const REQUIRED_KEYS: &[&str] = &[keys::ENDPOINT, keys::ACCESS_KEY, keys::SECRET_KEY];

/// Declarative generic-key -> connector-key renames
///
/// Keys absent from this table are copied under their generic names.
const KEY_TRANSLATIONS: &[(&str, &str)] = &[
    (keys::ENDPOINT, "fs.oss.endpoint"),
    (keys::ACCESS_KEY, "fs.oss.accessKeyId"),
    (keys::SECRET_KEY, "fs.oss.accessKeySecret"),
];

// =============================================================================
// Key Translation
// =============================================================================

/// Build the OSS connector configuration from the layered mount configuration
///
/// Copies every set key, renaming through [`KEY_TRANSLATIONS`], then injects
/// the connector implementation name (honoring the advanced override key,
/// which callers normally never set).
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

    let implementation = conf.get(keys::CONNECTOR_IMPL).unwrap_or(OSS_CONNECTOR_IMPL);
    connector_conf.set(IMPL_KEY, implementation);
    connector_conf
}

// =============================================================================
// OSS Adapter
// =============================================================================

/// OSS backend: a generic engine with object-store capability overrides
///
/// Stateless delegation over the engine's lazily-opened connector handle.
pub struct OssUnderStorage {
    engine: GenericUnderStorage,
}

impl OssUnderStorage {
    /// Wrap an engine already wired with translated OSS configuration
    fn new(engine: GenericUnderStorage) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl UnderStorage for OssUnderStorage {
    fn under_fs_type(&self) -> &'static str {
        "oss"
    }

    fn capabilities(&self) -> &CapabilitySet {
        self.engine.capabilities()
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        self.engine.exists(path).await
    }

    async fn create(&self, path: &str) -> Result<Box<dyn StorageWriter>> {
        self.engine.create(path).await
    }

    async fn open(&self, path: &str) -> Result<Box<dyn StorageReader>> {
        self.engine.open(path).await
    }

    async fn delete_file(&self, path: &str) -> Result<bool> {
        self.engine.delete_file(path).await
    }

    async fn block_size_bytes(&self, _path: &str) -> Result<u64> {
        // OSS reports object-store block sizes unreliably; use the configured
        // default instead of querying the connector.
        self.engine.conf().get_bytes(keys::BLOCK_SIZE_BYTES_DEFAULT)
    }

    async fn file_locations(&self, path: &str) -> Result<Locations> {
        debug!(path, "file_locations is not supported on OSS mounts");
        Ok(Locations::NotSupported)
    }
}

// =============================================================================
// OSS Factory
// =============================================================================

/// Factory for `oss://` mounts
pub struct OssUnderStorageFactory {
    connectors: Arc<ConnectorRegistry>,
}

impl OssUnderStorageFactory {
    /// Create a factory resolving connectors from `connectors`
    pub fn new(connectors: Arc<ConnectorRegistry>) -> Self {
        Self { connectors }
    }
}

impl UnderStorageFactory for OssUnderStorageFactory {
    fn name(&self) -> &'static str {
        "oss"
    }

    fn supports(&self, uri: &StorageUri) -> bool {
        uri.scheme() == "oss"
    }

    fn create(&self, uri: &StorageUri, conf: MountConfiguration) -> Result<UnderStorageRef> {
        for key in REQUIRED_KEYS {
            if !conf.is_set(key) {
                return Err(Error::MissingConfiguration {
                    key: (*key).to_string(),
                });
            }
        }

        let connector_conf = translate(&conf);
        let engine = GenericUnderStorage::new(
            "oss",
            uri.clone(),
            conf,
            connector_conf,
            self.connectors.clone(),
            CapabilitySet::object_store(),
        );
        Ok(Arc::new(OssUnderStorage::new(engine)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn oss_conf() -> MountConfiguration {
        MountConfiguration::defaults_with_options([
            (keys::ENDPOINT, "oss-cn-hangzhou.aliyuncs.com"),
            (keys::ACCESS_KEY, "AKID"),
            (keys::SECRET_KEY, "SECRET"),
        ])
    }

    fn factory() -> OssUnderStorageFactory {
        OssUnderStorageFactory::new(Arc::new(ConnectorRegistry::with_defaults()))
    }

    #[test]
    fn test_translation_renames_and_injects() {
        let connector_conf = translate(&oss_conf());

        assert_eq!(
            connector_conf.get("fs.oss.endpoint"),
            Some("oss-cn-hangzhou.aliyuncs.com")
        );
        assert_eq!(connector_conf.get("fs.oss.accessKeyId"), Some("AKID"));
        assert_eq!(connector_conf.get("fs.oss.accessKeySecret"), Some("SECRET"));
        assert_eq!(connector_conf.get(IMPL_KEY), Some(OSS_CONNECTOR_IMPL));
        // Untranslated keys are copied under their generic names.
        assert!(connector_conf.get(keys::BLOCK_SIZE_BYTES_DEFAULT).is_some());
        // Generic names do not leak for translated keys.
        assert_eq!(connector_conf.get(keys::ENDPOINT), None);
    }

    #[test]
    fn test_translation_is_deterministic() {
        let conf = oss_conf();
        assert_eq!(translate(&conf), translate(&conf));

        // Independent of other keys present.
        let bigger = MountConfiguration::defaults_with_options([
            (keys::ENDPOINT, "oss-cn-hangzhou.aliyuncs.com"),
            (keys::ACCESS_KEY, "AKID"),
            (keys::SECRET_KEY, "SECRET"),
            ("understore.extra", "x"),
        ]);
        assert_eq!(
            translate(&bigger).get("fs.oss.endpoint"),
            translate(&conf).get("fs.oss.endpoint")
        );
    }

    #[test]
    fn test_missing_configuration_fails_construction() {
        let uri = StorageUri::parse("oss://bucket1/data.txt").unwrap();
        let conf = MountConfiguration::defaults_with_options([
            (keys::ENDPOINT, "oss-cn-hangzhou.aliyuncs.com"),
            (keys::ACCESS_KEY, "AKID"),
        ]);

        assert_matches!(
            factory().create(&uri, conf).err(),
            Some(Error::MissingConfiguration { key }) if key == keys::SECRET_KEY
        );
    }

    #[tokio::test]
    async fn test_oss_backend_type_and_suppressed_locations() {
        let uri = StorageUri::parse("oss://bucket1/data.txt").unwrap();
        let backend = factory().create(&uri, oss_conf()).unwrap();

        assert_eq!(backend.under_fs_type(), "oss");
        // Suppressed before any connector involvement: "oss-native" is not
        // registered, so a connector call would error instead.
        assert_eq!(
            backend.file_locations("/data.txt").await.unwrap(),
            Locations::NotSupported
        );
        assert_eq!(
            backend.block_size_bytes("/data.txt").await.unwrap(),
            128 * 1024 * 1024
        );
    }

    #[tokio::test]
    async fn test_oss_io_requires_registered_connector() {
        let uri = StorageUri::parse("oss://bucket1/data.txt").unwrap();
        let backend = factory().create(&uri, oss_conf()).unwrap();

        assert_matches!(
            backend.exists("/data.txt").await,
            Err(Error::ConnectorUnavailable { implementation }) if implementation == OSS_CONNECTOR_IMPL
        );
    }

    #[tokio::test]
    async fn test_oss_roundtrip_with_connector_override() {
        // The advanced override routes OSS mounts onto any registered client.
        let uri = StorageUri::parse("oss://bucket1/").unwrap();
        let conf = MountConfiguration::defaults_with_options([
            (keys::ENDPOINT, "oss-cn-hangzhou.aliyuncs.com"),
            (keys::ACCESS_KEY, "AKID"),
            (keys::SECRET_KEY, "SECRET"),
            (keys::CONNECTOR_IMPL, "memory"),
        ]);
        let backend = factory().create(&uri, conf).unwrap();

        let mut writer = backend.create("/data.txt").await.unwrap();
        writer.write_all(b"Hello Upload!").await.unwrap();
        writer.complete().await.unwrap();

        assert!(backend.exists("/data.txt").await.unwrap());

        let mut reader = backend.open("/data.txt").await.unwrap();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"Hello Upload!");

        assert!(backend.delete_file("/data.txt").await.unwrap());
        assert!(!backend.delete_file("/data.txt").await.unwrap());
    }
}
