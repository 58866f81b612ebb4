//! Layered mount configuration
//!
//! Every mount carries a [`MountConfiguration`]: an immutable key/value view
//! built by overlaying precedence tiers. Lookup always returns the value from
//! the highest-precedence tier that defines the key. A key must mean the same
//! logical setting in every tier; tiers only override its value.

use crate::error::{Error, Result};
use std::collections::BTreeMap;

// =============================================================================
// Well-Known Keys
// =============================================================================

/// Generic configuration keys consumed by the under-storage layer
///
/// Backend factories translate these into connector-specific names; callers
/// only ever deal with the generic namespace.
pub mod keys {
    /// Service endpoint address (object-store endpoint, namenode address)
    pub const ENDPOINT: &str = "understore.endpoint";
    /// Access key / account id for backends that authenticate
    pub const ACCESS_KEY: &str = "understore.access.key";
    /// Secret key for backends that authenticate
    pub const SECRET_KEY: &str = "understore.secret.key";
    /// Block size reported for backends with no native notion of blocks
    pub const BLOCK_SIZE_BYTES_DEFAULT: &str = "understore.block.size.bytes.default";
    /// Advanced override of the connector implementation name
    ///
    /// Factories inject their own constant; callers normally never set this.
    pub const CONNECTOR_IMPL: &str = "understore.connector.impl";
}

// =============================================================================
// Source Tiers
// =============================================================================

/// Precedence tier a configuration value came from
///
/// Ordered lowest to highest: process-wide defaults, backend-family defaults,
/// mount-time options supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Source {
    Default,
    BackendDefault,
    MountOption,
}

// =============================================================================
// Mount Configuration
// =============================================================================

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    source: Source,
}

/// Immutable layered configuration scoped to one storage mount
///
/// Constructed once per mount request via [`MountConfigurationBuilder`] and
/// discarded with the backend instance.
#[derive(Debug, Clone)]
pub struct MountConfiguration {
    entries: BTreeMap<String, Entry>,
}

impl MountConfiguration {
    /// Start a builder pre-populated with process-wide defaults
    pub fn builder() -> MountConfigurationBuilder {
        let mut builder = MountConfigurationBuilder {
            entries: BTreeMap::new(),
        };
        builder.set(keys::BLOCK_SIZE_BYTES_DEFAULT, "128MB", Source::Default);
        builder
    }

    /// Build a configuration from mount options only, on top of defaults
    pub fn defaults_with_options<I, K, V>(options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut builder = Self::builder();
        builder.set_all(options, Source::MountOption);
        builder.build()
    }

    /// Look up a key, returning the highest-precedence value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.value.as_str())
    }

    /// Look up a key that must be present
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| Error::MissingConfiguration {
            key: key.to_string(),
        })
    }

    /// Whether the key is defined in any tier
    pub fn is_set(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Tier the effective value of `key` came from
    pub fn source(&self, key: &str) -> Option<Source> {
        self.entries.get(key).map(|e| e.source)
    }

    /// Parse a byte-size value, accepting `B`/`KB`/`MB`/`GB`/`TB` suffixes
    pub fn get_bytes(&self, key: &str) -> Result<u64> {
        let raw = self.require(key)?;
        parse_bytes(raw)
    }

    /// Iterate over every set `(key, value)` pair
    ///
    /// Used by factories to copy set keys into a connector configuration.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, e)| (k.as_str(), e.value.as_str()))
    }

    /// Number of set keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key is set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`MountConfiguration`]
///
/// Writes respect tier precedence: a lower-precedence write never clobbers a
/// higher-precedence value already present; within a tier, the last write wins.
pub struct MountConfigurationBuilder {
    entries: BTreeMap<String, Entry>,
}

impl MountConfigurationBuilder {
    /// Set a single key in the given tier
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>, source: Source) {
        let key = key.into();
        match self.entries.get(&key) {
            Some(existing) if existing.source > source => {}
            _ => {
                self.entries.insert(
                    key,
                    Entry {
                        value: value.into(),
                        source,
                    },
                );
            }
        }
    }

    /// Set every pair from `pairs` in the given tier
    pub fn set_all<I, K, V>(&mut self, pairs: I, source: Source)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in pairs {
            self.set(k, v, source);
        }
    }

    /// Finalize into an immutable configuration
    pub fn build(self) -> MountConfiguration {
        MountConfiguration {
            entries: self.entries,
        }
    }
}

// =============================================================================
// Byte-Size Parsing
// =============================================================================

fn parse_bytes(raw: &str) -> Result<u64> {
    let trimmed = raw.trim();
    let upper = trimmed.to_ascii_uppercase();

    let (digits, multiplier) = if let Some(v) = upper.strip_suffix("TB") {
        (v, 1u64 << 40)
    } else if let Some(v) = upper.strip_suffix("GB") {
        (v, 1u64 << 30)
    } else if let Some(v) = upper.strip_suffix("MB") {
        (v, 1u64 << 20)
    } else if let Some(v) = upper.strip_suffix("KB") {
        (v, 1u64 << 10)
    } else if let Some(v) = upper.strip_suffix('B') {
        (v, 1)
    } else {
        (upper.as_str(), 1)
    };

    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| Error::CapacityParse(format!("'{}' is not a byte size", raw)))?;

    value
        .checked_mul(multiplier)
        .ok_or_else(|| Error::CapacityParse(format!("'{}' overflows u64 bytes", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_precedence_highest_tier_wins() {
        let mut builder = MountConfiguration::builder();
        builder.set("k", "low", Source::Default);
        builder.set("k", "mid", Source::BackendDefault);
        builder.set("k", "high", Source::MountOption);
        let conf = builder.build();

        assert_eq!(conf.get("k"), Some("high"));
        assert_eq!(conf.source("k"), Some(Source::MountOption));
    }

    #[test]
    fn test_lower_tier_never_clobbers() {
        // Insertion order must not matter: write the high tier first.
        let mut builder = MountConfiguration::builder();
        builder.set("k", "high", Source::MountOption);
        builder.set("k", "mid", Source::BackendDefault);
        builder.set("k", "low", Source::Default);
        let conf = builder.build();

        assert_eq!(conf.get("k"), Some("high"));
    }

    #[test]
    fn test_same_tier_last_write_wins() {
        let mut builder = MountConfiguration::builder();
        builder.set("k", "first", Source::MountOption);
        builder.set("k", "second", Source::MountOption);
        let conf = builder.build();

        assert_eq!(conf.get("k"), Some("second"));
    }

    #[test]
    fn test_require_missing_key() {
        let conf = MountConfiguration::builder().build();
        assert_matches!(
            conf.require("understore.no.such.key"),
            Err(Error::MissingConfiguration { key }) if key == "understore.no.such.key"
        );
    }

    #[test]
    fn test_process_default_block_size() {
        let conf = MountConfiguration::builder().build();
        assert_eq!(
            conf.get_bytes(keys::BLOCK_SIZE_BYTES_DEFAULT).unwrap(),
            128 * 1024 * 1024
        );
        assert_eq!(conf.source(keys::BLOCK_SIZE_BYTES_DEFAULT), Some(Source::Default));
    }

    #[test]
    fn test_get_bytes_suffixes() {
        let mut builder = MountConfiguration::builder();
        builder.set("plain", "4096", Source::MountOption);
        builder.set("kb", "4KB", Source::MountOption);
        builder.set("mb", "16mb", Source::MountOption);
        builder.set("gb", "2 GB", Source::MountOption);
        builder.set("bad", "lots", Source::MountOption);
        let conf = builder.build();

        assert_eq!(conf.get_bytes("plain").unwrap(), 4096);
        assert_eq!(conf.get_bytes("kb").unwrap(), 4 * 1024);
        assert_eq!(conf.get_bytes("mb").unwrap(), 16 * 1024 * 1024);
        assert_eq!(conf.get_bytes("gb").unwrap(), 2 * 1024 * 1024 * 1024);
        assert_matches!(conf.get_bytes("bad"), Err(Error::CapacityParse(_)));
    }

    #[test]
    fn test_defaults_with_options() {
        let conf = MountConfiguration::defaults_with_options([
            (keys::ENDPOINT, "oss-cn-hangzhou.aliyuncs.com"),
            (keys::ACCESS_KEY, "AK"),
        ]);

        assert_eq!(conf.get(keys::ENDPOINT), Some("oss-cn-hangzhou.aliyuncs.com"));
        assert_eq!(conf.source(keys::ENDPOINT), Some(Source::MountOption));
        // Process defaults still shine through underneath.
        assert!(conf.is_set(keys::BLOCK_SIZE_BYTES_DEFAULT));
        assert!(!conf.is_set(keys::SECRET_KEY));
    }

    #[test]
    fn test_iter_covers_all_set_keys() {
        let conf = MountConfiguration::defaults_with_options([(keys::ENDPOINT, "e")]);
        let seen: Vec<&str> = conf.iter().map(|(k, _)| k).collect();
        assert!(seen.contains(&keys::ENDPOINT));
        assert!(seen.contains(&keys::BLOCK_SIZE_BYTES_DEFAULT));
        assert_eq!(seen.len(), conf.len());
    }
}
