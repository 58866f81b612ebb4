//! Storage URIs
//!
//! A storage URI addresses an object inside an under-storage backend and
//! selects which backend handles it: `<scheme>://<authority>/<path>`.
//! The scheme picks the factory, the authority is backend-specific
//! (bucket name, cluster alias), the path addresses the object.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parsed storage URI, immutable once constructed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageUri {
    scheme: String,
    authority: String,
    path: String,
}

impl StorageUri {
    /// Parse a URI of the form `scheme://authority/path`
    ///
    /// The path component is optional and defaults to `/`. The authority may
    /// be empty (`file:///tmp/data`).
    pub fn parse(input: &str) -> Result<Self> {
        let (scheme, rest) = input
            .split_once("://")
            .ok_or_else(|| Error::UriParse(format!("missing scheme separator in '{}'", input)))?;

        if scheme.is_empty() {
            return Err(Error::UriParse(format!("empty scheme in '{}'", input)));
        }
        if !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        {
            return Err(Error::UriParse(format!("invalid scheme in '{}'", input)));
        }

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };

        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            authority: authority.to_string(),
            path: path.to_string(),
        })
    }

    /// URI scheme, lowercased (selects the backend kind)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Backend-specific authority (bucket name, cluster alias, ...)
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Path within the backend, always starting with `/`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Rebuild a URI addressing `path` inside the same backend mount
    pub fn join(&self, path: &str) -> Self {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("{}/{}", self.path.trim_end_matches('/'), path)
        };
        Self {
            scheme: self.scheme.clone(),
            authority: self.authority.clone(),
            path,
        }
    }
}

impl fmt::Display for StorageUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.path)
    }
}

impl FromStr for StorageUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_full_uri() {
        let uri = StorageUri::parse("oss://bucket1/data.txt").unwrap();
        assert_eq!(uri.scheme(), "oss");
        assert_eq!(uri.authority(), "bucket1");
        assert_eq!(uri.path(), "/data.txt");
        assert_eq!(uri.to_string(), "oss://bucket1/data.txt");
    }

    #[test]
    fn test_parse_without_path() {
        let uri = StorageUri::parse("hdfs://namenode:8020").unwrap();
        assert_eq!(uri.authority(), "namenode:8020");
        assert_eq!(uri.path(), "/");
    }

    #[test]
    fn test_parse_empty_authority() {
        let uri = StorageUri::parse("file:///tmp/data").unwrap();
        assert_eq!(uri.authority(), "");
        assert_eq!(uri.path(), "/tmp/data");
    }

    #[test]
    fn test_scheme_lowercased() {
        let uri = StorageUri::parse("OSS://Bucket/Key").unwrap();
        assert_eq!(uri.scheme(), "oss");
        // authority and path keep their case
        assert_eq!(uri.authority(), "Bucket");
        assert_eq!(uri.path(), "/Key");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_matches!(StorageUri::parse("no-scheme/path"), Err(Error::UriParse(_)));
        assert_matches!(StorageUri::parse("://host/path"), Err(Error::UriParse(_)));
        assert_matches!(StorageUri::parse("bad scheme://x"), Err(Error::UriParse(_)));
    }

    #[test]
    fn test_join() {
        let uri = StorageUri::parse("oss://bucket1/base").unwrap();
        assert_eq!(uri.join("file.txt").to_string(), "oss://bucket1/base/file.txt");
        assert_eq!(uri.join("/abs.txt").to_string(), "oss://bucket1/abs.txt");
    }
}
