//! Error types for the under-storage layer
//!
//! Provides structured error types for backend selection, configuration
//! layering/translation, and file operations delegated to connectors.

use thiserror::Error;

/// Unified error type for the under-storage layer
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Backend Selection Errors
    // =========================================================================
    #[error("No registered backend matches URI: {uri}")]
    NoMatchingBackend { uri: String },

    #[error("Missing required configuration key: {key}")]
    MissingConfiguration { key: String },

    #[error("Connector implementation not registered: {implementation}")]
    ConnectorUnavailable { implementation: String },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("Invalid storage URI: {0}")]
    UriParse(String),

    #[error("Capacity parse error: {0}")]
    CapacityParse(String),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error prevents the mount from ever becoming usable
    ///
    /// Construction failures are fatal to the mount attempt; per-operation
    /// failures leave the backend instance usable for subsequent calls.
    pub fn is_fatal_to_mount(&self) -> bool {
        matches!(
            self,
            Error::NoMatchingBackend { .. }
                | Error::MissingConfiguration { .. }
                | Error::UriParse(_)
                | Error::Configuration(_)
        )
    }
}

/// Result type alias for the under-storage layer
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NoMatchingBackend {
            uri: "ftp://host/path".into(),
        };
        assert_eq!(
            err.to_string(),
            "No registered backend matches URI: ftp://host/path"
        );

        let err = Error::MissingConfiguration {
            key: "understore.secret.key".into(),
        };
        assert!(err.to_string().contains("understore.secret.key"));
    }

    #[test]
    fn test_fatal_to_mount() {
        assert!(Error::NoMatchingBackend { uri: "x".into() }.is_fatal_to_mount());
        assert!(Error::MissingConfiguration { key: "k".into() }.is_fatal_to_mount());

        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert!(!io.is_fatal_to_mount());
        assert!(!Error::ConnectorUnavailable {
            implementation: "oss-native".into()
        }
        .is_fatal_to_mount());
    }
}
