//! Understore - Under-Storage Integration Layer
//!
//! Plugs remote storage backends (object stores, distributed filesystems)
//! behind one uniform file-access interface. A registry picks the backend
//! for a storage URI, a factory merges layered configuration into a
//! connector-specific configuration, and specialized backends reuse the
//! generic engine with translated keys and selectively disabled capabilities.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                            Caller                                   │
//! │        StorageUri ──► UnderStorageRegistry ──► Factory              │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                    Uniform UnderStorage Interface                   │
//! │  ┌───────────────┐  ┌─────────────────────┐  ┌───────────────────┐  │
//! │  │     HDFS      │  │        OSS          │  │       Local       │  │
//! │  │ (generic      │  │ (adapter: key       │  │ (generic engine,  │  │
//! │  │  engine)      │  │  translation +      │  │  local connector) │  │
//! │  │               │  │  capability gates)  │  │                   │  │
//! │  └───────┬───────┘  └──────────┬──────────┘  └─────────┬─────────┘  │
//! ├──────────┼─────────────────────┼───────────────────────┼────────────┤
//! │          └──────────► Connector Registry ◄─────────────┘            │
//! │              (named client implementations, lazy open)              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`backend`]: uniform interface, generic engine, adapters, registry
//! - [`connector`]: opaque client protocol and built-in implementations
//! - [`conf`]: layered mount configuration
//! - [`uri`]: storage URI parsing
//! - [`web`]: embedded admin web server
//! - [`error`]: error types and handling

pub mod backend;
pub mod conf;
pub mod connector;
pub mod error;
pub mod uri;
pub mod web;

// Re-export commonly used types
pub use backend::{
    Capability, CapabilitySet, GenericUnderStorage, HdfsUnderStorageFactory,
    LocalUnderStorageFactory, Locations, OssUnderStorage, OssUnderStorageFactory, UnderStorage,
    UnderStorageFactory, UnderStorageRef, UnderStorageRegistry,
};

pub use conf::{keys, MountConfiguration, MountConfigurationBuilder, Source};

pub use connector::{
    Connector, ConnectorConfig, ConnectorRegistry, LocalConnector, MemoryConnector, StorageReader,
    StorageWriter,
};

pub use error::{Error, Result};

pub use uri::StorageUri;

pub use web::{AdminWebServer, WebServerConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
