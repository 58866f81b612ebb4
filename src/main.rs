//! Understore
//!
//! Mounts under-storage backends behind the uniform file interface and runs
//! the embedded admin web server for health, status, and metrics.

use clap::Parser;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use understore::{
    AdminWebServer, ConnectorRegistry, Error, MountConfiguration, Result, StorageUri, UnderStorage,
    UnderStorageRegistry, WebServerConfig,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Understore - pluggable under-storage backend layer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Admin web server bind address (port 0 picks an ephemeral port)
    #[arg(long, env = "WEB_ADDR", default_value = "0.0.0.0:8080")]
    web_addr: String,

    /// Storage URIs to mount at startup (e.g. oss://bucket/, file:///data)
    #[arg(long = "mount", value_name = "URI")]
    mounts: Vec<String>,

    /// Mount option as key=value, applied to every startup mount
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    options: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting Understore");
    info!("  Version: {}", understore::VERSION);
    info!("  Admin web server: {}", args.web_addr);

    let options = parse_options(&args.options)?;

    let connectors = Arc::new(ConnectorRegistry::with_defaults());
    let registry = Arc::new(UnderStorageRegistry::with_default_factories(connectors));
    info!("Factories registered: {:?}", registry.factory_names());

    // Startup mounts fail fast: a backend that cannot be constructed must not
    // reach callers.
    for raw in &args.mounts {
        let uri = StorageUri::parse(raw)?;
        let conf = MountConfiguration::defaults_with_options(options.clone());
        let backend = registry.create(&uri, conf)?;
        info!("  Mounted {} as {}", uri, backend.under_fs_type());
    }

    let web_config = WebServerConfig {
        bind_addr: args
            .web_addr
            .parse()
            .map_err(|e| Error::Configuration(format!("Invalid web server address: {}", e)))?,
    };

    let mut server = AdminWebServer::new(web_config, registry);
    server.start().await?;
    info!(
        "Admin endpoints ready on {}:{}",
        server.bind_host(),
        server.local_port().unwrap_or(0)
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| Error::Internal(format!("signal handler error: {}", e)))?;
    info!("Shutdown signal received");

    server.shutdown().await?;
    info!("Understore shutdown complete");
    Ok(())
}

fn parse_options(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| {
                    Error::Configuration(format!("mount option must be KEY=VALUE, got '{}'", pair))
                })
        })
        .collect()
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().expect("static directive"))
        .add_directive("tower=warn".parse().expect("static directive"))
        .add_directive("axum=info".parse().expect("static directive"));

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
