//! Admin Web Server
//!
//! Embedded HTTP server for diagnostics: health probes, mount status, and
//! Prometheus metrics. Supports binding to an ephemeral port (port 0) and
//! reports the concrete port actually bound after start.

use crate::backend::UnderStorageRegistry;
use crate::error::{Error, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration for the admin web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Bind address; port 0 requests an ephemeral port
    pub bind_addr: SocketAddr,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".parse().expect("static bind address"),
        }
    }
}

// =============================================================================
// Status Payload
// =============================================================================

/// Response body for `/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub name: String,
    pub version: String,
    pub uptime_secs: i64,
    pub factories: Vec<String>,
}

struct AppState {
    registry: Arc<UnderStorageRegistry>,
    started_at: DateTime<Utc>,
}

// =============================================================================
// Admin Web Server
// =============================================================================

/// Diagnostics web server with explicit start/shutdown lifecycle
pub struct AdminWebServer {
    config: WebServerConfig,
    registry: Arc<UnderStorageRegistry>,
    bound_addr: Option<SocketAddr>,
    shutdown_tx: broadcast::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl AdminWebServer {
    /// Create a server; nothing binds until [`start`](AdminWebServer::start)
    pub fn new(config: WebServerConfig, registry: Arc<UnderStorageRegistry>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            registry,
            bound_addr: None,
            shutdown_tx,
            handle: None,
        }
    }

    /// Bind and start serving
    ///
    /// When the configured port is 0, the kernel assigns a port; the concrete
    /// address is available through [`local_port`](AdminWebServer::local_port)
    /// afterwards.
    pub async fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Err(Error::Internal("admin web server already started".into()));
        }

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        let bound = listener.local_addr()?;
        self.bound_addr = Some(bound);

        if self.config.bind_addr.port() == 0 {
            info!(port = bound.port(), "rebound ephemeral admin port");
        }

        let state = Arc::new(AppState {
            registry: self.registry.clone(),
            started_at: Utc::now(),
        });

        let app = Router::new()
            .route("/healthz", get(healthz))
            .route("/livez", get(healthz))
            .route("/status", get(status))
            .route("/metrics", get(metrics))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!("admin web server error: {}", e);
            }
        });
        self.handle = Some(handle);

        info!("Admin web server started @ {}", bound);
        Ok(())
    }

    /// Hostname/address the server is bound to
    pub fn bind_host(&self) -> String {
        self.bound_addr
            .unwrap_or(self.config.bind_addr)
            .ip()
            .to_string()
    }

    /// Concrete port the server is listening on, once started
    pub fn local_port(&self) -> Option<u16> {
        self.bound_addr.map(|addr| addr.port())
    }

    /// Stop accepting connections and wait for the server task to finish
    pub async fn shutdown(&mut self) -> Result<()> {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.handle.take() {
            handle
                .await
                .map_err(|e| Error::Internal(format!("admin web server task failed: {}", e)))?;
        }
        Ok(())
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn healthz() -> &'static str {
    "ok"
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        name: crate::NAME.to_string(),
        version: crate::VERSION.to_string(),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        factories: state
            .registry
            .factory_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {}", e),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        [("Content-Type", encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio_test::assert_ok;

    async fn started_server() -> AdminWebServer {
        let config = WebServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
        };
        let mut server = AdminWebServer::new(config, Arc::new(UnderStorageRegistry::default()));
        tokio_test::assert_ok!(server.start().await);
        server
    }

    async fn http_get(port: u16, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
            .await
            .unwrap();
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            path
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_ephemeral_port_reported_after_start() {
        let mut server = started_server().await;

        let port = server.local_port().unwrap();
        assert_ne!(port, 0);
        assert_eq!(server.bind_host(), "127.0.0.1");

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_healthz_and_status() {
        let mut server = started_server().await;
        let port = server.local_port().unwrap();

        let health = http_get(port, "/healthz").await;
        assert!(health.starts_with("HTTP/1.1 200"));
        assert!(health.ends_with("ok"));

        let status = http_get(port, "/status").await;
        assert!(status.starts_with("HTTP/1.1 200"));
        assert!(status.contains("\"factories\""));
        assert!(status.contains("oss"));

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_metrics_exposition() {
        let mut server = started_server().await;
        let port = server.local_port().unwrap();

        let metrics = http_get(port, "/metrics").await;
        assert!(metrics.starts_with("HTTP/1.1 200"));

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_double_start_rejected() {
        let mut server = started_server().await;
        assert!(server.start().await.is_err());
        server.shutdown().await.unwrap();
    }
}
