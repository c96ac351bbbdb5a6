//! HTTP transport with Streamable HTTP support for the MCP server.

use crate::db::{Database, QueryExecutor};
use crate::error::{ToolError, ToolResult};
use crate::mcp::InsightService;
use crate::transport::{Transport, wait_for_signal};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Time allowed for open connections to wind down after a shutdown signal.
const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP transport implementation with Streamable HTTP support.
pub struct HttpTransport {
    db: Arc<Database>,
    executor: Arc<QueryExecutor>,
    host: String,
    port: u16,
    /// MCP endpoint path
    endpoint: String,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    pub fn new(
        db: Arc<Database>,
        executor: Arc<QueryExecutor>,
        host: impl Into<String>,
        port: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            db,
            executor,
            host: host.into(),
            port,
            endpoint: endpoint.into(),
        }
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the MCP endpoint path.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    async fn run(&self) -> ToolResult<()> {
        let bind_addr = self.bind_addr();
        info!("Starting MCP server with HTTP transport on {}", bind_addr);

        let db = self.db.clone();
        let executor = self.executor.clone();

        let service = StreamableHttpService::new(
            move || Ok(InsightService::new(db.clone(), executor.clone())),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        // nest_service does not accept the root path; fall back instead
        let app = if self.endpoint == "/" {
            axum::Router::new().fallback_service(service)
        } else {
            axum::Router::new().nest_service(&self.endpoint, service)
        };

        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            ToolError::connection(
                format!("Failed to bind to {}: {}", bind_addr, e),
                "Check that the port is available",
            )
        })?;

        info!(endpoint = %self.endpoint, "MCP endpoint ready");

        let server = axum::serve(listener, app).with_graceful_shutdown(wait_for_signal());

        // SSE connections can keep the server alive past the shutdown
        // signal, so bound the wind-down
        tokio::select! {
            result = server => {
                match result {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => {
                        error!(error = %e, "HTTP server error");
                        return Err(ToolError::internal(format!("HTTP server error: {}", e)));
                    }
                }
            }
            _ = async {
                wait_for_signal().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for connections to close..."
                );
                tokio::time::sleep(GRACEFUL_TIMEOUT).await;
                warn!("Graceful shutdown timeout, forcing exit");
            } => {}
        }

        info!("Closing database connection");
        self.db.close().await;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
