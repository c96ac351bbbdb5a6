//! Transport layer for the MCP server.
//!
//! Two transports expose the same service:
//! - Stdio: standard input/output for CLI integration
//! - HTTP: streamable HTTP for web clients

pub mod http;
pub mod stdio;

pub use http::HttpTransport;
pub use stdio::StdioTransport;

use crate::error::ToolResult;
use std::future::Future;

/// Trait for MCP transport implementations.
pub trait Transport: Send + Sync {
    /// Start the transport and block until it shuts down.
    fn run(&self) -> impl Future<Output = ToolResult<()>> + Send;

    /// Get the name of this transport for logging.
    fn name(&self) -> &'static str;
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
pub(crate) async fn wait_for_signal() {
    use tokio::signal;
    use tracing::info;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
