//! Stdio transport for the MCP server.
//!
//! Reads JSON-RPC messages from stdin and writes responses to stdout,
//! the standard mode for CLI-based MCP integrations.

use crate::db::{Database, QueryExecutor};
use crate::error::{ToolError, ToolResult};
use crate::mcp::InsightService;
use crate::transport::{Transport, wait_for_signal};
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;
use tracing::info;

/// Stdio transport implementation.
pub struct StdioTransport {
    db: Arc<Database>,
    executor: Arc<QueryExecutor>,
}

impl StdioTransport {
    /// Create a new stdio transport over a connected database.
    pub fn new(db: Arc<Database>, executor: Arc<QueryExecutor>) -> Self {
        Self { db, executor }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> ToolResult<()> {
        info!("Starting MCP server with stdio transport");

        let service = InsightService::new(self.db.clone(), self.executor.clone());

        let transport = stdio();
        let running_service = service.serve(transport).await.map_err(|e| {
            ToolError::internal(format!("Failed to start stdio transport: {}", e))
        })?;

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => {
                        info!("Stdio transport completed normally");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Stdio transport error");
                        return Err(ToolError::internal(format!(
                            "Stdio transport error: {}",
                            e
                        )));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received");
                true
            }
        };

        info!("Closing database connection");
        self.db.close().await;

        if shutdown_requested {
            // tokio::select! cannot interrupt a blocking stdin read, so the
            // process has to exit explicitly
            info!("Exiting process");
            std::process::exit(0);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}
