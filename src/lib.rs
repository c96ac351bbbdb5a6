//! Insight MCP Library
//!
//! MySQL introspection tools for AI agents, exposed over MCP, plus the SSE
//! relay client used by the chat front end to stream replies from a running
//! agent service.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod relay;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::ToolError;
pub use mcp::InsightService;
