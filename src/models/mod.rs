//! Data models for the insight MCP server.
//!
//! This module re-exports all model types used throughout the application.

pub mod query;
pub mod schema;

pub use query::{
    ColumnMetadata, DEFAULT_QUERY_TIMEOUT_SECS, DEFAULT_ROW_LIMIT, DEFAULT_TOP_ROWS_LIMIT,
    MAX_ROW_LIMIT, QueryParam, QueryResult,
};
pub use schema::{ColumnDescriptor, DEFAULT_SORT_COLUMN, NO_COMMENT, TableDetail, TableOverview};
