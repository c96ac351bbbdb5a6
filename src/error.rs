//! Error types for the insight MCP server.
//!
//! All fallible operations in the strict toolkit layer return [`ToolResult`].
//! Database errors never cross the MCP tool-call boundary as faults; the
//! agent-facing layer collapses them into tagged empty results (see
//! `tools::Outcome`). The conversions here exist for input validation and for
//! startup failures, which are allowed to propagate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "42S02" for unknown table
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Schema error: {message} (object: {object})")]
    Schema { message: String, object: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u32,
    },

    #[error("Relay error: {message}")]
    Relay { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ToolError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    /// Create a schema error.
    pub fn schema(message: impl Into<String>, object: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
            object: object.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u32) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// Create a relay error.
    pub fn relay(message: impl Into<String>) -> Self {
        Self::Relay {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }
}

/// Convert sqlx errors to ToolError.
impl From<sqlx::Error> for ToolError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => ToolError::connection(
                msg.to_string(),
                "Check the connection settings and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                ToolError::database(
                    db_err.message(),
                    code,
                    "Check the SQL syntax and referenced objects",
                )
            }
            sqlx::Error::RowNotFound => ToolError::database(
                "No rows returned",
                None,
                "Verify the query conditions match existing data",
            ),
            sqlx::Error::PoolTimedOut => ToolError::timeout("connection pool acquire", 30),
            sqlx::Error::PoolClosed => {
                ToolError::connection("Connection pool is closed", "Reconnect to the database")
            }
            sqlx::Error::Io(io_err) => ToolError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => ToolError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => ToolError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                ToolError::schema(format!("Column not found: {}", col), col.to_string())
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => ToolError::internal(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                ToolError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => ToolError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => ToolError::internal("Database worker crashed"),
            _ => ToolError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Pre-stream relay failures (connection refused, non-2xx status) surface
/// as hard errors to the immediate caller.
impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        ToolError::relay(err.to_string())
    }
}

/// Result type alias for toolkit operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Convert ToolError to MCP ErrorData.
///
/// Only input-validation failures travel this path; database errors are
/// collapsed into tagged empty results before reaching the protocol layer.
impl From<ToolError> for rmcp::ErrorData {
    fn from(err: ToolError) -> Self {
        match &err {
            ToolError::InvalidInput { .. } | ToolError::Schema { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), None)
            }
            ToolError::Connection { suggestion, .. } => rmcp::ErrorData::internal_error(
                err.to_string(),
                Some(serde_json::json!({ "suggestion": suggestion })),
            ),
            _ => rmcp::ErrorData::internal_error(err.to_string(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ToolError::connection("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_error_suggestion() {
        let err = ToolError::database("Syntax error", Some("42000".to_string()), "Check syntax");
        assert_eq!(err.suggestion(), Some("Check syntax"));
    }

    #[test]
    fn test_error_retryable() {
        assert!(ToolError::timeout("query", 30).is_retryable());
        assert!(ToolError::connection("err", "sugg").is_retryable());
        assert!(!ToolError::invalid_input("bad table name").is_retryable());
    }

    #[test]
    fn test_invalid_input_maps_to_invalid_params() {
        let err = ToolError::invalid_input("bad input");
        let mcp_err: rmcp::ErrorData = err.into();
        // invalid_params uses -32602
        assert_eq!(mcp_err.code.0, -32602);
    }

    #[test]
    fn test_schema_maps_to_invalid_params() {
        let err = ToolError::schema("Table not found", "users");
        let mcp_err: rmcp::ErrorData = err.into();
        assert_eq!(mcp_err.code.0, -32602);
    }

    #[test]
    fn test_connection_maps_to_internal_error_with_suggestion() {
        let err = ToolError::connection("failed", "try reconnecting");
        let mcp_err: rmcp::ErrorData = err.into();
        assert_eq!(mcp_err.code.0, -32603);
        let data = mcp_err.data.unwrap();
        assert_eq!(data["suggestion"], "try reconnecting");
    }

    #[test]
    fn test_relay_maps_to_internal_error() {
        let err = ToolError::relay("connection refused");
        let mcp_err: rmcp::ErrorData = err.into();
        assert_eq!(mcp_err.code.0, -32603);
    }
}
