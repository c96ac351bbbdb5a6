//! Query-related data models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Default row limit for `execute_query` results.
pub const DEFAULT_ROW_LIMIT: u32 = 100;

/// Maximum allowed row limit.
pub const MAX_ROW_LIMIT: u32 = 10000;

/// Default query timeout in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u32 = 30;

/// Default limit for `get_top_rows`.
pub const DEFAULT_TOP_ROWS_LIMIT: u32 = 10;

/// A positional parameter value for parameterized queries.
///
/// Only scalar literals are bindable; identifiers (table and column names)
/// are validated against the catalog and formatted into the SQL text.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum QueryParam {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
}

impl QueryParam {
    /// Check if this parameter is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColumnMetadata {
    pub name: String,
    /// Driver-reported type (e.g., "BIGINT", "VARCHAR")
    pub type_name: String,
    pub nullable: bool,
}

impl ColumnMetadata {
    /// Create new column metadata.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable,
        }
    }
}

/// Result of a query: ordered rows, each a column-name -> value mapping.
/// An empty row set is a valid, non-error result.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct QueryResult {
    pub columns: Vec<ColumnMetadata>,
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    /// True if more rows existed beyond the limit
    pub truncated: bool,
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Create an empty result.
    pub fn empty(execution_time_ms: u64) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            truncated: false,
            execution_time_ms,
        }
    }

    /// Get the number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param_types() {
        assert!(QueryParam::Null.is_null());
        assert!(!QueryParam::Bool(true).is_null());
        assert_eq!(QueryParam::Int(42).type_name(), "int");
        assert_eq!(
            QueryParam::String("hello".to_string()).type_name(),
            "string"
        );
    }

    #[test]
    fn test_query_param_untagged_deserialization() {
        let params: Vec<QueryParam> = serde_json::from_str(r#"[null, 7, "x", true]"#).unwrap();
        assert!(matches!(params[0], QueryParam::Null));
        assert!(matches!(params[1], QueryParam::Int(7)));
        assert!(matches!(params[2], QueryParam::String(_)));
        assert!(matches!(params[3], QueryParam::Bool(true)));
    }

    #[test]
    fn test_query_result_empty() {
        let result = QueryResult::empty(10);
        assert!(result.is_empty());
        assert_eq!(result.row_count(), 0);
        assert!(!result.truncated);
    }
}
