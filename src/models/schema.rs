//! Schema-related data models.
//!
//! Types produced by the introspection toolkit. Field names follow the
//! aliases the catalog queries use, so tool output is stable for agents
//! that were built against the original service.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Sentinel returned when a table carries no comment. Distinct from an
/// empty string and from an error.
pub const NO_COMMENT: &str = "无注释";

/// Default sort column for top-row sampling.
pub const DEFAULT_SORT_COLUMN: &str = "create_time";

/// One column of a table, as reported by `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnDescriptor {
    /// Column name
    pub field: String,
    /// Declared type as reported by the catalog (e.g., `varchar`, `bigint`)
    #[serde(rename = "type")]
    pub data_type: String,
    /// Whether the column accepts NULL
    pub nullable: bool,
    /// Declared default value, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Column comment; empty when the column has none
    #[serde(default)]
    pub comment: String,
}

impl ColumnDescriptor {
    /// Create a new column descriptor.
    pub fn new(field: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            field: field.into(),
            data_type: data_type.into(),
            nullable,
            default_value: None,
            comment: String::new(),
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// Set the column comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// Per-table summary used by `get_all_table_info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableOverview {
    /// Table comment, or the no-comment sentinel
    pub comment: String,
    /// Exact row count from `COUNT(*)`
    pub row_count: u64,
}

/// Full per-table report used by `get_table_detail`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TableDetail {
    pub table_name: String,
    /// Table comment, or the no-comment sentinel
    pub comment: String,
    /// Columns ordered by ordinal position
    pub structure: Vec<ColumnDescriptor>,
    pub row_count: u64,
    /// Sampled rows, most recent first under the default sort
    pub row_top_n: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_descriptor_builder() {
        let col = ColumnDescriptor::new("comment_id", "int", false)
            .with_default("0")
            .with_comment("主键");

        assert_eq!(col.field, "comment_id");
        assert!(!col.nullable);
        assert_eq!(col.default_value.as_deref(), Some("0"));
        assert_eq!(col.comment, "主键");
    }

    #[test]
    fn test_column_descriptor_serializes_type_alias() {
        let col = ColumnDescriptor::new("commenter", "varchar", true);
        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(json["type"], "varchar");
        // absent default stays out of the payload
        assert!(json.get("default_value").is_none());
    }

    #[test]
    fn test_sentinel_is_not_empty() {
        assert!(!NO_COMMENT.is_empty());
    }

    #[test]
    fn test_table_detail_default_is_empty() {
        let detail = TableDetail::default();
        assert!(detail.table_name.is_empty());
        assert!(detail.structure.is_empty());
        assert!(detail.row_top_n.is_empty());
        assert_eq!(detail.row_count, 0);
    }
}
