//! Schema introspection tools.
//!
//! Handlers for `list_tables`, `get_table_comment`, `get_table_structure`,
//! `get_all_table_info`, and `get_table_detail`.

use crate::db::identifiers::SortDirection;
use crate::db::introspect::Introspector;
use crate::error::ToolResult;
use crate::models::{ColumnDescriptor, DEFAULT_TOP_ROWS_LIMIT, TableDetail, TableOverview};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::info;

/// Input for the get_table_comment tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TableCommentInput {
    /// Name of the table
    pub table_name: String,
}

/// Output from the get_table_comment tool.
#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct TableCommentOutput {
    pub table_name: String,
    /// Table comment, or the no-comment sentinel
    pub comment: String,
}

/// Input for the get_table_structure tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TableStructureInput {
    /// Name of the table
    pub table_name: String,
}

/// Output from the get_table_structure tool.
#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct TableStructureOutput {
    pub table_name: String,
    /// Columns ordered by ordinal position
    pub columns: Vec<ColumnDescriptor>,
    pub count: usize,
}

/// Output from the list_tables tool.
#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct ListTablesOutput {
    /// Base-table names of the configured schema, ordered by name
    pub tables: Vec<String>,
    pub count: usize,
}

/// Output from the get_all_table_info tool.
#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct AllTableInfoOutput {
    /// Per-table comment and row count, keyed by table name
    pub tables: BTreeMap<String, TableOverview>,
    pub count: usize,
}

/// Input for the get_table_detail tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TableDetailInput {
    /// Name of the table
    pub table_name: String,
    /// Sort column for the sampled rows. Defaults to create_time when the
    /// table has one.
    #[serde(default)]
    pub sort_by: Option<String>,
    /// Sort direction: "asc" or "desc". Default: desc
    #[serde(default)]
    pub sort_method: Option<String>,
    /// Number of rows to sample. Default: 10
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Handler for schema introspection tools.
pub struct SchemaToolHandler {
    introspector: Introspector,
}

impl SchemaToolHandler {
    /// Create a new schema tool handler.
    pub fn new(introspector: Introspector) -> Self {
        Self { introspector }
    }

    /// List the base tables of the configured schema.
    pub async fn list_tables(&self) -> ToolResult<ListTablesOutput> {
        let tables = self.introspector.list_tables().await?;
        let count = tables.len();
        info!(count, "Listed tables");
        Ok(ListTablesOutput { tables, count })
    }

    /// Get a table's comment (or the no-comment sentinel).
    pub async fn table_comment(&self, input: TableCommentInput) -> ToolResult<TableCommentOutput> {
        let comment = self.introspector.table_comment(&input.table_name).await?;
        Ok(TableCommentOutput {
            table_name: input.table_name,
            comment,
        })
    }

    /// Get a table's column layout.
    pub async fn table_structure(
        &self,
        input: TableStructureInput,
    ) -> ToolResult<TableStructureOutput> {
        let columns = self.introspector.table_structure(&input.table_name).await?;
        let count = columns.len();
        info!(table = %input.table_name, columns = count, "Described table");
        Ok(TableStructureOutput {
            table_name: input.table_name,
            columns,
            count,
        })
    }

    /// Summarize every table: comment plus row count.
    pub async fn all_table_info(&self) -> ToolResult<AllTableInfoOutput> {
        let tables = self.introspector.all_table_info().await?;
        let count = tables.len();
        info!(count, "Collected table overviews");
        Ok(AllTableInfoOutput { tables, count })
    }

    /// Full report for one table.
    pub async fn table_detail(&self, input: TableDetailInput) -> ToolResult<TableDetail> {
        let sort_method = parse_sort_method(input.sort_method.as_deref())?;
        let limit = input.limit.unwrap_or(DEFAULT_TOP_ROWS_LIMIT);

        let detail = self
            .introspector
            .table_detail(
                &input.table_name,
                input.sort_by.as_deref(),
                sort_method,
                limit,
            )
            .await?;

        info!(
            table = %detail.table_name,
            row_count = detail.row_count,
            sampled = detail.row_top_n.len(),
            "Built table detail"
        );
        Ok(detail)
    }
}

/// Parse an optional sort direction, defaulting to descending.
pub(crate) fn parse_sort_method(sort_method: Option<&str>) -> ToolResult<SortDirection> {
    match sort_method {
        Some(s) => SortDirection::from_str(s),
        None => Ok(SortDirection::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort_method_default() {
        assert_eq!(parse_sort_method(None).unwrap(), SortDirection::Desc);
    }

    #[test]
    fn test_parse_sort_method_explicit() {
        assert_eq!(parse_sort_method(Some("asc")).unwrap(), SortDirection::Asc);
        assert!(parse_sort_method(Some("sideways")).is_err());
    }

    #[test]
    fn test_table_detail_input_deserialization_defaults() {
        let input: TableDetailInput =
            serde_json::from_str(r#"{"table_name": "comments"}"#).unwrap();
        assert_eq!(input.table_name, "comments");
        assert!(input.sort_by.is_none());
        assert!(input.sort_method.is_none());
        assert!(input.limit.is_none());
    }

    #[test]
    fn test_list_tables_output_default_is_empty() {
        let output = ListTablesOutput::default();
        assert!(output.tables.is_empty());
        assert_eq!(output.count, 0);
    }
}
