//! Query execution tools.
//!
//! Handlers for `execute_query`, `get_row_count`, and `get_top_rows`.
//! Result rows can be rendered as JSON (default), an ASCII table, or a
//! markdown table for direct inclusion in agent replies.

use crate::db::introspect::Introspector;
use crate::error::ToolResult;
use crate::models::{
    ColumnMetadata, DEFAULT_TOP_ROWS_LIMIT, QueryParam, QueryResult,
};
use crate::tools::schema::parse_sort_method;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::info;
use unicode_width::UnicodeWidthStr;

/// Output format for query results.
#[derive(Debug, Clone, Copy, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format (default)
    #[default]
    Json,
    /// ASCII table format (like the MySQL CLI)
    Table,
    /// Markdown table format
    Markdown,
}

/// Input for the execute_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExecuteQueryInput {
    /// SQL statement to execute. Bind literals with ? placeholders;
    /// identifiers cannot be bound.
    pub sql: String,
    /// Positional parameters for the ? placeholders
    #[serde(default)]
    pub params: Vec<QueryParam>,
    /// Maximum rows to return. Default: 100, max: 10000
    #[serde(default)]
    pub limit: Option<u32>,
    /// Output format: "json", "table", or "markdown"
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output from the execute_query tool.
#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct ExecuteQueryOutput {
    /// Column metadata. Empty if format is table/markdown.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnMetadata>,
    /// Result rows as key-value maps. Empty if format is table/markdown.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    /// Pre-formatted output when format is table or markdown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    /// True if the result was truncated by the limit
    pub truncated: bool,
    pub row_count: usize,
    pub execution_time_ms: u64,
}

impl ExecuteQueryOutput {
    /// Create output from a query result with the requested format.
    pub fn from_result(result: QueryResult, format: OutputFormat) -> Self {
        let row_count = result.rows.len();
        let truncated = result.truncated;
        let execution_time_ms = result.execution_time_ms;

        match format {
            OutputFormat::Json => Self {
                columns: result.columns,
                rows: result.rows,
                formatted: None,
                truncated,
                row_count,
                execution_time_ms,
            },
            OutputFormat::Table => Self {
                columns: Vec::new(),
                rows: Vec::new(),
                formatted: Some(format_as_table(
                    &result.columns,
                    &result.rows,
                    truncated,
                    execution_time_ms,
                )),
                truncated,
                row_count,
                execution_time_ms,
            },
            OutputFormat::Markdown => Self {
                columns: Vec::new(),
                rows: Vec::new(),
                formatted: Some(format_as_markdown(
                    &result.columns,
                    &result.rows,
                    truncated,
                    row_count,
                )),
                truncated,
                row_count,
                execution_time_ms,
            },
        }
    }
}

/// Input for the get_row_count tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RowCountInput {
    /// Name of the table
    pub table_name: String,
}

/// Output from the get_row_count tool.
#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct RowCountOutput {
    pub table_name: String,
    /// Exact COUNT(*) of the table
    pub row_count: u64,
}

/// Input for the get_top_rows tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TopRowsInput {
    /// Name of the table
    pub table_name: String,
    /// Sort column. Defaults to create_time when the table has one.
    #[serde(default)]
    pub sort_by: Option<String>,
    /// Sort direction: "asc" or "desc". Default: desc
    #[serde(default)]
    pub sort_method: Option<String>,
    /// Number of rows to return. Default: 10
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Output from the get_top_rows tool.
#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct TopRowsOutput {
    pub table_name: String,
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    pub count: usize,
}

/// Handler for query execution tools.
pub struct QueryToolHandler {
    introspector: Introspector,
}

impl QueryToolHandler {
    /// Create a new query tool handler.
    pub fn new(introspector: Introspector) -> Self {
        Self { introspector }
    }

    /// Execute arbitrary SQL with optional positional parameters.
    pub async fn execute_query(&self, input: ExecuteQueryInput) -> ToolResult<ExecuteQueryOutput> {
        let result = self
            .introspector
            .execute_query(&input.sql, &input.params, input.limit)
            .await?;

        info!(
            row_count = result.rows.len(),
            truncated = result.truncated,
            execution_time_ms = result.execution_time_ms,
            "Query executed"
        );

        Ok(ExecuteQueryOutput::from_result(result, input.format))
    }

    /// Count the rows of one table.
    pub async fn row_count(&self, input: RowCountInput) -> ToolResult<RowCountOutput> {
        let row_count = self.introspector.row_count(&input.table_name).await?;
        info!(table = %input.table_name, row_count, "Counted rows");
        Ok(RowCountOutput {
            table_name: input.table_name,
            row_count,
        })
    }

    /// Sample the first rows of one table.
    pub async fn top_rows(&self, input: TopRowsInput) -> ToolResult<TopRowsOutput> {
        let sort_method = parse_sort_method(input.sort_method.as_deref())?;
        let limit = input.limit.unwrap_or(DEFAULT_TOP_ROWS_LIMIT);

        let result = self
            .introspector
            .top_rows(&input.table_name, input.sort_by.as_deref(), sort_method, limit)
            .await?;

        let count = result.rows.len();
        info!(table = %input.table_name, count, "Sampled top rows");
        Ok(TopRowsOutput {
            table_name: input.table_name,
            rows: result.rows,
            count,
        })
    }
}

/// Format value for display in a table cell.
fn format_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(arr) => serde_json::to_string(arr).unwrap_or_default(),
        JsonValue::Object(obj) => serde_json::to_string(obj).unwrap_or_default(),
    }
}

/// Format a query result as an ASCII table (MySQL CLI style).
fn format_as_table(
    columns: &[ColumnMetadata],
    rows: &[serde_json::Map<String, JsonValue>],
    truncated: bool,
    execution_time_ms: u64,
) -> String {
    if columns.is_empty() {
        return "Empty set".to_string();
    }

    let mut widths: Vec<usize> = columns.iter().map(|c| c.name.width()).collect();

    for row in rows {
        for (i, col) in columns.iter().enumerate() {
            if let Some(value) = row.get(&col.name) {
                widths[i] = widths[i].max(format_value(value).width());
            }
        }
    }

    let mut output = String::new();

    let separator: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";

    output.push_str(&separator);
    let header: String = columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| format!("| {:^width$} ", col.name, width = w))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);
    output.push_str(&separator);

    for row in rows {
        let row_str: String = columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| {
                let value = row.get(&col.name).cloned().unwrap_or(JsonValue::Null);
                let formatted = format_value(&value);
                // Right-align numbers, left-align others
                if matches!(value, JsonValue::Number(_)) {
                    format!("| {:>width$} ", formatted, width = w)
                } else {
                    format!("| {:<width$} ", formatted, width = w)
                }
            })
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    output.push_str(&separator);

    let row_text = if rows.len() == 1 { "row" } else { "rows" };
    let truncated_text = if truncated { " (truncated)" } else { "" };
    output.push_str(&format!(
        "{} {} in set{} ({:.2} sec)\n",
        rows.len(),
        row_text,
        truncated_text,
        execution_time_ms as f64 / 1000.0
    ));

    output
}

/// Format a query result as a Markdown table.
fn format_as_markdown(
    columns: &[ColumnMetadata],
    rows: &[serde_json::Map<String, JsonValue>],
    truncated: bool,
    row_count: usize,
) -> String {
    if columns.is_empty() {
        return "*Empty set*".to_string();
    }

    let mut output = String::new();

    let header: String = columns
        .iter()
        .map(|c| format!("| {} ", c.name))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);

    let sep: String = columns.iter().map(|_| "|---").collect::<String>() + "|\n";
    output.push_str(&sep);

    for row in rows {
        let row_str: String = columns
            .iter()
            .map(|col| {
                let value = row.get(&col.name).cloned().unwrap_or(JsonValue::Null);
                format!("| {} ", format_value(&value))
            })
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    let truncated_text = if truncated { " *(truncated)*" } else { "" };
    output.push_str(&format!("\n*{} rows*{}", row_count, truncated_text));

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> QueryResult {
        let mut row = serde_json::Map::new();
        row.insert("id".to_string(), JsonValue::Number(1.into()));
        row.insert(
            "commenter".to_string(),
            JsonValue::String("张三".to_string()),
        );

        QueryResult {
            columns: vec![
                ColumnMetadata::new("id", "BIGINT", false),
                ColumnMetadata::new("commenter", "VARCHAR", true),
            ],
            rows: vec![row],
            truncated: false,
            execution_time_ms: 12,
        }
    }

    #[test]
    fn test_execute_query_input_deserialization() {
        let json = r#"{
            "sql": "SELECT * FROM comments WHERE video_id = ?",
            "params": [42],
            "limit": 100
        }"#;

        let input: ExecuteQueryInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.sql, "SELECT * FROM comments WHERE video_id = ?");
        assert_eq!(input.params.len(), 1);
        assert_eq!(input.limit, Some(100));
        assert!(matches!(input.format, OutputFormat::Json));
    }

    #[test]
    fn test_output_json_format_keeps_rows() {
        let output = ExecuteQueryOutput::from_result(sample_result(), OutputFormat::Json);
        assert_eq!(output.row_count, 1);
        assert!(output.formatted.is_none());
        assert_eq!(output.rows.len(), 1);
    }

    #[test]
    fn test_output_table_format() {
        let output = ExecuteQueryOutput::from_result(sample_result(), OutputFormat::Table);
        let formatted = output.formatted.unwrap();
        assert!(formatted.contains("| id"));
        assert!(formatted.contains("张三"));
        assert!(formatted.contains("1 row in set"));
        assert!(output.rows.is_empty());
    }

    #[test]
    fn test_output_markdown_format() {
        let output = ExecuteQueryOutput::from_result(sample_result(), OutputFormat::Markdown);
        let formatted = output.formatted.unwrap();
        assert!(formatted.starts_with("| id "));
        assert!(formatted.contains("|---|---|"));
        assert!(formatted.contains("*1 rows*"));
    }

    #[test]
    fn test_format_empty_set() {
        assert_eq!(format_as_table(&[], &[], false, 0), "Empty set");
        assert_eq!(format_as_markdown(&[], &[], false, 0), "*Empty set*");
    }

    #[test]
    fn test_format_value_variants() {
        assert_eq!(format_value(&JsonValue::Null), "NULL");
        assert_eq!(format_value(&JsonValue::Bool(true)), "true");
        assert_eq!(format_value(&serde_json::json!([1, 2])), "[1,2]");
    }
}
