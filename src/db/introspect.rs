//! Schema introspection over one MySQL database.
//!
//! This is the strict core of the tool surface: every operation returns
//! `ToolResult` and database failures propagate as typed errors. The
//! agent-facing layer in `tools` decides how failures are presented.
//!
//! # Architecture
//!
//! Catalog queries live in the `queries` submodule as constants. Scalar
//! literals (schema name, table-name filters, limits) are always bound;
//! identifiers are resolved through `identifiers` before interpolation.

use crate::db::executor::QueryExecutor;
use crate::db::identifiers::{self, SortDirection, quote_ident};
use crate::db::pool::Database;
use crate::db::types::{get_optional_string, get_string};
use crate::error::ToolResult;
use crate::models::{
    ColumnDescriptor, DEFAULT_SORT_COLUMN, NO_COMMENT, QueryParam, QueryResult, TableDetail,
    TableOverview,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

mod queries {
    pub const LIST_TABLES: &str = r#"
        SELECT CONVERT(TABLE_NAME USING utf8) AS TABLE_NAME
        FROM information_schema.tables
        WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'
        ORDER BY TABLE_NAME
        "#;

    pub const TABLE_COMMENT: &str = r#"
        SELECT CONVERT(TABLE_COMMENT USING utf8) AS TABLE_COMMENT
        FROM information_schema.tables
        WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
        "#;

    pub const TABLE_COLUMNS: &str = r#"
        SELECT
            CONVERT(COLUMN_NAME USING utf8) AS COLUMN_NAME,
            CONVERT(DATA_TYPE USING utf8) AS DATA_TYPE,
            CONVERT(IS_NULLABLE USING utf8) AS IS_NULLABLE,
            CONVERT(COLUMN_DEFAULT USING utf8) AS COLUMN_DEFAULT,
            CONVERT(COLUMN_COMMENT USING utf8) AS COLUMN_COMMENT
        FROM information_schema.columns
        WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
        ORDER BY ORDINAL_POSITION
        "#;
}

/// Build the sampling query. The table and optional sort column must
/// already be catalog-resolved; the limit is bound by the caller.
fn top_rows_sql(table: &str, sort: Option<(&str, SortDirection)>) -> String {
    match sort {
        Some((column, direction)) => format!(
            "SELECT * FROM {} ORDER BY {} {} LIMIT ?",
            quote_ident(table),
            quote_ident(column),
            direction.as_sql()
        ),
        None => format!("SELECT * FROM {} LIMIT ?", quote_ident(table)),
    }
}

fn count_sql(table: &str) -> String {
    format!("SELECT COUNT(*) AS count FROM {}", quote_ident(table))
}

/// The introspection toolkit: a fixed set of operations an agent is allowed
/// to run against the configured database.
#[derive(Clone)]
pub struct Introspector {
    db: Arc<Database>,
    executor: Arc<QueryExecutor>,
}

impl Introspector {
    /// Create a new introspector over a connected database.
    pub fn new(db: Arc<Database>, executor: Arc<QueryExecutor>) -> Self {
        Self { db, executor }
    }

    /// Get the database behind this introspector.
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// List base-table names of the configured schema, ordered by name.
    pub async fn list_tables(&self) -> ToolResult<Vec<String>> {
        let rows = sqlx::query(queries::LIST_TABLES)
            .bind(self.db.schema())
            .fetch_all(self.db.pool())
            .await?;

        let tables: Vec<String> = rows
            .iter()
            .map(|row| get_string(row, "TABLE_NAME"))
            .filter(|name| !name.is_empty())
            .collect();

        debug!(count = tables.len(), schema = self.db.schema(), "Listed tables");
        Ok(tables)
    }

    /// Get a table's comment.
    ///
    /// A missing table or an empty comment both yield the no-comment
    /// sentinel - never an error, never an empty string.
    pub async fn table_comment(&self, table: &str) -> ToolResult<String> {
        let row = sqlx::query(queries::TABLE_COMMENT)
            .bind(self.db.schema())
            .bind(table)
            .fetch_optional(self.db.pool())
            .await?;

        let comment = row
            .and_then(|row| get_optional_string(&row, "TABLE_COMMENT"))
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| NO_COMMENT.to_string());

        Ok(comment)
    }

    /// Get a table's columns, ordered by ordinal position.
    pub async fn table_structure(&self, table: &str) -> ToolResult<Vec<ColumnDescriptor>> {
        let rows = sqlx::query(queries::TABLE_COLUMNS)
            .bind(self.db.schema())
            .bind(table)
            .fetch_all(self.db.pool())
            .await?;

        if rows.is_empty() {
            return Err(crate::error::ToolError::schema(
                format!("Table '{}' not found in schema '{}'", table, self.db.schema()),
                table.to_string(),
            ));
        }

        let columns = rows
            .iter()
            .map(|row| {
                let mut col = ColumnDescriptor::new(
                    get_string(row, "COLUMN_NAME"),
                    get_string(row, "DATA_TYPE"),
                    get_string(row, "IS_NULLABLE") == "YES",
                );
                if let Some(default) = get_optional_string(row, "COLUMN_DEFAULT") {
                    col = col.with_default(default);
                }
                if let Some(comment) = get_optional_string(row, "COLUMN_COMMENT") {
                    col = col.with_comment(comment);
                }
                col
            })
            .collect();

        Ok(columns)
    }

    /// Get a table's exact row count via `COUNT(*)`.
    ///
    /// The table name is resolved against the catalog before it is
    /// formatted into the statement.
    pub async fn row_count(&self, table: &str) -> ToolResult<u64> {
        let table = identifiers::resolve_table(&self.db, table).await?;

        let count: i64 = sqlx::query_scalar(&count_sql(&table))
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.max(0) as u64)
    }

    /// Sample the first rows of a table.
    ///
    /// A caller-named sort column must exist; the implicit default
    /// (`create_time`) is dropped silently when the table lacks it.
    pub async fn top_rows(
        &self,
        table: &str,
        sort_by: Option<&str>,
        sort_method: SortDirection,
        limit: u32,
    ) -> ToolResult<QueryResult> {
        let table = identifiers::resolve_table(&self.db, table).await?;

        let sort_column = match sort_by {
            Some(column) => match identifiers::resolve_column(&self.db, &table, column).await? {
                Some(resolved) => Some(resolved),
                None => {
                    return Err(crate::error::ToolError::schema(
                        format!("Column '{}' not found in table '{}'", column, table),
                        column.to_string(),
                    ));
                }
            },
            None => {
                let resolved =
                    identifiers::resolve_column(&self.db, &table, DEFAULT_SORT_COLUMN).await?;
                if resolved.is_none() {
                    debug!(table = %table, "No create_time column, sampling unordered");
                }
                resolved
            }
        };

        let sql = top_rows_sql(
            &table,
            sort_column.as_deref().map(|c| (c, sort_method)),
        );

        self.executor
            .execute_query(
                self.db.pool(),
                &sql,
                &[QueryParam::Int(limit as i64)],
                Some(limit),
            )
            .await
    }

    /// Execute arbitrary SQL with optional positional parameters.
    ///
    /// The general escape hatch: parameter binding covers literals only,
    /// never identifiers.
    pub async fn execute_query(
        &self,
        sql: &str,
        params: &[QueryParam],
        limit: Option<u32>,
    ) -> ToolResult<QueryResult> {
        self.executor
            .execute_query(self.db.pool(), sql, params, limit)
            .await
    }

    /// Summarize every table of the schema: comment plus row count.
    ///
    /// Sub-operations run sequentially per table; no transaction isolation
    /// is taken, so counts reflect whatever the server returns at each
    /// round trip.
    pub async fn all_table_info(&self) -> ToolResult<BTreeMap<String, TableOverview>> {
        let tables = self.list_tables().await?;

        let mut info = BTreeMap::new();
        for table in tables {
            let comment = self.table_comment(&table).await?;
            let row_count = self.row_count(&table).await?;
            info.insert(table, TableOverview { comment, row_count });
        }

        Ok(info)
    }

    /// Full report for one table: comment, structure, row count, top rows.
    pub async fn table_detail(
        &self,
        table: &str,
        sort_by: Option<&str>,
        sort_method: SortDirection,
        limit: u32,
    ) -> ToolResult<TableDetail> {
        let resolved = identifiers::resolve_table(&self.db, table).await?;

        let comment = self.table_comment(&resolved).await?;
        let structure = self.table_structure(&resolved).await?;
        let row_count = self.row_count(&resolved).await?;
        let top = self
            .top_rows(&resolved, sort_by, sort_method, limit)
            .await?;

        Ok(TableDetail {
            table_name: resolved,
            comment,
            structure,
            row_count,
            row_top_n: top.rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_rows_sql_with_sort() {
        let sql = top_rows_sql("comments", Some(("create_time", SortDirection::Desc)));
        assert_eq!(
            sql,
            "SELECT * FROM `comments` ORDER BY `create_time` DESC LIMIT ?"
        );
    }

    #[test]
    fn test_top_rows_sql_ascending() {
        let sql = top_rows_sql("videos", Some(("id", SortDirection::Asc)));
        assert_eq!(sql, "SELECT * FROM `videos` ORDER BY `id` ASC LIMIT ?");
    }

    #[test]
    fn test_top_rows_sql_without_sort() {
        let sql = top_rows_sql("videos", None);
        assert_eq!(sql, "SELECT * FROM `videos` LIMIT ?");
    }

    #[test]
    fn test_count_sql_quotes_identifier() {
        assert_eq!(count_sql("comments"), "SELECT COUNT(*) AS count FROM `comments`");
        assert_eq!(count_sql("odd`one"), "SELECT COUNT(*) AS count FROM `odd``one`");
    }
}
