//! Query execution engine.
//!
//! Executes SQL against the MySQL pool with:
//! - Positional parameter binding for scalar literals
//! - Row limits enforced via streaming (only fetches needed rows)
//! - Query timeouts

use crate::db::types::RowToJson;
use crate::error::{ToolError, ToolResult};
use crate::models::{
    DEFAULT_QUERY_TIMEOUT_SECS, DEFAULT_ROW_LIMIT, MAX_ROW_LIMIT, QueryParam, QueryResult,
};
use futures_util::StreamExt;
use sqlx::MySqlPool;
use sqlx::mysql::{MySqlArguments, MySqlRow};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Query executor that handles SQL execution against the pool.
pub struct QueryExecutor {
    default_timeout: Duration,
    default_limit: u32,
}

impl QueryExecutor {
    /// Create a new query executor with default settings.
    pub fn new() -> Self {
        Self {
            default_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS as u64),
            default_limit: DEFAULT_ROW_LIMIT,
        }
    }

    /// Create a new query executor with custom settings.
    pub fn with_defaults(timeout_secs: u64, row_limit: u32) -> Self {
        Self {
            default_timeout: Duration::from_secs(timeout_secs),
            default_limit: row_limit.min(MAX_ROW_LIMIT),
        }
    }

    /// Execute a query and return its rows.
    pub async fn execute_query(
        &self,
        pool: &MySqlPool,
        sql: &str,
        params: &[QueryParam],
        limit: Option<u32>,
    ) -> ToolResult<QueryResult> {
        let start = Instant::now();
        // Clamp to [1, MAX_ROW_LIMIT]; limit=0 would mark every result "truncated"
        let row_limit = limit
            .map(|l| l.clamp(1, MAX_ROW_LIMIT))
            .unwrap_or(self.default_limit);

        debug!(
            sql = %sql,
            params = params.len(),
            limit = row_limit,
            "Executing query"
        );

        let rows = self
            .fetch_rows(pool, sql, params, row_limit, self.default_timeout)
            .await?;
        Ok(process_rows(rows, row_limit, start))
    }

    async fn fetch_rows(
        &self,
        pool: &MySqlPool,
        sql: &str,
        params: &[QueryParam],
        row_limit: u32,
        query_timeout: Duration,
    ) -> ToolResult<Vec<MySqlRow>> {
        // When params is empty, use raw SQL to avoid prepared statement issues
        let fetch_limit = row_limit as usize + 1;
        let rows_future = if params.is_empty() {
            use sqlx::Executor;
            let stream = pool.fetch(sql);
            stream.take(fetch_limit).collect::<Vec<_>>()
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            let stream = query.fetch(pool);
            stream.take(fetch_limit).collect::<Vec<_>>()
        };

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(ToolError::timeout(
                "query execution",
                query_timeout.as_secs() as u32,
            )),
        }
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_rows(results: Vec<Result<MySqlRow, sqlx::Error>>) -> ToolResult<Vec<MySqlRow>> {
    let mut rows = Vec::with_capacity(results.len());
    for result in results {
        rows.push(result.map_err(ToolError::from)?);
    }
    Ok(rows)
}

fn bind_param<'q>(
    query: sqlx::query::Query<'q, sqlx::MySql, MySqlArguments>,
    param: &'q QueryParam,
) -> sqlx::query::Query<'q, sqlx::MySql, MySqlArguments> {
    match param {
        QueryParam::Null => query.bind(None::<String>),
        QueryParam::Bool(v) => query.bind(*v),
        QueryParam::Int(v) => query.bind(*v),
        QueryParam::Float(v) => query.bind(*v),
        QueryParam::String(v) => query.bind(v.as_str()),
    }
}

/// Process fetched rows into a QueryResult, applying the limit.
fn process_rows(rows: Vec<MySqlRow>, row_limit: u32, start: Instant) -> QueryResult {
    let execution_time_ms = start.elapsed().as_millis() as u64;

    if rows.is_empty() {
        return QueryResult::empty(execution_time_ms);
    }

    let columns = rows[0].get_column_metadata();
    let total_rows = rows.len();
    let truncated = total_rows > row_limit as usize;
    let rows_to_take = (row_limit as usize).min(total_rows);

    let json_rows: Vec<serde_json::Map<String, serde_json::Value>> = rows
        .iter()
        .take(rows_to_take)
        .map(|r| r.to_json_map())
        .collect();

    if truncated {
        warn!(
            total_rows = total_rows,
            limit = row_limit,
            "Query result truncated"
        );
    }

    QueryResult {
        columns,
        rows: json_rows,
        truncated,
        execution_time_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_defaults() {
        let executor = QueryExecutor::new();
        assert_eq!(
            executor.default_timeout,
            Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS as u64)
        );
        assert_eq!(executor.default_limit, DEFAULT_ROW_LIMIT);
    }

    #[test]
    fn test_executor_custom_settings() {
        let executor = QueryExecutor::with_defaults(60, 500);
        assert_eq!(executor.default_timeout, Duration::from_secs(60));
        assert_eq!(executor.default_limit, 500);
    }

    #[test]
    fn test_executor_limit_capped() {
        let executor = QueryExecutor::with_defaults(30, 99999);
        assert_eq!(executor.default_limit, MAX_ROW_LIMIT);
    }

    #[test]
    fn test_process_rows_empty() {
        let result = process_rows(Vec::new(), 10, Instant::now());
        assert!(result.is_empty());
        assert!(!result.truncated);
    }
}
