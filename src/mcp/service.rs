//! MCP service implementation using rmcp.
//!
//! This is the agent-facing adapter: it registers the eight toolkit
//! operations as MCP tools and applies the fail-soft collapse at the
//! protocol boundary. Database errors therefore never surface as protocol
//! faults - the agent sees a tagged empty result and must reason about the
//! ambiguity in its reply. Only malformed input (e.g. a blank table name)
//! is rejected as invalid params.

use crate::db::{Database, Introspector, QueryExecutor};
use crate::models::TableDetail;
use crate::tools::query::{
    ExecuteQueryInput, ExecuteQueryOutput, QueryToolHandler, RowCountInput, RowCountOutput,
    TopRowsInput, TopRowsOutput,
};
use crate::tools::schema::{
    AllTableInfoOutput, ListTablesOutput, SchemaToolHandler, TableCommentInput, TableCommentOutput,
    TableDetailInput, TableStructureInput, TableStructureOutput,
};
use crate::tools::Outcome;
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct InsightService {
    /// Shared introspector over the configured database
    introspector: Introspector,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl InsightService {
    /// Create a new service over a connected database.
    pub fn new(db: Arc<Database>, executor: Arc<QueryExecutor>) -> Self {
        Self {
            introspector: Introspector::new(db, executor),
            tool_router: Self::tool_router(),
        }
    }

    fn schema_handler(&self) -> SchemaToolHandler {
        SchemaToolHandler::new(self.introspector.clone())
    }

    fn query_handler(&self) -> QueryToolHandler {
        QueryToolHandler::new(self.introspector.clone())
    }

    /// Validate a table name - ensure it is provided and non-empty.
    fn validate_table_name(&self, provided: &str) -> Result<String, McpError> {
        validate_table_name(provided)
    }
}

/// Trim and require a non-empty table name.
fn validate_table_name(provided: &str) -> Result<String, McpError> {
    let trimmed = provided.trim();
    if trimmed.is_empty() {
        Err(McpError::invalid_params(
            "table_name is required. Call list_tables first to see available tables.",
            None,
        ))
    } else {
        Ok(trimmed.to_string())
    }
}

#[tool_router]
impl InsightService {
    #[tool(
        description = "List all base tables in the configured database.\nReturns table names ordered alphabetically."
    )]
    async fn list_tables(&self) -> Json<Outcome<ListTablesOutput>> {
        Json(Outcome::collapse(
            "list_tables",
            self.schema_handler().list_tables().await,
        ))
    }

    #[tool(
        description = "Get the comment (purpose description) of a table.\nReturns the sentinel '无注释' when the table has no comment."
    )]
    async fn get_table_comment(
        &self,
        Parameters(input): Parameters<TableCommentInput>,
    ) -> Result<Json<Outcome<TableCommentOutput>>, McpError> {
        let mut input = input;
        input.table_name = self.validate_table_name(&input.table_name)?;
        Ok(Json(Outcome::collapse(
            "get_table_comment",
            self.schema_handler().table_comment(input).await,
        )))
    }

    #[tool(
        description = "Get the column layout of a table.\nReturns field name, type, nullability, default and comment per column, in ordinal order."
    )]
    async fn get_table_structure(
        &self,
        Parameters(input): Parameters<TableStructureInput>,
    ) -> Result<Json<Outcome<TableStructureOutput>>, McpError> {
        let mut input = input;
        input.table_name = self.validate_table_name(&input.table_name)?;
        Ok(Json(Outcome::collapse(
            "get_table_structure",
            self.schema_handler().table_structure(input).await,
        )))
    }

    #[tool(description = "Get the exact row count of a table via COUNT(*).")]
    async fn get_row_count(
        &self,
        Parameters(input): Parameters<RowCountInput>,
    ) -> Result<Json<Outcome<RowCountOutput>>, McpError> {
        let mut input = input;
        input.table_name = self.validate_table_name(&input.table_name)?;
        Ok(Json(Outcome::collapse(
            "get_row_count",
            self.query_handler().row_count(input).await,
        )))
    }

    #[tool(
        description = "Sample the first N rows of a table.\nDefaults to 10 rows sorted by create_time descending; tables without a create_time column are sampled unordered."
    )]
    async fn get_top_rows(
        &self,
        Parameters(input): Parameters<TopRowsInput>,
    ) -> Result<Json<Outcome<TopRowsOutput>>, McpError> {
        let mut input = input;
        input.table_name = self.validate_table_name(&input.table_name)?;
        Ok(Json(Outcome::collapse(
            "get_top_rows",
            self.query_handler().top_rows(input).await,
        )))
    }

    #[tool(
        description = "Execute a SQL query and return its rows.\nBind literal values with ? placeholders; identifiers cannot be bound.\nA failed query yields ok=false with an empty row set, so treat empty results as ambiguous between 'no data' and 'query failed'.\nOutput format: json (default), table, or markdown."
    )]
    async fn execute_query(
        &self,
        Parameters(input): Parameters<ExecuteQueryInput>,
    ) -> Json<Outcome<ExecuteQueryOutput>> {
        Json(Outcome::collapse(
            "execute_query",
            self.query_handler().execute_query(input).await,
        ))
    }

    #[tool(
        description = "Get basic information about every table: comment and row count.\nUse this when the user asks what tables exist or what they contain."
    )]
    async fn get_all_table_info(&self) -> Json<Outcome<AllTableInfoOutput>> {
        Json(Outcome::collapse(
            "get_all_table_info",
            self.schema_handler().all_table_info().await,
        ))
    }

    #[tool(
        description = "Get the full picture of one table: comment, column structure, row count and a sample of its rows.\nUse this when the user asks about a specific table."
    )]
    async fn get_table_detail(
        &self,
        Parameters(input): Parameters<TableDetailInput>,
    ) -> Result<Json<Outcome<TableDetail>>, McpError> {
        let mut input = input;
        input.table_name = self.validate_table_name(&input.table_name)?;
        Ok(Json(Outcome::collapse(
            "get_table_detail",
            self.schema_handler().table_detail(input).await,
        )))
    }
}

#[tool_handler]
impl ServerHandler for InsightService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "insight-mcp".to_owned(),
                title: Some("Insight MySQL Toolkit".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "MySQL introspection tools for answering natural-language questions about one database.\n\
                \n\
                ## Workflow\n\
                1. When the user asks which tables exist, call `get_all_table_info`\n\
                2. When the user asks about one table's structure, purpose or data, call `get_table_detail`\n\
                3. For everything else, write SQL and run it with `execute_query`\n\
                \n\
                ## Reading results\n\
                Every tool reply carries an `ok` flag. When `ok` is false the payload is empty and\n\
                `error` explains why - tell the user the lookup failed instead of claiming there is\n\
                no data. An empty payload with `ok: true` genuinely means no data.\n\
                \n\
                ## Notes\n\
                - Tables without a comment report the sentinel 无注释\n\
                - `get_top_rows` sorts by create_time descending unless told otherwise\n\
                - Bind literal values with ? placeholders; table and column names cannot be bound"
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_table_name_with_valid() {
        assert_eq!(validate_table_name("comments").unwrap(), "comments");
    }

    #[test]
    fn test_validate_table_name_trims_whitespace() {
        assert_eq!(validate_table_name("  comments  ").unwrap(), "comments");
    }

    #[test]
    fn test_validate_table_name_rejects_empty() {
        let err = validate_table_name("").unwrap_err();
        assert!(err.to_string().contains("table_name is required"));
    }

    #[test]
    fn test_validate_table_name_rejects_whitespace_only() {
        assert!(validate_table_name("   ").is_err());
    }
}
