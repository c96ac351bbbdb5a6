//! Agent-facing tool handlers.
//!
//! One tool surface, many adapters: the handlers here wrap the strict
//! `Introspector` with the input/output types the MCP layer registers.
//! Every handler result is wrapped in [`Outcome`] at the protocol boundary.

pub mod query;
pub mod schema;

pub use query::{
    ExecuteQueryInput, ExecuteQueryOutput, OutputFormat, QueryToolHandler, RowCountInput,
    RowCountOutput, TopRowsInput, TopRowsOutput,
};
pub use schema::{
    AllTableInfoOutput, ListTablesOutput, SchemaToolHandler, TableCommentInput, TableCommentOutput,
    TableDetailInput, TableStructureInput, TableStructureOutput,
};

use crate::error::ToolResult;
use schemars::JsonSchema;
use serde::Serialize;
use tracing::warn;

/// Tagged result preserving the legacy fail-soft contract.
///
/// The original service converted every database error into an empty
/// result, leaving callers unable to tell "no data" from "query failed".
/// The payload still collapses to its empty shape on failure - agents built
/// against the old behavior keep working - but `ok` and `error` make the
/// two states distinguishable.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Outcome<T> {
    /// False when the operation failed and the payload collapsed to empty
    pub ok: bool,
    /// Failure detail, absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Default> Outcome<T> {
    /// Wrap a successful payload.
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            error: None,
            data,
        }
    }

    /// Collapse a strict result into the fail-soft shape, logging failures.
    pub fn collapse(operation: &str, result: ToolResult<T>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => {
                warn!(
                    operation = operation,
                    error = %e,
                    "Tool call failed, returning empty result"
                );
                Self {
                    ok: false,
                    error: Some(e.to_string()),
                    data: T::default(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;

    #[derive(Debug, Default, Serialize, JsonSchema, PartialEq)]
    struct Payload {
        rows: Vec<u32>,
    }

    #[test]
    fn test_collapse_success_keeps_payload() {
        let outcome = Outcome::collapse("op", Ok(Payload { rows: vec![1, 2] }));
        assert!(outcome.ok);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.data.rows, vec![1, 2]);
    }

    #[test]
    fn test_collapse_failure_yields_tagged_empty() {
        let outcome: Outcome<Payload> =
            Outcome::collapse("op", Err(ToolError::database("boom", None, "check sql")));
        assert!(!outcome.ok);
        assert!(outcome.error.as_deref().unwrap().contains("boom"));
        assert_eq!(outcome.data, Payload::default());
    }

    #[test]
    fn test_empty_success_is_distinct_from_failure() {
        let empty_ok = Outcome::collapse("op", Ok(Payload::default()));
        let failed: Outcome<Payload> =
            Outcome::collapse("op", Err(ToolError::internal("lost connection")));

        // Same empty payload, different tags - the ambiguity the original
        // service baked in is now resolvable.
        assert_eq!(empty_ok.data, failed.data);
        assert!(empty_ok.ok);
        assert!(!failed.ok);
    }

    #[test]
    fn test_outcome_serialization_flattens_payload() {
        let outcome = Outcome::success(Payload { rows: vec![7] });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["rows"][0], 7);
        assert!(json.get("error").is_none());
        assert!(json.get("data").is_none());
    }
}
