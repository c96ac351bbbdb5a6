//! Catalog-backed identifier validation.
//!
//! Table names, sort columns, and sort direction cannot be bound as
//! parameters - the SQL syntax does not allow binding identifiers - so they
//! are formatted into query text. Before any interpolation, names must
//! resolve against live `information_schema` metadata; the catalog itself is
//! the allow-list. Sort direction is a closed enum. Only identifiers that
//! come back from the catalog (in the catalog's own spelling) ever reach
//! `format!`.

use crate::db::pool::Database;
use crate::db::types::get_string;
use crate::error::{ToolError, ToolResult};
use std::str::FromStr;

/// MySQL caps identifiers at 64 characters.
pub const MAX_IDENT_LEN: usize = 64;

const TABLE_EXISTS: &str = r#"
    SELECT CONVERT(TABLE_NAME USING utf8) AS TABLE_NAME
    FROM information_schema.tables
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND TABLE_TYPE = 'BASE TABLE'
    "#;

const COLUMN_EXISTS: &str = r#"
    SELECT CONVERT(COLUMN_NAME USING utf8) AS COLUMN_NAME
    FROM information_schema.columns
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND COLUMN_NAME = ?
    "#;

/// Sort direction for `get_top_rows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// The SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = ToolError;

    fn from_str(s: &str) -> ToolResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(ToolError::invalid_input(format!(
                "sort_method must be 'asc' or 'desc', got '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// Cheap pre-checks before touching the catalog.
pub fn sanity_check(name: &str) -> ToolResult<()> {
    if name.is_empty() {
        return Err(ToolError::invalid_input("Identifier cannot be empty"));
    }
    if name.len() > MAX_IDENT_LEN {
        return Err(ToolError::invalid_input(format!(
            "Identifier exceeds {} characters",
            MAX_IDENT_LEN
        )));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(ToolError::invalid_input(
            "Identifier contains control characters",
        ));
    }
    Ok(())
}

/// Backtick-quote an identifier, doubling embedded backticks.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Resolve a table name against the configured schema.
///
/// Returns the catalog's own spelling of the name; a table that does not
/// exist is a schema error in this strict layer.
pub async fn resolve_table(db: &Database, table: &str) -> ToolResult<String> {
    sanity_check(table)?;

    let row = sqlx::query(TABLE_EXISTS)
        .bind(db.schema())
        .bind(table)
        .fetch_optional(db.pool())
        .await?;

    match row {
        Some(row) => Ok(get_string(&row, "TABLE_NAME")),
        None => Err(ToolError::schema(
            format!("Table '{}' not found in schema '{}'", table, db.schema()),
            table.to_string(),
        )),
    }
}

/// Resolve a column name within a table. `Ok(None)` means the table exists
/// but has no such column; the caller decides whether that is an error.
pub async fn resolve_column(db: &Database, table: &str, column: &str) -> ToolResult<Option<String>> {
    sanity_check(column)?;

    let row = sqlx::query(COLUMN_EXISTS)
        .bind(db.schema())
        .bind(table)
        .bind(column)
        .fetch_optional(db.pool())
        .await?;

    Ok(row.map(|row| get_string(&row, "COLUMN_NAME")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_direction_parse() {
        assert_eq!(SortDirection::from_str("asc").unwrap(), SortDirection::Asc);
        assert_eq!(
            SortDirection::from_str("DESC").unwrap(),
            SortDirection::Desc
        );
        assert_eq!(
            SortDirection::from_str(" Asc ").unwrap(),
            SortDirection::Asc
        );
    }

    #[test]
    fn test_sort_direction_rejects_injection() {
        assert!(SortDirection::from_str("desc; DROP TABLE users").is_err());
        assert!(SortDirection::from_str("").is_err());
        assert!(SortDirection::from_str("descending").is_err());
    }

    #[test]
    fn test_sort_direction_default_is_desc() {
        assert_eq!(SortDirection::default(), SortDirection::Desc);
        assert_eq!(SortDirection::default().as_sql(), "DESC");
    }

    #[test]
    fn test_sanity_check_accepts_normal_names() {
        assert!(sanity_check("comments").is_ok());
        assert!(sanity_check("用户表").is_ok());
        assert!(sanity_check("a_b_c123").is_ok());
    }

    #[test]
    fn test_sanity_check_rejects_bad_names() {
        assert!(sanity_check("").is_err());
        assert!(sanity_check(&"x".repeat(MAX_IDENT_LEN + 1)).is_err());
        assert!(sanity_check("users\n-- drop").is_err());
        assert!(sanity_check("a\0b").is_err());
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("comments"), "`comments`");
        assert_eq!(quote_ident("weird`name"), "`weird``name`");
    }
}
