//! MySQL connection pool handling.
//!
//! One pool per process, built from the immutable [`MySqlConfig`] at
//! startup. The pool is an implementation detail of the toolkit, not part
//! of its contract; callers only see the operations.

use crate::config::MySqlConfig;
use crate::error::{ToolError, ToolResult};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::MySqlPool;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// A connected MySQL database plus the schema name the toolkit introspects.
#[derive(Debug, Clone)]
pub struct Database {
    pool: MySqlPool,
    config: MySqlConfig,
}

impl Database {
    /// Connect to MySQL using the given configuration.
    pub async fn connect(config: MySqlConfig, connect_timeout: Duration) -> ToolResult<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .charset("utf8mb4");

        let pool = MySqlPoolOptions::new()
            .min_connections(DEFAULT_MIN_CONNECTIONS)
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .acquire_timeout(connect_timeout)
            .idle_timeout(Some(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS)))
            .connect_with(options)
            .await
            .map_err(|e| {
                ToolError::connection(
                    format!("Failed to connect: {}", e),
                    connection_suggestion(&e),
                )
            })?;

        let db = Self { pool, config };

        match db.server_version().await {
            Some(version) => info!(
                host = %db.config.host,
                database = %db.config.database,
                server_version = %version,
                "Connected to MySQL"
            ),
            None => warn!(
                host = %db.config.host,
                database = %db.config.database,
                "Connected, but could not read server version"
            ),
        }

        Ok(db)
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Get the schema (database) name this toolkit is bound to.
    pub fn schema(&self) -> &str {
        &self.config.database
    }

    /// Check whether the database is still reachable.
    ///
    /// Connection loss is reported as `false`, never as a raised fault.
    pub async fn is_connected(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!(database = %self.config.database, "Closed MySQL connection pool");
    }

    async fn server_version(&self) -> Option<String> {
        match sqlx::query_scalar::<_, String>("SELECT version()")
            .fetch_one(&self.pool)
            .await
        {
            Ok(version) => {
                debug!(version = %version, "Got server version");
                Some(version)
            }
            Err(e) => {
                warn!(error = %e, "Failed to get server version");
                None
            }
        }
    }
}

/// Generate a helpful suggestion for connection errors.
fn connection_suggestion(error: &sqlx::Error) -> String {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        return "Check that the MySQL server is running and accessible".to_string();
    }

    if error_str.contains("authentication") || error_str.contains("access denied") {
        return "Verify MYSQL_USER and MYSQL_PASSWORD".to_string();
    }

    if error_str.contains("unknown database") {
        return "Check that MYSQL_DATABASE names an existing schema".to_string();
    }

    if error_str.contains("tls") || error_str.contains("ssl") {
        return "Check TLS/SSL configuration or try disabling it".to_string();
    }

    "Verify MYSQL_HOST, MYSQL_PORT and credentials".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_suggestion_refused() {
        let err = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "Connection refused (os error 111)",
        ));
        assert!(connection_suggestion(&err).contains("running and accessible"));
    }

    #[test]
    fn test_connection_suggestion_fallback() {
        let err = sqlx::Error::Protocol("handshake mismatch".to_string());
        assert!(connection_suggestion(&err).contains("MYSQL_HOST"));
    }
}
