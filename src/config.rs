//! Configuration handling for the insight MCP server.
//!
//! Configuration is read once at process start from CLI arguments with
//! environment-variable fallbacks. The database settings use the same
//! discrete `MYSQL_*` variables the agent deployment already carries; they
//! are assembled into an explicit [`MySqlConfig`] value that is passed by
//! reference into constructors - no process-wide singleton state.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::time::Duration;
use url::Url;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default agent-service endpoint for the chat relay.
pub const DEFAULT_AGENT_ENDPOINT: &str = "http://localhost:8000/run_sse";

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// Streamable HTTP (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Top-level CLI for the insight MCP server and chat client.
#[derive(Debug, Parser)]
#[command(
    name = "insight-mcp",
    about = "MySQL introspection tools for AI agents over MCP, plus an SSE chat relay",
    version,
    author
)]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info", env = "INSIGHT_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, global = true, env = "INSIGHT_JSON_LOGS")]
    pub json_logs: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the MCP server exposing the introspection toolkit
    Serve(ServeArgs),
    /// Chat with a running agent service through the SSE relay
    Chat(ChatArgs),
}

/// MySQL connection settings, matching the deployment's `MYSQL_*` variables.
#[derive(Debug, Clone, Args)]
pub struct MySqlArgs {
    /// MySQL server host
    #[arg(long, env = "MYSQL_HOST", default_value = "127.0.0.1")]
    pub mysql_host: String,

    /// MySQL server port
    #[arg(long, env = "MYSQL_PORT", default_value_t = 3306)]
    pub mysql_port: u16,

    /// MySQL user
    #[arg(long, env = "MYSQL_USER", default_value = "root")]
    pub mysql_user: String,

    /// MySQL password (sensitive - not logged)
    #[arg(long, env = "MYSQL_PASSWORD", default_value = "", hide_env_values = true)]
    pub mysql_password: String,

    /// Database (schema) the toolkit introspects
    #[arg(long, env = "MYSQL_DATABASE")]
    pub mysql_database: String,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub mysql: MySqlArgs,

    /// Transport mode (stdio or http)
    #[arg(short, long, value_enum, default_value = "stdio", env = "MCP_TRANSPORT")]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(long, default_value = DEFAULT_HTTP_HOST, env = "MCP_HTTP_HOST")]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT, env = "MCP_HTTP_PORT")]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(long, default_value = DEFAULT_MCP_ENDPOINT, env = "MCP_ENDPOINT")]
    pub mcp_endpoint: String,

    /// Query timeout in seconds
    #[arg(long, default_value_t = DEFAULT_QUERY_TIMEOUT_SECS, env = "MCP_QUERY_TIMEOUT")]
    pub query_timeout: u64,

    /// Connection timeout in seconds
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS, env = "MCP_CONNECT_TIMEOUT")]
    pub connect_timeout: u64,

    /// LLM provider key for the surrounding agent runtime. The server only
    /// preflight-checks its presence; it never calls the provider itself.
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub deepseek_api_key: Option<String>,
}

impl ServeArgs {
    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Get the query timeout as a Duration.
    pub fn query_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.query_timeout)
    }

    /// Get the connection timeout as a Duration.
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Agent service SSE endpoint
    #[arg(long, default_value = DEFAULT_AGENT_ENDPOINT, env = "AGENT_ENDPOINT")]
    pub endpoint: Url,

    /// App name sent in the run envelope
    #[arg(long, default_value = "adkmcp", env = "AGENT_APP_NAME")]
    pub app_name: String,

    /// User id sent in the run envelope
    #[arg(long, default_value = "local", env = "AGENT_USER_ID")]
    pub user_id: String,

    /// Session id sent in the run envelope (random when omitted)
    #[arg(long, env = "AGENT_SESSION_ID")]
    pub session_id: Option<String>,
}

/// Immutable MySQL connection configuration, built once at startup.
#[derive(Clone)]
pub struct MySqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl MySqlConfig {
    /// Assemble the connection configuration from parsed arguments.
    pub fn from_args(args: &MySqlArgs) -> Self {
        Self {
            host: args.mysql_host.clone(),
            port: args.mysql_port,
            user: args.mysql_user.clone(),
            password: args.mysql_password.clone(),
            database: args.mysql_database.clone(),
        }
    }
}

impl std::fmt::Debug for MySqlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mysql_args() -> MySqlArgs {
        MySqlArgs {
            mysql_host: "db.internal".to_string(),
            mysql_port: 3307,
            mysql_user: "insight".to_string(),
            mysql_password: "s3cret".to_string(),
            mysql_database: "insight".to_string(),
        }
    }

    #[test]
    fn test_mysql_config_from_args() {
        let config = MySqlConfig::from_args(&mysql_args());
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 3307);
        assert_eq!(config.user, "insight");
        assert_eq!(config.database, "insight");
    }

    #[test]
    fn test_mysql_config_debug_redacts_password() {
        let config = MySqlConfig::from_args(&mysql_args());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_serve_args_bind_addr_and_timeouts() {
        let config = Config::parse_from([
            "insight-mcp",
            "serve",
            "--mysql-database",
            "insight",
            "--http-host",
            "0.0.0.0",
            "--http-port",
            "3000",
            "--query-timeout",
            "60",
        ]);
        let Command::Serve(args) = config.command else {
            panic!("expected serve subcommand");
        };
        assert_eq!(args.http_bind_addr(), "0.0.0.0:3000");
        assert_eq!(args.query_timeout_duration(), Duration::from_secs(60));
        assert_eq!(
            args.connect_timeout_duration(),
            Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)
        );
        assert_eq!(args.transport, TransportMode::Stdio);
    }

    #[test]
    fn test_chat_args_defaults() {
        let config = Config::parse_from(["insight-mcp", "chat"]);
        let Command::Chat(args) = config.command else {
            panic!("expected chat subcommand");
        };
        assert_eq!(args.endpoint.as_str(), DEFAULT_AGENT_ENDPOINT);
        assert_eq!(args.app_name, "adkmcp");
        assert!(args.session_id.is_none());
    }

    #[test]
    fn test_transport_mode_display() {
        assert_eq!(TransportMode::Stdio.to_string(), "stdio");
        assert_eq!(TransportMode::Http.to_string(), "http");
    }
}
