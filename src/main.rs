//! Insight MCP - Main entry point.
//!
//! `serve` runs the MCP server exposing the MySQL introspection toolkit;
//! `chat` talks to an already-running agent service through the SSE relay.

use clap::Parser;
use futures_util::StreamExt;
use insight_mcp::config::{ChatArgs, Command, Config, MySqlConfig, ServeArgs, TransportMode};
use insight_mcp::db::{Database, QueryExecutor};
use insight_mcp::error::ToolResult;
use insight_mcp::models::DEFAULT_ROW_LIMIT;
use insight_mcp::relay::{RelayClient, RelayConfig};
use insight_mcp::transport::{HttpTransport, StdioTransport, Transport};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    init_tracing(&config);

    let result = match config.command {
        Command::Serve(args) => serve(args).await,
        Command::Chat(args) => chat(args).await,
    };

    if let Err(e) = result {
        error!(error = %e, "Fatal error");
        return Err(e.into());
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> ToolResult<()> {
    info!(
        transport = %args.transport,
        "Starting Insight MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    // The key belongs to the surrounding agent runtime; the server only
    // checks its presence so misconfiguration shows up at startup
    if args.deepseek_api_key.is_none() {
        warn!("DEEPSEEK_API_KEY is not set; the agent runtime will not reach its model");
    }

    let mysql_config = MySqlConfig::from_args(&args.mysql);
    info!(config = ?mysql_config, "Connecting to MySQL");

    let db = Arc::new(Database::connect(mysql_config, args.connect_timeout_duration()).await?);
    let executor = Arc::new(QueryExecutor::with_defaults(
        args.query_timeout,
        DEFAULT_ROW_LIMIT,
    ));

    match args.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            let transport = StdioTransport::new(db, executor);
            transport.run().await?;
        }
        TransportMode::Http => {
            info!(
                host = %args.http_host,
                port = args.http_port,
                endpoint = %args.mcp_endpoint,
                "Using HTTP transport"
            );
            let transport = HttpTransport::new(
                db,
                executor,
                &args.http_host,
                args.http_port,
                &args.mcp_endpoint,
            );
            transport.run().await?;
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn chat(args: ChatArgs) -> ToolResult<()> {
    let session_id = args
        .session_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let client = RelayClient::new(RelayConfig {
        endpoint: args.endpoint,
        app_name: args.app_name,
        user_id: args.user_id,
        session_id: session_id.clone(),
    })?;

    println!("Connected to {} (session {})", client.endpoint(), session_id);
    println!("Type your question, or 'exit' to quit.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush().ok();

        let mut input = String::new();
        if stdin.lock().read_line(&mut input).unwrap_or(0) == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }

        match client.stream_message(input).await {
            Ok(mut fragments) => {
                while let Some(fragment) = fragments.next().await {
                    print!("{}", fragment);
                    stdout.flush().ok();
                }
                println!();
            }
            Err(e) => {
                eprintln!("error: {}", e);
            }
        }
    }

    Ok(())
}
