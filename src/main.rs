/// Math MCP Server Entry Point
///
/// Initializes logging, reads configuration from the environment (see
/// `core::config`), builds the tool registry once, and starts the transports
/// selected by MCP_TRANSPORT_MODE.
///
/// Logging goes to stderr. RUST_LOG sets the filter (default: "info") and
/// LOG_FORMAT=json switches to JSON lines.

use std::process::exit;

use math_mcp_server::core::config::{FileConfig, ServerConfig, TransportMode};
use math_mcp_server::core::registry::initialize_tools;
use math_mcp_server::core::server::{self, AppState};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_logging();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            exit(1);
        }
    };

    let file_config = FileConfig::load(&config.config_file);
    let registry = initialize_tools(&file_config);
    let state = AppState::from(&config);

    info!(transport = %config.transport, tools = registry.len(), "configuration loaded");

    match config.transport {
        TransportMode::Stdio => server::run_server_stdio(state, registry).await,
        TransportMode::Http => server::run_server_http(&config, state, registry).await,
        TransportMode::Both => {
            // STDIO runs in the background; the HTTP server owns the process lifetime
            let stdio_state = state.clone();
            let stdio_registry = registry.clone();
            let stdio_handle = tokio::spawn(async move {
                if let Err(e) = server::run_server_stdio(stdio_state, stdio_registry).await {
                    error!(error = %e, "STDIO server error");
                }
            });

            let http_result = server::run_server_http(&config, state, registry).await;

            stdio_handle.abort();

            http_result
        }
    }
}
