/// Math MCP Server Implementation
///
/// This module contains the transports that expose the tool registry:
/// - HTTP server setup with Actix Web: the REST calculator surface
///   (`/health`, `/mcp/tools`, `/calculate`), service info on `/`, SSE tool
///   discovery on `/sse` and MCP JSON-RPC on `/mcp`
/// - STDIO server for line-based MCP JSON-RPC

use std::sync::Arc;
use std::time::Duration;

use actix_web::{
    App, HttpRequest, HttpResponse, HttpServer, Result,
    http::header,
    middleware::{Compress, DefaultHeaders, Logger},
    web,
};
use bytes::Bytes;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::core::config::ServerConfig;
use crate::core::error::CalcError;
use crate::core::registry::ToolRegistry;
use crate::core::rpc;

/// Largest accepted JSON body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Server metadata shared across all worker threads.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server name as reported in MCP initialize responses
    pub server_name: String,
    /// Server version string as reported in MCP initialize responses
    pub server_version: String,
}

impl From<&ServerConfig> for AppState {
    fn from(config: &ServerConfig) -> Self {
        Self {
            server_name: config.name.clone(),
            server_version: config.version.clone(),
        }
    }
}

/// Service information.
async fn root(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "service": state.server_name,
        "status": "running",
        "version": state.server_version,
        "endpoints": {
            "health": "/health",
            "mcp_tools": "/mcp/tools",
            "calculate": "/calculate",
            "mcp": "/mcp",
            "sse": "/sse"
        }
    }))
}

/// Liveness/readiness probe. Constant response.
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "healthy" }))
}

/// Static tool descriptor listing.
async fn list_tools(registry: web::Data<ToolRegistry>) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "tools": registry.tools }))
}

/// Execute one calculation.
///
/// Every failure is a `CalcError`, rendered as `400 {"error": ...}` through
/// its `ResponseError` impl.
async fn calculate(
    registry: web::Data<ToolRegistry>,
    body: web::Json<Value>,
) -> Result<HttpResponse, CalcError> {
    let operation = body.get("operation").and_then(Value::as_str).unwrap_or("");
    let result = registry.calculate(&body).inspect_err(|e| {
        warn!(operation, kind = e.kind(), error = %e, "calculation rejected");
    })?;
    Ok(HttpResponse::Ok().json(result))
}

/// MCP JSON-RPC over HTTP. Protocol errors travel in the JSON-RPC envelope,
/// so the HTTP status is 200 for responses and 202 for notifications.
async fn mcp_handler(
    state: web::Data<AppState>,
    registry: web::Data<ToolRegistry>,
    body: Bytes,
) -> HttpResponse {
    match rpc::handle_bytes(&state, &registry, &body) {
        Some(response) => HttpResponse::Ok().json(response),
        None => HttpResponse::Accepted().finish(),
    }
}

/// Server-Sent Events endpoint for tools discovery.
///
/// Emits a single event with all registered tools and their count.
async fn sse_tools_discovery(registry: web::Data<ToolRegistry>) -> HttpResponse {
    let tools_data = json!({
        "tools": registry.tools,
        "count": registry.len()
    });
    let event = Bytes::from(format!("data: {}\n\n", tools_data));
    let stream = futures_util::stream::once(async move { Ok::<_, actix_web::Error>(event) });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        // Disable caching to ensure clients always get fresh data
        .insert_header(header::CacheControl(vec![
            header::CacheDirective::NoCache,
            header::CacheDirective::NoStore,
            header::CacheDirective::MustRevalidate,
        ]))
        // Disable nginx buffering for real-time streaming
        .insert_header(("x-accel-buffering", "no"))
        .streaming(stream)
}

/// JSON extractor settings: any content type, bounded size, and body errors
/// reported in the same `{"error": ...}` shape as calculation errors.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_BODY_BYTES)
        .content_type_required(false)
        .error_handler(|err, _req: &HttpRequest| {
            CalcError::invalid("body", format!("Invalid JSON body: {}", err)).into()
        })
}

/// Register all routes. Shared by the server and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
        .route("/", web::get().to(root))
        .route("/health", web::get().to(health))
        .route("/mcp/tools", web::get().to(list_tools))
        .route("/calculate", web::post().to(calculate))
        .route("/sse", web::get().to(sse_tools_discovery))
        .route("/mcp", web::post().to(mcp_handler));
}

/// Run the server in HTTP mode.
///
/// # Configuration
/// - Worker threads: from `ServerConfig::workers`
/// - Max connections: 10,000 concurrent connections
/// - Connection rate limit: 1,000 connections per second
/// - Keep-alive: 30 seconds
/// - Request timeout: 30 seconds
/// - Disconnect timeout: 2 seconds
/// - Shutdown timeout: 10 seconds
pub async fn run_server_http(
    config: &ServerConfig,
    state: AppState,
    registry: Arc<ToolRegistry>,
) -> std::io::Result<()> {
    let bind_addr = config.bind_addr();
    let app_state = web::Data::new(state);
    let tool_registry = web::Data::from(registry);

    info!(
        name = %config.name,
        version = %config.version,
        bind = %bind_addr,
        workers = config.workers,
        tools = tool_registry.len(),
        "math MCP server starting (HTTP mode)"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(tool_registry.clone())
            // Enable compression for JSON responses (gzip/brotli)
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY")),
            )
            // Format: %r = request line, %s = status, %Dms = duration in milliseconds
            .wrap(Logger::new("%r %s %Dms"))
            .configure(configure)
    })
    .workers(config.workers)
    // Connection limits for high-traffic scenarios
    .max_connections(10000)
    .max_connection_rate(1000)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}

/// Run the server in STDIO mode.
///
/// Reads JSON-RPC requests line-by-line from stdin and writes responses to
/// stdout. All logging goes to stderr so the protocol stream stays clean.
///
/// # Implementation Details
/// - Uses buffered I/O with 8KB buffers
/// - Processes requests one at a time
/// - Skips notifications (requests without IDs)
/// - Flushes after each response
pub async fn run_server_stdio(state: AppState, registry: Arc<ToolRegistry>) -> std::io::Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    serve_lines(&state, &registry, stdin, stdout).await
}

/// Line-delimited JSON-RPC loop over any async reader/writer pair.
pub async fn serve_lines<R, W>(
    state: &AppState,
    registry: &ToolRegistry,
    reader: R,
    writer: W,
) -> std::io::Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

    info!(
        name = %state.server_name,
        version = %state.server_version,
        "math MCP server starting (STDIO mode)"
    );

    let mut reader = BufReader::with_capacity(8192, reader);
    let mut writer = BufWriter::with_capacity(8192, writer);
    let mut line = Vec::with_capacity(8192);

    loop {
        line.clear();
        // Raw bytes: a line that is not UTF-8 still gets a parse error reply
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        if line.trim_ascii().is_empty() {
            continue;
        }

        let Some(response) = rpc::handle_bytes(state, registry, line.trim_ascii_end()) else {
            continue;
        };

        let response_json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "failed to serialize response");
                continue;
            }
        };

        // Each response must be on a single line followed by newline
        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    Ok(())
}
