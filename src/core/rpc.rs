/// MCP JSON-RPC 2.0 Protocol Handling
///
/// Request/response structures and method dispatch for the MCP protocol.
/// Both transports feed raw messages through [`handle_bytes`]: the HTTP
/// `/mcp` route and the line-based STDIO loop. The supported methods are
/// `initialize`, `ping`, `tools/list` and `tools/call`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::core::registry::ToolRegistry;
use crate::core::server::AppState;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

/// JSON-RPC 2.0 request structure for MCP protocol.
#[derive(Deserialize, Debug, Clone)]
pub struct MCPRequest {
    /// JSON-RPC version identifier, must be "2.0"
    #[serde(default)]
    pub jsonrpc: String,
    /// Request ID for correlating responses. None (member absent) indicates a
    /// notification; an explicit `null` is `Some(Value::Null)`.
    #[serde(default, deserialize_with = "present_id")]
    pub id: Option<Value>,
    /// MCP method name (e.g., "initialize", "tools/list", "tools/call")
    pub method: String,
    /// Method-specific parameters as JSON value
    #[serde(default)]
    pub params: Option<Value>,
}

/// Keep an `"id": null` member distinct from a missing one.
fn present_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// JSON-RPC 2.0 response structure for MCP protocol.
///
/// Exactly one of `result` and `error` is present.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MCPResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MCPError>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MCPError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl MCPResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(MCPError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// Handle one message as received off the wire.
///
/// Bytes that are not valid UTF-8 cannot be JSON and get a parse error; the
/// `id` is still recovered from a lossy decoding when possible.
pub fn handle_bytes(state: &AppState, registry: &ToolRegistry, raw: &[u8]) -> Option<MCPResponse> {
    match std::str::from_utf8(raw) {
        Ok(text) => handle_message(state, registry, text),
        Err(e) => {
            warn!(error = %e, "rpc message is not valid UTF-8");
            let id = serde_json::from_str::<Value>(&String::from_utf8_lossy(raw))
                .ok()
                .and_then(|partial| partial.get("id").cloned());
            Some(MCPResponse::failure(
                id,
                PARSE_ERROR,
                format!("Parse error: {}", e),
            ))
        }
    }
}

/// Parse and handle one raw JSON-RPC message.
///
/// Returns `None` for notifications. A message that cannot be parsed yields a
/// parse error carrying the `id` if one can be recovered, `null` otherwise.
pub fn handle_message(state: &AppState, registry: &ToolRegistry, raw: &str) -> Option<MCPResponse> {
    match serde_json::from_str::<MCPRequest>(raw) {
        Ok(request) => handle_request(state, registry, request),
        Err(e) => {
            warn!(error = %e, "rpc parse error");
            // Try to parse as generic JSON to extract ID if present
            let id = serde_json::from_str::<Value>(raw)
                .ok()
                .and_then(|partial| partial.get("id").cloned());
            Some(MCPResponse::failure(
                id,
                PARSE_ERROR,
                format!("Parse error: {}", e),
            ))
        }
    }
}

/// Route a parsed request to its method handler.
pub fn handle_request(
    state: &AppState,
    registry: &ToolRegistry,
    request: MCPRequest,
) -> Option<MCPResponse> {
    // Notifications are one-way messages that don't require responses
    let Some(id) = request.id else {
        debug!(method = %request.method, "rpc notification");
        return None;
    };
    let id = Some(id);

    if request.jsonrpc != JSONRPC_VERSION {
        return Some(MCPResponse::failure(
            id,
            INVALID_REQUEST,
            format!("Invalid jsonrpc version: '{}'", request.jsonrpc),
        ));
    }

    debug!(method = %request.method, "rpc request");
    let response = match request.method.as_str() {
        "initialize" => handle_initialize(state, id),
        "ping" => MCPResponse::success(id, json!({})),
        "tools/list" => handle_tools_list(registry, id),
        "tools/call" => handle_tools_call(registry, id, request.params),
        _ => MCPResponse::failure(
            id,
            METHOD_NOT_FOUND,
            format!("Method not found: {}", request.method),
        ),
    };
    Some(response)
}

fn handle_initialize(state: &AppState, id: Option<Value>) -> MCPResponse {
    MCPResponse::success(
        id,
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": state.server_name,
                "version": state.server_version
            }
        }),
    )
}

fn handle_tools_list(registry: &ToolRegistry, id: Option<Value>) -> MCPResponse {
    MCPResponse::success(id, json!({ "tools": registry.tools }))
}

/// Execute a tool. Calculation failures are reported in-band with
/// `isError: true`; only protocol problems become JSON-RPC errors.
fn handle_tools_call(registry: &ToolRegistry, id: Option<Value>, params: Option<Value>) -> MCPResponse {
    let Some(params) = params else {
        return MCPResponse::failure(id, INVALID_PARAMS, "Invalid params");
    };

    let Some(tool_name) = params.get("name").and_then(Value::as_str) else {
        return MCPResponse::failure(id, INVALID_PARAMS, "Invalid params: missing tool name");
    };
    if !registry.handlers.contains_key(tool_name) {
        return MCPResponse::failure(
            id,
            METHOD_NOT_FOUND,
            format!("Unknown tool: {}", tool_name),
        );
    }

    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    match registry.call(tool_name, &arguments) {
        Ok(result) => MCPResponse::success(
            id,
            json!({
                "content": [
                    {
                        "type": "text",
                        "text": serde_json::to_string(&result).unwrap_or_default()
                    }
                ],
                "isError": false
            }),
        ),
        Err(e) => {
            warn!(tool = tool_name, kind = e.kind(), error = %e, "tool call failed");
            MCPResponse::success(
                id,
                json!({
                    "content": [
                        {
                            "type": "text",
                            "text": format!("Error: {}", e)
                        }
                    ],
                    "isError": true
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::FileConfig;
    use crate::core::registry::initialize_tools;

    fn state() -> AppState {
        AppState {
            server_name: "math-mcp-server".to_string(),
            server_version: "1.0.0".to_string(),
        }
    }

    fn roundtrip(raw: &str) -> Option<MCPResponse> {
        let registry = initialize_tools(&FileConfig::default());
        handle_message(&state(), &registry, raw)
    }

    #[test]
    fn initialize_reports_server_info() {
        let response = roundtrip(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#).unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "math-mcp-server");
        assert_eq!(response.id, Some(json!(1)));
    }

    #[test]
    fn null_id_is_a_request_not_a_notification() {
        let response = roundtrip(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).unwrap();
        assert_eq!(response.id, Some(Value::Null));
        assert!(response.error.is_none());
        assert_eq!(response.result, Some(json!({})));
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let registry = initialize_tools(&FileConfig::default());
        let response = handle_bytes(
            &state(),
            &registry,
            b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"\xff\"}",
        )
        .unwrap();
        assert_eq!(response.id, Some(json!(1)));
        assert_eq!(response.error.unwrap().code, PARSE_ERROR);
    }

    #[test]
    fn notifications_get_no_response() {
        assert!(roundtrip(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).is_none());
    }

    #[test]
    fn tools_list_uses_mcp_field_names() {
        let response = roundtrip(r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#).unwrap();
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 8);
        assert!(tools.iter().all(|t| t.get("inputSchema").is_some()));
    }

    #[test]
    fn tools_call_success_and_in_band_failure() {
        let ok = roundtrip(
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"add","arguments":{"a":2,"b":3}}}"#,
        )
        .unwrap()
        .result
        .unwrap();
        assert_eq!(ok["isError"], false);
        let text: Value = serde_json::from_str(ok["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(text["result"], 5.0);
        assert_eq!(text["message"], "2.0 + 3.0 = 5.0");

        let failed = roundtrip(
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"divide","arguments":{"a":1,"b":0}}}"#,
        )
        .unwrap()
        .result
        .unwrap();
        assert_eq!(failed["isError"], true);
        assert_eq!(failed["content"][0]["text"], "Error: Division by zero is not allowed");
    }

    #[test]
    fn protocol_errors() {
        let unknown_tool = roundtrip(
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"echo"}}"#,
        )
        .unwrap();
        assert_eq!(unknown_tool.error.unwrap().code, METHOD_NOT_FOUND);

        let no_params = roundtrip(r#"{"jsonrpc":"2.0","id":5,"method":"tools/call"}"#).unwrap();
        assert_eq!(no_params.error.unwrap().code, INVALID_PARAMS);

        let unknown_method = roundtrip(r#"{"jsonrpc":"2.0","id":6,"method":"resources/list"}"#).unwrap();
        assert_eq!(unknown_method.error.unwrap().code, METHOD_NOT_FOUND);

        let bad_version = roundtrip(r#"{"jsonrpc":"1.0","id":7,"method":"ping"}"#).unwrap();
        assert_eq!(bad_version.error.unwrap().code, INVALID_REQUEST);
    }

    #[test]
    fn parse_errors_recover_id_when_possible() {
        let with_id = roundtrip(r#"{"jsonrpc":"2.0","id":9}"#).unwrap();
        assert_eq!(with_id.id, Some(json!(9)));
        assert_eq!(with_id.error.unwrap().code, PARSE_ERROR);

        let garbage = roundtrip("not json").unwrap();
        assert_eq!(garbage.id, None);
        assert_eq!(garbage.error.unwrap().code, PARSE_ERROR);
    }
}
