/// Core Server Framework Module
///
/// This module contains the core server implementation including:
/// - config.rs: environment and YAML configuration
/// - error.rs: calculation error taxonomy and its HTTP mapping
/// - registry.rs: tool descriptors, handlers and request dispatch
/// - rpc.rs: MCP JSON-RPC 2.0 protocol handling
/// - server.rs: HTTP and STDIO transports
/// - utils.rs: argument extraction and number rendering

pub mod config;
pub mod error;
pub mod registry;
pub mod rpc;
pub mod server;
pub mod utils;
