//! Math MCP Server
//!
//! A stateless calculator service exposing eight arithmetic tools (add,
//! subtract, multiply, divide, power, sqrt, abs, factorial) over plain HTTP
//! and the MCP JSON-RPC protocol.

pub mod core;
pub mod tools;
