/// Tool Registry
///
/// The registry holds the static list of tool descriptors served by
/// `/mcp/tools` and `tools/list`, plus a map from tool name to the handler
/// that performs the calculation. It is built once at startup by
/// [`initialize_tools`] and shared read-only across workers behind an `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Number, Value};

use crate::core::config::FileConfig;
use crate::core::error::CalcError;
use crate::tools;

/// The eight supported operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Sqrt,
    Abs,
    Factorial,
}

impl Operation {
    /// All operations in listing order.
    pub const ALL: [Operation; 8] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
        Operation::Power,
        Operation::Sqrt,
        Operation::Abs,
        Operation::Factorial,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
            Operation::Power => "power",
            Operation::Sqrt => "sqrt",
            Operation::Abs => "abs",
            Operation::Factorial => "factorial",
        }
    }
}

impl FromStr for Operation {
    type Err = CalcError;

    /// Case-insensitive lookup; the error carries the lowercased name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.to_lowercase();
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == name)
            .ok_or(CalcError::UnknownOperation(name))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResult {
    /// Numeric result; always finite
    pub result: Number,
    /// Human-readable summary such as `156.0 × 234.0 = 36504.0`
    pub message: String,
}

impl CalculationResult {
    pub fn new(result: impl Into<Number>, message: impl Into<String>) -> Self {
        Self {
            result: result.into(),
            message: message.into(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.result.as_f64()
    }
}

/// MCP tool definition structure.
///
/// Serialized with the MCP field name `inputSchema` wherever tools are listed.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MCPTool {
    /// Unique tool identifier, equal to the operation name
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema defining the tool's input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl MCPTool {
    pub fn new(operation: Operation, description: &str, input_schema: Value) -> Self {
        Self {
            name: operation.as_str().to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// Tool handler function type definition.
///
/// Handlers take the raw JSON arguments and return a calculation result or a
/// typed error. They must be Send + Sync to be shared across HTTP workers.
pub type ToolHandler = Box<dyn Fn(&Value) -> Result<CalculationResult, CalcError> + Send + Sync>;

/// Registry of available MCP tools.
pub struct ToolRegistry {
    /// List of all registered tools, in registration order
    pub tools: Vec<MCPTool>,
    /// Map of tool names to their handler functions
    pub handlers: HashMap<String, ToolHandler>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Register a tool with the registry.
    pub fn register(&mut self, tool: MCPTool, handler: ToolHandler) {
        let name = tool.name.clone();
        self.tools.push(tool);
        self.handlers.insert(name, handler);
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run the named tool against `args`.
    pub fn call(&self, name: &str, args: &Value) -> Result<CalculationResult, CalcError> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| CalcError::UnknownOperation(name.to_string()))?;
        handler(args)
    }

    /// Validate a `/calculate` body and dispatch it to its tool.
    ///
    /// The body must be a JSON object with a string `operation` field; the
    /// operand fields are read from the same object by the tool handler.
    pub fn calculate(&self, body: &Value) -> Result<CalculationResult, CalcError> {
        if !body.is_object() {
            return Err(CalcError::invalid(
                "body",
                "Request body must be a JSON object",
            ));
        }
        let operation: Operation = match body.get("operation") {
            None | Some(Value::Null) => return Err(CalcError::missing("operation")),
            Some(Value::String(name)) => name.parse()?,
            Some(_) => {
                return Err(CalcError::invalid(
                    "operation",
                    "Parameter 'operation' must be a string",
                ));
            }
        };
        self.call(operation.as_str(), body)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize and register all tools.
///
/// Registration order is the listing order clients see.
pub fn initialize_tools(config: &FileConfig) -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    tools::arithmetic::register(&mut registry);
    tools::exponent::register(&mut registry);
    tools::abs::register(&mut registry);
    tools::factorial::register(&mut registry, &config.tool_config("factorial"));

    Arc::new(registry)
}
