/// Arithmetic Tools
///
/// The four binary operations on `a` and `b`: add, subtract, multiply and
/// divide. Only division has a domain restriction (`b != 0`); any of them can
/// still overflow to infinity, which is rejected when the result is encoded.

use serde_json::{Value, json};

use crate::core::error::CalcError;
use crate::core::registry::{CalculationResult, MCPTool, Operation, ToolHandler, ToolRegistry};
use crate::core::utils::{self, format_number};

pub fn add(a: f64, b: f64) -> f64 {
    a + b
}

pub fn subtract(a: f64, b: f64) -> f64 {
    a - b
}

pub fn multiply(a: f64, b: f64) -> f64 {
    a * b
}

pub fn divide(a: f64, b: f64) -> Result<f64, CalcError> {
    if b == 0.0 {
        return Err(CalcError::domain("Division by zero is not allowed"));
    }
    Ok(a / b)
}

/// Register add, subtract, multiply and divide.
pub fn register(registry: &mut ToolRegistry) {
    register_binary(
        registry,
        Operation::Add,
        "Add two numbers together",
        ("First number", "Second number"),
        "+",
        |a, b| Ok(add(a, b)),
    );
    register_binary(
        registry,
        Operation::Subtract,
        "Subtract second number from first number",
        ("First number", "Second number to subtract"),
        "-",
        |a, b| Ok(subtract(a, b)),
    );
    register_binary(
        registry,
        Operation::Multiply,
        "Multiply two numbers together",
        ("First number", "Second number"),
        "×",
        |a, b| Ok(multiply(a, b)),
    );
    register_binary(
        registry,
        Operation::Divide,
        "Divide first number by second number",
        ("Numerator", "Denominator (cannot be zero)"),
        "÷",
        divide,
    );
}

fn register_binary(
    registry: &mut ToolRegistry,
    operation: Operation,
    description: &str,
    (a_description, b_description): (&str, &str),
    symbol: &'static str,
    apply: fn(f64, f64) -> Result<f64, CalcError>,
) {
    let tool = MCPTool::new(
        operation,
        description,
        json!({
            "type": "object",
            "properties": {
                "a": { "type": "number", "description": a_description },
                "b": { "type": "number", "description": b_description }
            },
            "required": ["a", "b"]
        }),
    );

    let handler: ToolHandler = Box::new(move |args: &Value| {
        let a = utils::require_number(args, "a")?;
        let b = utils::require_number(args, "b")?;
        let result = apply(a, b)?;
        let number = utils::real(operation.as_str(), result)?;
        Ok(CalculationResult::new(
            number,
            format!(
                "{} {} {} = {}",
                format_number(a),
                symbol,
                format_number(b),
                format_number(result)
            ),
        ))
    });

    registry.register(tool, handler);
}
