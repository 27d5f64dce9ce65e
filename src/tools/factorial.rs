/// Factorial Tool
///
/// Results up to `20!` are exact 64-bit integers. Beyond that the result is a
/// double, which stays finite up to `170!`. Inputs above the configured
/// maximum are rejected rather than overflowing.
///
/// Configuration (kmcp.yaml):
/// ```yaml
/// tools:
///   factorial:
///     max_input: 100
/// ```

use std::collections::HashMap;

use serde_json::{Number, Value, json};
use tracing::warn;

use crate::core::error::CalcError;
use crate::core::registry::{CalculationResult, MCPTool, Operation, ToolHandler, ToolRegistry};
use crate::core::utils::{self, format_number};

/// Largest n whose factorial is a finite double.
pub const DEFAULT_MAX_INPUT: u64 = 170;

/// Largest n whose factorial fits in a u64.
const EXACT_LIMIT: u64 = 20;

/// `n!` for a non-negative integral `n` no greater than `max_input`.
pub fn factorial(n: f64, max_input: u64) -> Result<Number, CalcError> {
    if n < 0.0 || n.fract() != 0.0 {
        return Err(CalcError::domain(
            "Factorial is only defined for non-negative integers",
        ));
    }
    if n > max_input as f64 {
        return Err(CalcError::domain(format!(
            "Factorial input {} exceeds the maximum of {}",
            format_integer(n),
            max_input
        )));
    }

    let n = n as u64;
    if n <= EXACT_LIMIT {
        Ok(Number::from((1..=n).product::<u64>()))
    } else {
        let value = (2..=n).fold(1.0_f64, |acc, k| acc * k as f64);
        utils::real("factorial", value)
    }
}

/// Integral doubles below 2^53 print as plain integers, larger ones in
/// exponent form so a huge input cannot bloat the error message.
fn format_integer(n: f64) -> String {
    if n < 9_007_199_254_740_992.0 {
        format!("{}", n as u64)
    } else {
        format_number(n)
    }
}

/// Read `max_input` from the tool configuration, capped at the f64 limit.
fn max_input(config: &HashMap<String, Value>) -> u64 {
    match config.get("max_input") {
        None => DEFAULT_MAX_INPUT,
        Some(value) => match value.as_u64() {
            Some(n) if n <= DEFAULT_MAX_INPUT => n,
            Some(n) => {
                warn!(configured = n, max = DEFAULT_MAX_INPUT, "factorial max_input capped");
                DEFAULT_MAX_INPUT
            }
            None => {
                warn!(value = %value, "factorial max_input must be a non-negative integer");
                DEFAULT_MAX_INPUT
            }
        },
    }
}

pub fn register(registry: &mut ToolRegistry, config: &HashMap<String, Value>) {
    let max_input = max_input(config);

    let tool = MCPTool::new(
        Operation::Factorial,
        "Calculate factorial of a non-negative integer",
        json!({
            "type": "object",
            "properties": {
                "n": {
                    "type": "integer",
                    "description": "Non-negative integer to calculate factorial of",
                    "minimum": 0,
                    "maximum": max_input
                }
            },
            "required": ["n"]
        }),
    );

    let handler: ToolHandler = Box::new(move |args: &Value| {
        let n = utils::require_number(args, "n")?;
        let result = factorial(n, max_input)?;
        let rendered = match result.as_u64() {
            Some(exact) => exact.to_string(),
            None => format_number(result.as_f64().unwrap_or(f64::NAN)),
        };
        Ok(CalculationResult::new(
            result,
            format!("{}! = {}", n as u64, rendered),
        ))
    });

    registry.register(tool, handler);
}
