/// Absolute Value Tool
///
/// Returns the magnitude of `value`. Defined for every finite input, so the
/// only failure is a missing or non-numeric `value` parameter.

use serde_json::{Value, json};

use crate::core::registry::{CalculationResult, MCPTool, Operation, ToolHandler, ToolRegistry};
use crate::core::utils::{self, format_number};

pub fn abs(value: f64) -> f64 {
    value.abs()
}

pub fn register(registry: &mut ToolRegistry) {
    let tool = MCPTool::new(
        Operation::Abs,
        "Calculate absolute value of a number",
        json!({
            "type": "object",
            "properties": {
                "value": {
                    "type": "number",
                    "description": "Number to calculate absolute value of"
                }
            },
            "required": ["value"]
        }),
    );

    let handler: ToolHandler = Box::new(|args: &Value| {
        let value = utils::require_number(args, "value")?;
        let result = abs(value);
        Ok(CalculationResult::new(
            utils::real("abs", result)?,
            format!("|{}| = {}", format_number(value), format_number(result)),
        ))
    });

    registry.register(tool, handler);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abs_is_sign_agnostic() {
        assert_eq!(abs(-42.0), 42.0);
        assert_eq!(abs(42.0), 42.0);
        assert_eq!(abs(0.0), 0.0);
    }

    #[test]
    fn handler_message() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let result = registry.call("abs", &json!({ "value": -42 })).unwrap();
        assert_eq!(result.as_f64(), Some(42.0));
        assert_eq!(result.message, "|-42.0| = 42.0");
    }
}
