/// Power and Square Root Tools
///
/// `power` raises `base` to `exponent` and `sqrt` takes the root of `value`.
/// Both are defined only where the result is a finite real number: a negative
/// `value` for sqrt, a negative base with a fractional exponent, an overflowing
/// power, or zero raised to a negative exponent are all domain errors.

use serde_json::{Value, json};

use crate::core::error::CalcError;
use crate::core::registry::{CalculationResult, MCPTool, Operation, ToolHandler, ToolRegistry};
use crate::core::utils::{self, format_number};

/// `base` raised to `exponent`.
///
/// Fails when the result leaves the reals (negative base with a fractional
/// exponent) or the finite range (overflow, or zero to a negative power).
pub fn power(base: f64, exponent: f64) -> Result<f64, CalcError> {
    let result = base.powf(exponent);
    if !result.is_finite() {
        return Err(CalcError::domain(format!(
            "Result of {} ^ {} is not a finite real number",
            format_number(base),
            format_number(exponent)
        )));
    }
    Ok(result)
}

pub fn sqrt(value: f64) -> Result<f64, CalcError> {
    if value < 0.0 {
        return Err(CalcError::domain(
            "Cannot calculate square root of negative number",
        ));
    }
    Ok(value.sqrt())
}

pub fn register(registry: &mut ToolRegistry) {
    let tool = MCPTool::new(
        Operation::Power,
        "Raise first number to the power of second number",
        json!({
            "type": "object",
            "properties": {
                "base": { "type": "number", "description": "Base number" },
                "exponent": { "type": "number", "description": "Exponent" }
            },
            "required": ["base", "exponent"]
        }),
    );
    let handler: ToolHandler = Box::new(|args: &Value| {
        let base = utils::require_number(args, "base")?;
        let exponent = utils::require_number(args, "exponent")?;
        let result = power(base, exponent)?;
        Ok(CalculationResult::new(
            utils::real("power", result)?,
            format!(
                "{} ^ {} = {}",
                format_number(base),
                format_number(exponent),
                format_number(result)
            ),
        ))
    });
    registry.register(tool, handler);

    let tool = MCPTool::new(
        Operation::Sqrt,
        "Calculate square root of a number",
        json!({
            "type": "object",
            "properties": {
                "value": {
                    "type": "number",
                    "description": "Number to calculate square root of (must be non-negative)"
                }
            },
            "required": ["value"]
        }),
    );
    let handler: ToolHandler = Box::new(|args: &Value| {
        let value = utils::require_number(args, "value")?;
        let result = sqrt(value)?;
        Ok(CalculationResult::new(
            utils::real("sqrt", result)?,
            format!("√{} = {}", format_number(value), format_number(result)),
        ))
    });
    registry.register(tool, handler);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_of_two() {
        assert_eq!(power(2.0, 10.0), Ok(1024.0));
        assert_eq!(power(-3.0, 3.0), Ok(-27.0));
        assert_eq!(power(2.0, -1.0), Ok(0.5));
        assert_eq!(power(0.0, 0.0), Ok(1.0));
    }

    #[test]
    fn power_rejects_overflow_and_non_real_results() {
        assert!(matches!(power(10.0, 400.0), Err(CalcError::Domain(_))));
        assert!(matches!(power(-8.0, 0.5), Err(CalcError::Domain(_))));
        assert!(matches!(power(0.0, -1.0), Err(CalcError::Domain(_))));
        assert_eq!(
            power(10.0, 400.0).unwrap_err().to_string(),
            "Result of 10.0 ^ 400.0 is not a finite real number"
        );
    }

    #[test]
    fn sqrt_rejects_negative_values() {
        for value in [-1.0, -0.001, -1e300] {
            assert_eq!(
                sqrt(value),
                Err(CalcError::domain(
                    "Cannot calculate square root of negative number"
                ))
            );
        }
    }

    #[test]
    fn sqrt_squares_back() {
        for value in [0.0, 1.0, 2.0, 625.0, 0.3, 1e10, 123456.789] {
            let root = sqrt(value).unwrap();
            let tolerance = f64::EPSILON * value.max(1.0) * 4.0;
            assert!((root * root - value).abs() <= tolerance, "value={value}");
        }
        assert_eq!(sqrt(625.0), Ok(25.0));
    }

    #[test]
    fn handlers_format_messages() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);

        let result = registry
            .call("power", &json!({ "base": 2, "exponent": 10 }))
            .unwrap();
        assert_eq!(result.message, "2.0 ^ 10.0 = 1024.0");

        let result = registry.call("sqrt", &json!({ "value": 625 })).unwrap();
        assert_eq!(result.as_f64(), Some(25.0));
        assert_eq!(result.message, "√625.0 = 25.0");

        assert_eq!(
            registry.call("power", &json!({ "base": 2 })),
            Err(CalcError::missing("exponent"))
        );
    }
}
