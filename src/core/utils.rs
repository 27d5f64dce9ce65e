/// Utility Functions for Tool Arguments and Number Rendering
///
/// Tool handlers receive their arguments as raw JSON. These helpers pull typed
/// operands out of that JSON with field-named validation errors, and render
/// numbers for the human-readable `message` of a calculation result.

use serde_json::{Number, Value};

use crate::core::error::CalcError;

/// Extract a required numeric field from tool arguments.
///
/// A field that is absent or `null` is reported as missing; any other
/// non-number (string, bool, object) is reported as not a number.
///
/// # Example
/// ```rust
/// use math_mcp_server::core::utils::require_number;
/// let args = serde_json::json!({ "a": 156, "b": "x" });
/// assert_eq!(require_number(&args, "a").unwrap(), 156.0);
/// assert!(require_number(&args, "b").is_err());
/// assert!(require_number(&args, "c").is_err());
/// ```
pub fn require_number(args: &Value, field: &str) -> Result<f64, CalcError> {
    match args.get(field) {
        None | Some(Value::Null) => Err(CalcError::missing(field)),
        Some(value) => value.as_f64().ok_or_else(|| CalcError::not_a_number(field)),
    }
}

/// Convert a finite double into a JSON number.
///
/// JSON has no representation for infinities or NaN, so a non-finite value
/// becomes an overflow error attributed to `operation`.
pub fn real(operation: &str, value: f64) -> Result<Number, CalcError> {
    Number::from_f64(value).ok_or_else(|| CalcError::overflow(operation))
}

/// Render a double the way float reprs are conventionally printed.
///
/// Integral values keep one decimal place (`156.0`), other values use the
/// shortest round-trip form (`2.5`), and magnitudes outside `[1e-4, 1e16)`
/// switch to exponent notation with a signed two-digit exponent (`1e+16`).
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let repr = format!("{:e}", value);
        return match repr.split_once('e') {
            Some((mantissa, exponent)) => match exponent.parse::<i32>() {
                Ok(exp) => format!(
                    "{}e{}{:02}",
                    mantissa,
                    if exp < 0 { '-' } else { '+' },
                    exp.abs()
                ),
                Err(_) => repr,
            },
            None => repr,
        };
    }

    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
