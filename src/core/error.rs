/// Calculation Error Types
///
/// Every failure a calculation can produce. Errors are mapped to a
/// `400 Bad Request` with a `{"error": "..."}` body at the HTTP boundary, and
/// to an `isError` tool result on the MCP JSON-RPC surface.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    /// A required field is missing or has the wrong type.
    #[error("{message}")]
    Validation { field: String, message: String },

    /// The `operation` value is not one of the supported tools.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// The operation is undefined or unrepresentable for the given inputs.
    #[error("{0}")]
    Domain(String),
}

impl CalcError {
    pub fn missing(field: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: format!("Parameter '{}' is required", field),
        }
    }

    pub fn not_a_number(field: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: format!("Parameter '{}' must be a number", field),
        }
    }

    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain(message.into())
    }

    /// Result of `operation` left the range of finite doubles.
    pub fn overflow(operation: &str) -> Self {
        Self::Domain(format!(
            "Result of {} overflows the representable range",
            operation
        ))
    }

    /// Short machine-readable kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::UnknownOperation(_) => "unknown_operation",
            Self::Domain(_) => "domain",
        }
    }
}

impl ResponseError for CalcError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}
