//! Structured application error

use super::codes::ErrorCode;
use http::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// Raised by pure validation in this crate (status transitions, checkout
/// preconditions) and carried unchanged through the client error type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (offending ids, current status, ...)
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Look up a detail entry
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.as_ref().and_then(|d| d.get(key))
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create a not authenticated error
    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    /// Create a permission denied error
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PermissionDenied, msg)
    }

    /// Create a role required error
    pub fn role_required(required: impl Into<String>, actual: impl Into<String>) -> Self {
        let required = required.into();
        let actual = actual.into();
        Self::with_message(
            ErrorCode::RoleRequired,
            format!("Role '{}' required, session has '{}'", required, actual),
        )
        .with_detail("required", required)
        .with_detail("actual", actual)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::CartEmpty);
        assert_eq!(err.code, ErrorCode::CartEmpty);
        assert_eq!(err.message, "Cart is empty");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::validation("Missing product")
            .with_detail("cart_item_id", "c1")
            .with_detail("product_id", "p9");

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.detail("cart_item_id").unwrap(), "c1");
        assert_eq!(err.detail("product_id").unwrap(), "p9");
        assert!(err.detail("other").is_none());
    }

    #[test]
    fn test_convenience_constructors() {
        let err = AppError::not_found("Order");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Order not found");

        let err = AppError::role_required("farmer", "buyer");
        assert_eq!(err.code, ErrorCode::RoleRequired);
        assert_eq!(err.detail("required").unwrap(), "farmer");
        assert_eq!(err.http_status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_display_is_message() {
        let err = AppError::with_message(ErrorCode::OrderNotFound, "Order o-1 not found");
        assert_eq!(format!("{}", err), "Order o-1 not found");
    }
}
