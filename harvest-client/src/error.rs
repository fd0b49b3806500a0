//! Client error types

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required; the session has been cleared
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error reported by the service, verbatim
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Token storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Structured error raised locally
    #[error(transparent)]
    App(#[from] AppError),
}

impl ClientError {
    /// Map to the unified error code
    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::Http(_) => ErrorCode::NetworkError,
            ClientError::InvalidResponse(_) => ErrorCode::InvalidResponse,
            ClientError::Unauthorized => ErrorCode::NotAuthenticated,
            ClientError::Forbidden(_) => ErrorCode::PermissionDenied,
            ClientError::NotFound(_) => ErrorCode::NotFound,
            ClientError::Validation(_) => ErrorCode::ValidationFailed,
            ClientError::Internal(_) => ErrorCode::InternalError,
            ClientError::Serialization(_) => ErrorCode::InvalidResponse,
            ClientError::Storage(_) => ErrorCode::StorageError,
            ClientError::Config(_) => ErrorCode::ConfigError,
            ClientError::App(e) => e.code,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
