//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the HTTP status code that corresponds to this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            Self::NotFound
            | Self::CartItemNotFound
            | Self::OrderNotFound
            | Self::ProductNotFound => StatusCode::NOT_FOUND,

            Self::AlreadyExists | Self::CheckoutInProgress => StatusCode::CONFLICT,

            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,

            Self::PermissionDenied | Self::RoleRequired | Self::NotResourceOwner => {
                StatusCode::FORBIDDEN
            }

            Self::PaymentFailed => StatusCode::PAYMENT_REQUIRED,

            Self::NetworkError
            | Self::PaymentUnavailable
            | Self::ChannelDisconnected
            | Self::ReconnectExhausted => StatusCode::SERVICE_UNAVAILABLE,

            Self::InternalError
            | Self::InvalidResponse
            | Self::StorageError
            | Self::ConfigError
            | Self::OrderFailedAfterPayment
            | Self::Unknown => StatusCode::INTERNAL_SERVER_ERROR,

            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Classify a non-success response status from the marketplace service
    pub fn from_http_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::NotAuthenticated,
            StatusCode::FORBIDDEN => Self::PermissionDenied,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::CONFLICT => Self::AlreadyExists,
            StatusCode::PAYMENT_REQUIRED => Self::PaymentFailed,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Self::ValidationFailed,
            s if s.is_success() => Self::Success,
            s if s.is_client_error() => Self::InvalidRequest,
            _ => Self::InternalError,
        }
    }
}
