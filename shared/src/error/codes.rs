//! Unified error codes for the marketplace client
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Cart errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Product errors
//! - 7xxx: Notification channel errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so a UI layer can switch
/// on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Caller does not own the resource
    NotResourceOwner = 2003,

    // ==================== 3xxx: Cart ====================
    /// Cart has no items
    CartEmpty = 3001,
    /// Cart item not found
    CartItemNotFound = 3002,
    /// Cart item references a product that no longer resolves
    CartItemProductMissing = 3003,
    /// Quantity is not a positive integer
    InvalidQuantity = 3004,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order is already delivered
    OrderAlreadyDelivered = 4002,
    /// Requested status is not the next one in the chain
    InvalidStatusTransition = 4003,
    /// Shipping address is empty
    ShippingAddressRequired = 4004,
    /// Another checkout is still running for this session
    CheckoutInProgress = 4005,
    /// Payment was captured but no order was recorded
    OrderFailedAfterPayment = 4006,

    // ==================== 5xxx: Payment ====================
    /// Payment was declined
    PaymentFailed = 5001,
    /// Payment service could not be reached
    PaymentUnavailable = 5002,

    // ==================== 6xxx: Product ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product is not approved for sale
    ProductUnavailable = 6002,
    /// Requested quantity exceeds stock
    InsufficientStock = 6003,

    // ==================== 7xxx: Notification ====================
    /// Realtime channel is not connected
    ChannelDisconnected = 7001,
    /// Reconnection attempts exhausted
    ReconnectExhausted = 7002,
    /// Malformed realtime packet
    InvalidPacket = 7003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Network error
    NetworkError = 9002,
    /// Response could not be understood
    InvalidResponse = 9003,
    /// Local storage failure
    StorageError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::NotResourceOwner => "Resource belongs to another user",

            // Cart
            ErrorCode::CartEmpty => "Cart is empty",
            ErrorCode::CartItemNotFound => "Cart item not found",
            ErrorCode::CartItemProductMissing => "Cart item refers to an unknown product",
            ErrorCode::InvalidQuantity => "Quantity must be at least 1",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyDelivered => "Order has already been delivered",
            ErrorCode::InvalidStatusTransition => "Invalid order status transition",
            ErrorCode::ShippingAddressRequired => "Shipping address is required",
            ErrorCode::CheckoutInProgress => "A checkout is already in progress",
            ErrorCode::OrderFailedAfterPayment => {
                "Payment was captured but the order could not be created"
            }

            // Payment
            ErrorCode::PaymentFailed => "Payment failed",
            ErrorCode::PaymentUnavailable => "Payment service unavailable",

            // Product
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductUnavailable => "Product is not available",
            ErrorCode::InsufficientStock => "Insufficient stock",

            // Notification
            ErrorCode::ChannelDisconnected => "Realtime channel is disconnected",
            ErrorCode::ReconnectExhausted => "Realtime reconnection attempts exhausted",
            ErrorCode::InvalidPacket => "Malformed realtime packet",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::InvalidResponse => "Invalid response from server",
            ErrorCode::StorageError => "Local storage error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),

            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::NotResourceOwner),

            3001 => Ok(ErrorCode::CartEmpty),
            3002 => Ok(ErrorCode::CartItemNotFound),
            3003 => Ok(ErrorCode::CartItemProductMissing),
            3004 => Ok(ErrorCode::InvalidQuantity),

            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderAlreadyDelivered),
            4003 => Ok(ErrorCode::InvalidStatusTransition),
            4004 => Ok(ErrorCode::ShippingAddressRequired),
            4005 => Ok(ErrorCode::CheckoutInProgress),
            4006 => Ok(ErrorCode::OrderFailedAfterPayment),

            5001 => Ok(ErrorCode::PaymentFailed),
            5002 => Ok(ErrorCode::PaymentUnavailable),

            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductUnavailable),
            6003 => Ok(ErrorCode::InsufficientStock),

            7001 => Ok(ErrorCode::ChannelDisconnected),
            7002 => Ok(ErrorCode::ReconnectExhausted),
            7003 => Ok(ErrorCode::InvalidPacket),

            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::NetworkError),
            9003 => Ok(ErrorCode::InvalidResponse),
            9004 => Ok(ErrorCode::StorageError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}
