//! Unified error codes for the Masa platform
//!
//! This module defines all error codes used across the server and frontend.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Menu errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
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
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Status transition not allowed by the state machine
    InvalidTransition = 4002,
    /// Concurrent transition lost the compare-and-swap race
    StatusConflict = 4003,
    /// Order has no line items
    OrderEmpty = 4004,
    /// Too many line items on a single order
    TooManyLines = 4005,
    /// Delivery order without a delivery address
    DeliveryAddressRequired = 4006,

    // ==================== 5xxx: Payment ====================
    /// Payment processing failed
    PaymentFailed = 5001,
    /// Computed amount does not match the provider intent
    AmountMismatch = 5002,
    /// Payment intent not found at the provider
    IntentNotFound = 5003,
    /// Webhook signature or payload invalid
    WebhookInvalid = 5004,

    // ==================== 6xxx: Menu ====================
    /// Menu item not found
    MenuItemNotFound = 6001,
    /// Menu item is currently unavailable
    MenuItemUnavailable = 6002,
    /// Menu item has an invalid price
    MenuItemInvalidPrice = 6003,
    /// Quantity is zero, negative, or exceeds the per-line cap
    InvalidQuantity = 6004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error (transient, client can retry)
    NetworkError = 9003,
    /// Timeout error (transient, client can retry)
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default human-readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::RequiredField => "Required field missing",
            Self::ValueOutOfRange => "Value out of range",

            Self::OrderNotFound => "Order not found",
            Self::InvalidTransition => "Invalid order status transition",
            Self::StatusConflict => "Order status changed concurrently",
            Self::OrderEmpty => "Order has no items",
            Self::TooManyLines => "Too many items on order",
            Self::DeliveryAddressRequired => "Delivery address is required",

            Self::PaymentFailed => "Payment processing failed",
            Self::AmountMismatch => "Payment amount mismatch",
            Self::IntentNotFound => "Payment intent not found",
            Self::WebhookInvalid => "Invalid webhook payload",

            Self::MenuItemNotFound => "Menu item not found",
            Self::MenuItemUnavailable => "Menu item is unavailable",
            Self::MenuItemInvalidPrice => "Menu item has an invalid price",
            Self::InvalidQuantity => "Invalid quantity",

            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::NetworkError => "Network error",
            Self::TimeoutError => "Request timed out",
            Self::ConfigError => "Configuration error",
        }
    }

    /// Whether this code represents a system-level failure (9xxx range)
    pub fn is_system(&self) -> bool {
        self.code() >= 9000
    }

    /// Whether a caller may retry the same request (transient infrastructure)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::TimeoutError | Self::DatabaseError
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

/// Error returned when a u16 does not map to a known [`ErrorCode`]
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            4 => Self::AlreadyExists,
            5 => Self::InvalidRequest,
            7 => Self::RequiredField,
            8 => Self::ValueOutOfRange,

            4001 => Self::OrderNotFound,
            4002 => Self::InvalidTransition,
            4003 => Self::StatusConflict,
            4004 => Self::OrderEmpty,
            4005 => Self::TooManyLines,
            4006 => Self::DeliveryAddressRequired,

            5001 => Self::PaymentFailed,
            5002 => Self::AmountMismatch,
            5003 => Self::IntentNotFound,
            5004 => Self::WebhookInvalid,

            6001 => Self::MenuItemNotFound,
            6002 => Self::MenuItemUnavailable,
            6003 => Self::MenuItemInvalidPrice,
            6004 => Self::InvalidQuantity,

            9001 => Self::InternalError,
            9002 => Self::DatabaseError,
            9003 => Self::NetworkError,
            9004 => Self::TimeoutError,
            9005 => Self::ConfigError,

            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}
