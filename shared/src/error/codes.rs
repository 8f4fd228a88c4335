//! Unified error codes for the till workspace
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Menu errors
//! - 7xxx: Table errors
//! - 8xxx: Cash session errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so a UI layer can map them
/// to localized strings without parsing messages.
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
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// Remote store rejected the credentials
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Session has expired and could not be refreshed
    SessionExpired = 1005,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has already been paid
    OrderAlreadyPaid = 4002,
    /// Order line not found
    OrderItemNotFound = 4006,
    /// Order has no lines
    OrderEmpty = 4007,
    /// No table is selected
    NoTableSelected = 4010,

    // ==================== 5xxx: Payment ====================
    /// Payment could not be recorded
    PaymentFailed = 5001,
    /// Tendered amount does not cover the total
    PaymentInsufficientAmount = 5002,
    /// The table is being paid, edits wait until it settles
    PaymentInProgress = 5003,
    /// Refund amount must be negative
    RefundAmountInvalid = 5006,
    /// Split customer did not tender enough for the selected items
    SplitInsufficientAmount = 5010,
    /// Split unit is unknown or already claimed
    SplitItemUnavailable = 5011,
    /// Split payment already settled in full
    SplitAlreadyComplete = 5012,

    // ==================== 6xxx: Menu ====================
    /// Menu item not found
    MenuItemNotFound = 6001,
    /// Menu item price is invalid
    MenuItemInvalidPrice = 6002,
    /// Menu item already exists in the category
    MenuItemExists = 6003,
    /// Category not found
    CategoryNotFound = 6101,
    /// Category name already exists
    CategoryNameExists = 6103,

    // ==================== 7xxx: Table ====================
    /// Table not found
    TableNotFound = 7001,
    /// Table name already exists
    TableNameExists = 7003,
    /// Tables still have unpaid orders
    TableHasOrders = 7104,

    // ==================== 8xxx: Cash session ====================
    /// No cash session is active
    CashSessionNotActive = 8001,
    /// A cash session is already active
    CashSessionAlreadyActive = 8002,
    /// No cash session found
    CashSessionNotFound = 8003,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Remote store error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Request timed out
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,

    // ==================== 94xx: Local storage ====================
    /// Disk full
    StorageFull = 9401,
    /// Local cache is corrupted
    StorageCorrupted = 9403,
    /// Local cache busy
    SystemBusy = 9404,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "Not authenticated with the remote store",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::SessionExpired => "Session has expired, please reload",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyPaid => "Order has already been paid",
            ErrorCode::OrderItemNotFound => "Order item not found",
            ErrorCode::OrderEmpty => "There are no items in this order",
            ErrorCode::NoTableSelected => "Please select a table first",

            // Payment
            ErrorCode::PaymentFailed => "Payment could not be recorded",
            ErrorCode::PaymentInsufficientAmount => "The amount paid is not enough",
            ErrorCode::PaymentInProgress => "A payment for this table is in progress",
            ErrorCode::RefundAmountInvalid => "The refund amount must be negative",
            ErrorCode::SplitInsufficientAmount => {
                "The customer has not paid enough for the selected items"
            }
            ErrorCode::SplitItemUnavailable => "Item is not available for this customer",
            ErrorCode::SplitAlreadyComplete => "The split payment is already complete",

            // Menu
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::MenuItemInvalidPrice => "Menu item price is invalid",
            ErrorCode::MenuItemExists => "Menu item already exists",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategoryNameExists => "Category already exists",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableNameExists => "Table name already exists",
            ErrorCode::TableHasOrders => "Cannot close the session while tables are unpaid",

            // Cash session
            ErrorCode::CashSessionNotActive => "The cash session is not active",
            ErrorCode::CashSessionAlreadyActive => "A cash session is already active",
            ErrorCode::CashSessionNotFound => "No cash session found",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::DatabaseError => "An error occurred, please try again",
            ErrorCode::NetworkError => "Network error, please try again",
            ErrorCode::TimeoutError => "Request timed out, please try again",
            ErrorCode::ConfigError => "Configuration error",

            // Local storage
            ErrorCode::StorageFull => "Local storage is full",
            ErrorCode::StorageCorrupted => "Local storage is corrupted",
            ErrorCode::SystemBusy => "System busy, please try again",
        }
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
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1005 => Ok(ErrorCode::SessionExpired),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderAlreadyPaid),
            4006 => Ok(ErrorCode::OrderItemNotFound),
            4007 => Ok(ErrorCode::OrderEmpty),
            4010 => Ok(ErrorCode::NoTableSelected),

            // Payment
            5001 => Ok(ErrorCode::PaymentFailed),
            5002 => Ok(ErrorCode::PaymentInsufficientAmount),
            5003 => Ok(ErrorCode::PaymentInProgress),
            5006 => Ok(ErrorCode::RefundAmountInvalid),
            5010 => Ok(ErrorCode::SplitInsufficientAmount),
            5011 => Ok(ErrorCode::SplitItemUnavailable),
            5012 => Ok(ErrorCode::SplitAlreadyComplete),

            // Menu
            6001 => Ok(ErrorCode::MenuItemNotFound),
            6002 => Ok(ErrorCode::MenuItemInvalidPrice),
            6003 => Ok(ErrorCode::MenuItemExists),
            6101 => Ok(ErrorCode::CategoryNotFound),
            6103 => Ok(ErrorCode::CategoryNameExists),

            // Table
            7001 => Ok(ErrorCode::TableNotFound),
            7003 => Ok(ErrorCode::TableNameExists),
            7104 => Ok(ErrorCode::TableHasOrders),

            // Cash session
            8001 => Ok(ErrorCode::CashSessionNotActive),
            8002 => Ok(ErrorCode::CashSessionAlreadyActive),
            8003 => Ok(ErrorCode::CashSessionNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            // Local storage
            9401 => Ok(ErrorCode::StorageFull),
            9403 => Ok(ErrorCode::StorageCorrupted),
            9404 => Ok(ErrorCode::SystemBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::SessionExpired.code(), 1005);
        assert_eq!(ErrorCode::NoTableSelected.code(), 4010);
        assert_eq!(ErrorCode::PaymentInsufficientAmount.code(), 5002);
        assert_eq!(ErrorCode::SplitInsufficientAmount.code(), 5010);
        assert_eq!(ErrorCode::MenuItemExists.code(), 6003);
        assert_eq!(ErrorCode::TableHasOrders.code(), 7104);
        assert_eq!(ErrorCode::CashSessionNotActive.code(), 8001);
        assert_eq!(ErrorCode::StorageCorrupted.code(), 9403);
    }

    #[test]
    fn test_try_from_roundtrip_every_code() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::NotAuthenticated,
            ErrorCode::OrderEmpty,
            ErrorCode::RefundAmountInvalid,
            ErrorCode::CategoryNotFound,
            ErrorCode::TableNotFound,
            ErrorCode::CashSessionAlreadyActive,
            ErrorCode::NetworkError,
            ErrorCode::SystemBusy,
        ];

        for code in codes {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
            let json = serde_json::to_string(&code).unwrap();
            let parsed: ErrorCode = serde_json::from_str(&json).unwrap();
            assert_eq!(code, parsed);
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
        assert!(serde_json::from_str::<ErrorCode>("1234").is_err());
    }

    #[test]
    fn test_display_and_message() {
        assert_eq!(format!("{}", ErrorCode::OrderNotFound), "4001");
        assert_eq!(ErrorCode::OrderNotFound.message(), "Order not found");
        assert_eq!(
            format!("{}", InvalidErrorCode(999)),
            "invalid error code: 999"
        );
    }
}
