//! 统一错误处理
//!
//! [`RegisterError`] covers every way a register operation can refuse or fail:
//!
//! | 分类 | 说明 | 用户提示 |
//! |------|------|----------|
//! | 校验错误 | 金额不足、退款金额非负、必填项为空 | Notice |
//! | 前置条件 | 无收银班次、未选桌台、仍有未结桌台 | Notice |
//! | 远程 I/O | 存储不可用、请求被拒 | Alert |
//! | 会话过期 | 刷新会话失败 | SessionExpired |
//! | 本地缓存 | redb 读写失败 | Alert |
//!
//! None of them mutate state: the caller may retry the same action.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;
use till_client::StoreError;

use crate::orders::cache::CacheError;

/// Register errors
#[derive(Debug, Error)]
pub enum RegisterError {
    // ========== 前置条件 ==========
    #[error("The cash session is not active")]
    NoActiveSession,

    #[error("A cash session is already active")]
    SessionAlreadyActive,

    #[error("No cash session found")]
    NoSessionFound,

    #[error("Please select a table first")]
    NoTableSelected,

    #[error("Cannot close the session while {count} table(s) are unpaid")]
    OpenTables { count: usize },

    #[error("Payment in progress for table {0}")]
    PaymentInProgress(String),

    // ========== 校验错误 ==========
    #[error("There are no items in the order")]
    EmptyOrder,

    #[error("Insufficient amount: tendered {tendered}, due {due}")]
    InsufficientAmount { tendered: Decimal, due: Decimal },

    #[error("Split amount insufficient: tendered {tendered}, selected items {due}")]
    SplitInsufficientAmount { tendered: Decimal, due: Decimal },

    #[error("Item unit not available: {0}")]
    UnitUnavailable(String),

    #[error("Split payment already complete")]
    SplitComplete,

    #[error("Order line not found: {0}")]
    LineNotFound(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Invalid refund: {0}")]
    InvalidRefund(String),

    #[error("{}", .0.message)]
    Invalid(AppError),

    // ========== I/O ==========
    #[error("Remote store error: {0}")]
    Remote(#[from] StoreError),

    #[error("Session expired, please reload")]
    SessionExpired,

    #[error("Local cache error: {0}")]
    Cache(#[from] CacheError),
}

pub type RegisterResult<T> = Result<T, RegisterError>;

/// 用户提示级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Short-lived toast, nothing went wrong on our side
    Notice,
    /// Retry-prompting alert
    Alert,
    /// Hard "please reload" state
    Fatal,
}

impl RegisterError {
    /// 错误码（前端负责本地化）
    pub fn code(&self) -> ErrorCode {
        match self {
            RegisterError::NoActiveSession => ErrorCode::CashSessionNotActive,
            RegisterError::SessionAlreadyActive => ErrorCode::CashSessionAlreadyActive,
            RegisterError::NoSessionFound => ErrorCode::CashSessionNotFound,
            RegisterError::NoTableSelected => ErrorCode::NoTableSelected,
            RegisterError::OpenTables { .. } => ErrorCode::TableHasOrders,
            RegisterError::PaymentInProgress(_) => ErrorCode::PaymentInProgress,
            RegisterError::EmptyOrder => ErrorCode::OrderEmpty,
            RegisterError::InsufficientAmount { .. } => ErrorCode::PaymentInsufficientAmount,
            RegisterError::SplitInsufficientAmount { .. } => ErrorCode::SplitInsufficientAmount,
            RegisterError::UnitUnavailable(_) => ErrorCode::SplitItemUnavailable,
            RegisterError::SplitComplete => ErrorCode::SplitAlreadyComplete,
            RegisterError::LineNotFound(_) => ErrorCode::OrderItemNotFound,
            RegisterError::TableNotFound(_) => ErrorCode::TableNotFound,
            RegisterError::InvalidRefund(_) => ErrorCode::RefundAmountInvalid,
            RegisterError::Invalid(err) => err.code,
            RegisterError::Remote(err) => match err {
                StoreError::Unauthorized(_) => ErrorCode::NotAuthenticated,
                StoreError::Transient(_) => ErrorCode::NetworkError,
                StoreError::Validation(_) => ErrorCode::InvalidRequest,
                StoreError::Decode(_) => ErrorCode::InvalidFormat,
            },
            RegisterError::SessionExpired => ErrorCode::SessionExpired,
            RegisterError::Cache(err) => classify_cache_error(err),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            RegisterError::Remote(_) | RegisterError::Cache(_) => Severity::Alert,
            RegisterError::SessionExpired => Severity::Fatal,
            _ => Severity::Notice,
        }
    }

    /// Refused before anything was attempted
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            RegisterError::NoActiveSession
                | RegisterError::SessionAlreadyActive
                | RegisterError::NoSessionFound
                | RegisterError::NoTableSelected
                | RegisterError::OpenTables { .. }
                | RegisterError::PaymentInProgress(_)
        )
    }

    /// Input the user can correct
    pub fn is_validation(&self) -> bool {
        self.severity() == Severity::Notice && !self.is_precondition()
    }
}

/// 将缓存错误转换为错误码
fn classify_cache_error(e: &CacheError) -> ErrorCode {
    if let CacheError::Serialization(_) = e {
        return ErrorCode::StorageCorrupted;
    }

    // redb 错误通过字符串匹配分类
    let err_str = e.to_string().to_lowercase();

    // 磁盘空间不足
    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return ErrorCode::StorageFull;
    }

    // 数据损坏
    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return ErrorCode::StorageCorrupted;
    }

    // 默认：系统繁忙
    ErrorCode::SystemBusy
}

impl From<AppError> for RegisterError {
    fn from(err: AppError) -> Self {
        RegisterError::Invalid(err)
    }
}

impl From<RegisterError> for AppError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::Invalid(app) => app,
            other => AppError::with_message(other.code(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_severity() {
        assert_eq!(RegisterError::NoActiveSession.code(), ErrorCode::CashSessionNotActive);
        assert!(RegisterError::NoTableSelected.is_precondition());

        let err = RegisterError::InsufficientAmount {
            tendered: Decimal::from(10),
            due: Decimal::from(15),
        };
        assert!(err.is_validation());
        assert_eq!(err.code().code(), 5002);

        let remote = RegisterError::from(StoreError::Transient("timeout".into()));
        assert_eq!(remote.severity(), Severity::Alert);
        assert_eq!(remote.code(), ErrorCode::NetworkError);

        assert_eq!(RegisterError::SessionExpired.severity(), Severity::Fatal);
    }

    #[test]
    fn test_into_app_error_keeps_code() {
        let app: AppError = RegisterError::OpenTables { count: 2 }.into();
        assert_eq!(app.code, ErrorCode::TableHasOrders);
        assert!(app.message.contains("2 table(s)"));

        let invalid = RegisterError::from(AppError::required("name"));
        assert_eq!(invalid.to_string(), "name is required");
        let back: AppError = invalid.into();
        assert_eq!(back.code, ErrorCode::RequiredField);
    }
}
