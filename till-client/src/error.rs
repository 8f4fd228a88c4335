//! Store error types

use reqwest::StatusCode;
use thiserror::Error;

/// What kind of failure the store reported
///
/// Callers dispatch on the kind, never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// Credentials missing or expired; a session refresh may help
    Unauthorized,
    /// Network failure, timeout or server-side error; retry may help
    Transient,
    /// The store rejected the request itself
    Validation,
    /// A row could not be decoded into the expected shape
    Decode,
}

/// Store error type
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Store unavailable: {0}")]
    Transient(String),

    #[error("Rejected by store: {0}")]
    Validation(String),

    #[error("Malformed row: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::Unauthorized(_) => StoreErrorKind::Unauthorized,
            StoreError::Transient(_) => StoreErrorKind::Transient,
            StoreError::Validation(_) => StoreErrorKind::Validation,
            StoreError::Decode(_) => StoreErrorKind::Decode,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind() == StoreErrorKind::Unauthorized
    }

    /// Build an error of the given kind
    pub fn of_kind(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            StoreErrorKind::Unauthorized => StoreError::Unauthorized(message),
            StoreErrorKind::Transient => StoreError::Transient(message),
            StoreErrorKind::Validation => StoreError::Validation(message),
            StoreErrorKind::Decode => StoreError::Decode(message),
        }
    }

    /// Map a non-success HTTP status to an error kind
    pub fn from_status(status: StatusCode, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized(body),
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
                StoreError::Transient(body)
            }
            s if s.is_client_error() => StoreError::Validation(body),
            _ => StoreError::Transient(body),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            StoreError::from_status(status, err.to_string())
        } else {
            StoreError::Transient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
