//! Shared types for the till workspace
//!
//! Domain value types used by both the remote store client and the register
//! engine: menu, tables, order lines and rows, cash sessions, payment ledger
//! rows, error codes and money helpers.

pub mod error;
pub mod models;
pub mod money;
pub mod order;
pub mod serde_helpers;
pub mod util;

// Re-exports
pub use rust_decimal::Decimal;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
