//! Payment Ledger Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::order::OrderLine;

/// `table_id` sentinel marking a refund row
pub const REFUND_TABLE_ID: &str = "N/A";

/// Server name stamped on every ledger row
pub const DEFAULT_SERVER_NAME: &str = "Default Server";

/// Payment ledger row (`payments` collection), append-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub table_id: String,
    /// Negative for refunds
    pub total_amount: Decimal,
    pub cash_amount: Decimal,
    pub card_amount: Decimal,
    pub change_amount: Decimal,
    /// Snapshot of the order lines at payment time
    #[serde(default, with = "crate::serde_helpers::json_lines")]
    pub items: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub server_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PaymentRecord {
    pub fn is_refund(&self) -> bool {
        self.table_id == REFUND_TABLE_ID
    }
}
