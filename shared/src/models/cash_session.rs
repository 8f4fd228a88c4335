//! Cash Session Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::round_money;

/// Cash session row (收银班次, `cash_sessions` collection)
///
/// At most one session has `end_time = None` at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashSession {
    pub id: i64,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default = "crate::serde_helpers::default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub total_cash: Option<Decimal>,
    #[serde(default)]
    pub total_card: Option<Decimal>,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
}

impl CashSession {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Open cash session payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashSessionCreate {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl CashSessionCreate {
    pub fn starting_at(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            end_time: None,
            is_active: true,
        }
    }
}

/// Close cash session payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashSessionEnd {
    pub end_time: DateTime<Utc>,
    pub is_active: bool,
}

/// Reconciled totals written back onto a closed session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashSessionTotals {
    pub total_cash: Decimal,
    pub total_card: Decimal,
    pub total_amount: Decimal,
}

/// Running cash/card/total accumulator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashTotals {
    pub cash: Decimal,
    pub card: Decimal,
    pub total: Decimal,
}

impl CashTotals {
    pub fn new(cash: Decimal, card: Decimal, total: Decimal) -> Self {
        Self { cash, card, total }
    }

    /// Elementwise sum, each component rounded to cents
    pub fn combine(&self, other: &CashTotals) -> CashTotals {
        CashTotals {
            cash: round_money(self.cash + other.cash),
            card: round_money(self.card + other.card),
            total: round_money(self.total + other.total),
        }
    }
}

/// Reconciliation result for a session window (对账报告)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashReport {
    pub session_id: i64,
    pub start_time: DateTime<Utc>,
    /// Stored end time, or the moment of reconciliation for an open session
    pub end_time: DateTime<Utc>,
    pub sales: CashTotals,
    pub refunds: CashTotals,
    /// Sales + refunds, rounded
    pub combined: CashTotals,
    /// Live value of all unpaid table orders
    pub total_open_tables: Decimal,
}

impl CashReport {
    /// Refund cash handed back during the window
    pub fn refund_cash(&self) -> Decimal {
        round_money(self.refunds.cash)
    }
}
