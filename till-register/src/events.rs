//! Register events
//!
//! Broadcast to whatever UI sits on top of the register. Lagging receivers
//! lose old events; the register never blocks on them.

use serde::Serialize;
use shared::models::{CashReport, CashSession, PaymentRecord};

/// Event channel capacity
pub const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RegisterEvent {
    /// Transient toast
    Notice(String),
    /// Retry-prompting alert
    Alert(String),
    /// Inactivity timer expired, commit follows shortly
    AutosaveStarted { table: String },
    AutosaveFinished { table: String },
    /// Entered editing mode on a table
    TableSelected { table: String },
    /// Back to the table list
    EditingEnded,
    OrdersRefreshed,
    TablesRefreshed,
    MenuRefreshed,
    SessionStarted(CashSession),
    SessionClosed(CashReport),
    PaymentRecorded(PaymentRecord),
    RefundRecorded(PaymentRecord),
    /// Credentials could not be renewed; reload required
    SessionExpired,
}
