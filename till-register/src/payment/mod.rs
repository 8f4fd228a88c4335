//! Payment confirmation and refunds
//!
//! Pure building blocks: quoting a tender against an order total and
//! shaping ledger rows. The register performs the writes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{DEFAULT_SERVER_NAME, PaymentRecord, REFUND_TABLE_ID};
use shared::money::{parse_amount_or_zero, round_money};
use shared::order::{OrderLine, SplitContribution};

use crate::utils::{RegisterError, RegisterResult};

/// Money handed over at the payment dialog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentDraft {
    pub cash: Decimal,
    pub card: Decimal,
    /// Contributions of settled split customers
    #[serde(default)]
    pub split: Vec<SplitContribution>,
}

impl PaymentDraft {
    pub fn new(cash: Decimal, card: Decimal) -> Self {
        Self {
            cash,
            card,
            split: Vec::new(),
        }
    }

    /// Read the dialog's two amount fields; blank or unparsable text is zero
    pub fn from_input(cash: &str, card: &str) -> Self {
        Self::new(parse_amount_or_zero(cash), parse_amount_or_zero(card))
    }

    pub fn with_split(mut self, contributions: impl IntoIterator<Item = SplitContribution>) -> Self {
        self.split.extend(contributions);
        self
    }
}

/// Validated tender against an order total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentQuote {
    pub order_total: Decimal,
    /// direct cash + split cash
    pub cash: Decimal,
    /// direct card + split card
    pub card: Decimal,
    pub tendered: Decimal,
    pub change: Decimal,
}

/// Check the tender covers `order_total` and work out the change
pub fn quote(order_total: Decimal, draft: &PaymentDraft) -> RegisterResult<PaymentQuote> {
    let split = SplitContribution::sum(&draft.split);
    let cash = draft.cash + split.cash;
    let card = draft.card + split.card;
    let tendered = cash + card;
    if tendered < order_total {
        return Err(RegisterError::InsufficientAmount {
            tendered,
            due: order_total,
        });
    }
    Ok(PaymentQuote {
        order_total,
        cash,
        card,
        tendered,
        change: (tendered - order_total).max(Decimal::ZERO),
    })
}

/// Ledger row for a paid table
pub fn sale_record(
    table: &str,
    lines: &[OrderLine],
    quote: &PaymentQuote,
    created_at: DateTime<Utc>,
) -> PaymentRecord {
    PaymentRecord {
        id: None,
        table_id: table.to_string(),
        total_amount: round_money(quote.order_total),
        cash_amount: round_money(quote.cash),
        card_amount: round_money(quote.card),
        change_amount: round_money(quote.change),
        items: lines.to_vec(),
        created_at,
        server_name: Some(DEFAULT_SERVER_NAME.to_string()),
        notes: Some(String::new()),
    }
}

/// Refund entered at the refund dialog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundDraft {
    /// Strictly negative
    pub amount: Decimal,
    pub note: String,
}

impl RefundDraft {
    pub fn new(amount: Decimal, note: impl Into<String>) -> Self {
        Self {
            amount,
            note: note.into(),
        }
    }
}

/// Ledger row for a refund; touches no table or order
pub fn refund_record(draft: &RefundDraft, created_at: DateTime<Utc>) -> RegisterResult<PaymentRecord> {
    if draft.amount >= Decimal::ZERO {
        return Err(RegisterError::InvalidRefund(format!(
            "amount must be negative, got {}",
            draft.amount
        )));
    }
    let note = draft.note.trim();
    if note.is_empty() {
        return Err(RegisterError::InvalidRefund("a description is required".into()));
    }
    let amount = round_money(draft.amount);
    Ok(PaymentRecord {
        id: None,
        table_id: REFUND_TABLE_ID.to_string(),
        total_amount: amount,
        cash_amount: amount,
        card_amount: Decimal::ZERO,
        change_amount: Decimal::ZERO,
        items: Vec::new(),
        created_at,
        server_name: Some(DEFAULT_SERVER_NAME.to_string()),
        notes: Some(note.to_string()),
    })
}
