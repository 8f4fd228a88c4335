//! Cash session reconciliation
//!
//! Totals for a session window are recomputed from the payments ledger:
//!
//! - sale rows (`table_id != "N/A"`): cash, card and total accumulate, then
//!   the change handed back is taken out of cash
//! - refund rows (`table_id == "N/A"`): amounts are stored negative and
//!   simply accumulate
//!
//! The combined figure is the elementwise sum, rounded to cents.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::models::{CashReport, CashSession, CashTotals, PaymentRecord};

/// Sale and refund totals over a set of ledger rows
pub fn reconcile_payments<'a>(
    records: impl IntoIterator<Item = &'a PaymentRecord>,
) -> (CashTotals, CashTotals) {
    let mut sales = CashTotals::default();
    let mut refunds = CashTotals::default();

    for record in records {
        if record.is_refund() {
            refunds.cash += record.cash_amount;
            refunds.card += record.card_amount;
            refunds.total += record.total_amount;
        } else {
            sales.cash += record.cash_amount;
            sales.card += record.card_amount;
            sales.total += record.total_amount;
            sales.cash -= record.change_amount;
        }
    }

    (sales, refunds)
}

/// Build the report for `session` over `[start_time, end_time]`
pub fn build_report(
    session: &CashSession,
    end_time: DateTime<Utc>,
    records: &[PaymentRecord],
    total_open_tables: Decimal,
) -> CashReport {
    let (sales, refunds) = reconcile_payments(records);
    CashReport {
        session_id: session.id,
        start_time: session.start_time,
        end_time,
        combined: sales.combine(&refunds),
        sales,
        refunds,
        total_open_tables,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::REFUND_TABLE_ID;

    fn record(table: &str, total: i64, cash: i64, card: i64, change: i64) -> PaymentRecord {
        PaymentRecord {
            id: None,
            table_id: table.to_string(),
            total_amount: Decimal::from(total),
            cash_amount: Decimal::from(cash),
            card_amount: Decimal::from(card),
            change_amount: Decimal::from(change),
            items: vec![],
            created_at: "2026-10-19T12:00:00Z".parse().unwrap(),
            server_name: None,
            notes: None,
        }
    }

    #[test]
    fn test_sale_and_refund_example() {
        let records = vec![
            record("T1", 18, 20, 0, 2),
            record(REFUND_TABLE_ID, -5, -5, 0, 0),
        ];
        let (sales, refunds) = reconcile_payments(&records);
        assert_eq!(sales, CashTotals::new(Decimal::from(18), Decimal::ZERO, Decimal::from(18)));
        assert_eq!(refunds, CashTotals::new(Decimal::from(-5), Decimal::ZERO, Decimal::from(-5)));

        let combined = sales.combine(&refunds);
        assert_eq!(combined.cash, Decimal::from(13));
        assert_eq!(combined.card, Decimal::ZERO);
        assert_eq!(combined.total, Decimal::from(13));
    }

    #[test]
    fn test_mixed_tender() {
        let records = vec![record("T1", 30, 10, 20, 0), record("T2", 12, 0, 15, 3)];
        let (sales, _) = reconcile_payments(&records);
        assert_eq!(sales.cash, Decimal::from(7));
        assert_eq!(sales.card, Decimal::from(35));
        assert_eq!(sales.total, Decimal::from(42));
    }

    #[test]
    fn test_report_rounds_and_carries_open_tables() {
        let session = CashSession {
            id: 9,
            start_time: "2026-10-19T08:00:00Z".parse().unwrap(),
            end_time: None,
            is_active: true,
            total_cash: None,
            total_card: None,
            total_amount: None,
        };
        let mut sale = record("T1", 0, 0, 0, 0);
        sale.total_amount = Decimal::new(10005, 3);
        sale.cash_amount = Decimal::new(10005, 3);
        let end = "2026-10-19T20:00:00Z".parse().unwrap();

        let report = build_report(&session, end, &[sale], Decimal::new(1250, 2));
        assert_eq!(report.combined.cash, Decimal::new(1001, 2));
        assert_eq!(report.total_open_tables, Decimal::new(1250, 2));
        assert_eq!(report.refund_cash(), Decimal::ZERO);
        assert_eq!(report.end_time, end);
    }
}
