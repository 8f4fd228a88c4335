//! Cash session start, reconciliation and close

mod common;

use common::{Harness, SESSION_START, at, now, order_row, payment_row, seeded_store};
use rust_decimal::Decimal;
use serde_json::json;
use shared::models::CashTotals;
use till_client::{Collection, MemoryStore, StoreOp};
use till_register::{RegisterError, RegisterEvent};

/// One sale paid 20 cash for 15, one refund of 2, one payment before the
/// session started
fn store_with_ledger() -> MemoryStore {
    let store = seeded_store(true);
    store.seed(
        Collection::Payments,
        vec![
            payment_row("T1", 15.0, 20.0, 0.0, 5.0, "2026-10-19T17:30:00Z"),
            payment_row("N/A", -2.0, -2.0, 0.0, 0.0, "2026-10-19T17:45:00Z"),
            payment_row("T2", 40.0, 0.0, 40.0, 0.0, "2026-10-19T16:00:00Z"),
        ],
    );
    store
}

#[tokio::test(start_paused = true)]
async fn test_start_is_refused_while_a_session_is_open() {
    let h = Harness::new().await;
    let err = h.register.start_session().await.unwrap_err();
    assert!(matches!(err, RegisterError::SessionAlreadyActive));
    assert_eq!(h.store.rows(Collection::CashSessions).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_opens_a_session() {
    let mut h = Harness::without_session().await;
    assert!(!h.register.is_session_active());

    let session = h.register.start_session().await.unwrap();
    assert!(session.is_open());
    assert_eq!(session.start_time, now());
    assert!(h.register.is_session_active());

    let rows = h.store.rows(Collection::CashSessions);
    assert_eq!(rows.len(), 1);
    assert!(rows[0]["end_time"].is_null());
    assert_eq!(rows[0]["is_active"], true);
    assert!(
        h.drain_events()
            .iter()
            .any(|e| matches!(e, RegisterEvent::SessionStarted(_)))
    );
}

#[tokio::test(start_paused = true)]
async fn test_end_is_refused_with_open_tables() {
    let store = store_with_ledger();
    store.seed(Collection::Orders, vec![order_row("T1", "T1_o", "Birra", 5.0, 1)]);
    let h = Harness::with_store(store).await;

    let err = h.register.end_session().await.unwrap_err();
    assert!(matches!(err, RegisterError::OpenTables { count: 1 }));
    assert!(h.register.is_session_active());
    assert!(h.store.writes(StoreOp::Update, Collection::CashSessions).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_end_reconciles_and_purges_orders() {
    let store = store_with_ledger();
    store.seed(
        Collection::Orders,
        vec![json!({
            "table_id": "T1",
            "order_id": "T1_paid",
            "items": [],
            "created_at": "2026-10-19T17:29:00Z",
            "status": "active",
            "payment_status": "paid",
        })],
    );
    let mut h = Harness::with_store(store).await;

    let report = h.register.end_session().await.unwrap();
    assert_eq!(
        report.sales,
        CashTotals::new(Decimal::from(15), Decimal::ZERO, Decimal::from(15))
    );
    assert_eq!(
        report.refunds,
        CashTotals::new(Decimal::from(-2), Decimal::ZERO, Decimal::from(-2))
    );
    assert_eq!(
        report.combined,
        CashTotals::new(Decimal::from(13), Decimal::ZERO, Decimal::from(13))
    );
    assert_eq!(report.start_time, at(SESSION_START));
    assert_eq!(report.end_time, now());

    let session = &h.store.rows(Collection::CashSessions)[0];
    assert_eq!(session["is_active"], false);
    assert!(!session["end_time"].is_null());
    assert_eq!(session["total_cash"].as_f64(), Some(13.0));
    assert_eq!(session["total_card"].as_f64(), Some(0.0));
    assert_eq!(session["total_amount"].as_f64(), Some(13.0));

    assert!(h.store.rows(Collection::Orders).is_empty());
    assert!(!h.register.is_session_active());
    assert!(
        h.drain_events()
            .iter()
            .any(|e| matches!(e, RegisterEvent::SessionClosed(r) if r.combined.total == Decimal::from(13)))
    );

    let err = h.register.end_session().await.unwrap_err();
    assert!(matches!(err, RegisterError::NoActiveSession));
}

#[tokio::test(start_paused = true)]
async fn test_cash_control_previews_the_open_session() {
    let store = store_with_ledger();
    store.seed(Collection::Orders, vec![order_row("T2", "T2_o", "Acqua", 2.0, 4)]);
    let h = Harness::with_store(store).await;

    let report = h.register.cash_control().await.unwrap();
    assert_eq!(
        report.combined,
        CashTotals::new(Decimal::from(13), Decimal::ZERO, Decimal::from(13))
    );
    assert_eq!(report.total_open_tables, Decimal::from(8));
    assert_eq!(report.end_time, now());
    assert_eq!(report.refund_cash(), Decimal::from(-2));

    // Preview only
    assert!(h.register.is_session_active());
    assert!(h.store.journal().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cash_control_uses_the_stored_end_of_a_closed_session() {
    let store = seeded_store(false);
    store.seed(
        Collection::CashSessions,
        vec![json!({
            "start_time": "2026-10-19T09:00:00Z",
            "end_time": "2026-10-19T15:00:00Z",
            "is_active": false,
        })],
    );
    store.seed(
        Collection::Payments,
        vec![
            payment_row("T1", 12.0, 12.0, 0.0, 0.0, "2026-10-19T12:00:00Z"),
            payment_row("T1", 30.0, 30.0, 0.0, 0.0, "2026-10-19T16:00:00Z"),
        ],
    );
    let h = Harness::with_store(store).await;

    let report = h.register.cash_control().await.unwrap();
    assert_eq!(report.combined.total, Decimal::from(12));
    assert_eq!(report.end_time, at("2026-10-19T15:00:00Z"));
}

#[tokio::test(start_paused = true)]
async fn test_cash_control_without_any_session() {
    let h = Harness::without_session().await;
    let err = h.register.cash_control().await.unwrap_err();
    assert!(matches!(err, RegisterError::NoSessionFound));
}
