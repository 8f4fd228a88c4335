//! MemoryStore behaviour over the query shapes the register uses

use serde_json::json;
use shared::models::CashSession;
use till_client::{
    Collection, Filter, MemoryStore, Query, RemoteStore, RemoteStoreExt, StoreError,
    StoreErrorKind, StoreOp,
};

fn unpaid() -> Query {
    Query::all().any_of(vec![
        Filter::is_null("payment_status"),
        Filter::neq("payment_status", "paid"),
    ])
}

#[tokio::test]
async fn test_insert_assigns_ids_and_journals() {
    let store = MemoryStore::new();
    let rows = store
        .insert(
            Collection::Tables,
            vec![json!({"name": "T1"}), json!({"name": "T2"})],
        )
        .await
        .unwrap();

    assert_eq!(rows[0]["id"], 1);
    assert_eq!(rows[1]["id"], 2);
    assert_eq!(store.writes(StoreOp::Insert, Collection::Tables).len(), 1);
}

#[tokio::test]
async fn test_unpaid_filter_keeps_null_payment_status() {
    let store = MemoryStore::new();
    store.seed(
        Collection::Orders,
        vec![
            json!({"table_id": "T1", "payment_status": null}),
            json!({"table_id": "T2", "payment_status": "paid"}),
            json!({"table_id": "T3"}),
        ],
    );

    let rows = store.select(Collection::Orders, &unpaid()).await.unwrap();
    let tables: Vec<_> = rows.iter().map(|r| r["table_id"].as_str().unwrap()).collect();
    assert_eq!(tables, vec!["T1", "T3"]);

    // neq alone never matches null columns
    let rows = store
        .select(Collection::Orders, &Query::all().neq("payment_status", "paid"))
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_open_session_is_newest_with_null_end_time() {
    let store = MemoryStore::new();
    store.seed(
        Collection::CashSessions,
        vec![
            json!({"start_time": "2026-10-18T08:00:00Z", "end_time": "2026-10-18T20:00:00Z", "is_active": false}),
            json!({"start_time": "2026-10-19T08:00:00Z", "end_time": null, "is_active": true}),
            json!({"start_time": "2026-10-17T08:00:00Z", "end_time": null, "is_active": true}),
        ],
    );

    let query = Query::all().is_null("end_time").order_desc("start_time").limit(1);
    let sessions: Vec<CashSession> = store
        .select_as(Collection::CashSessions, &query)
        .await
        .unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, 2);
}

#[tokio::test]
async fn test_created_at_range_compares_instants() {
    let store = MemoryStore::new();
    store.seed(
        Collection::Payments,
        vec![
            json!({"created_at": "2026-10-19T07:59:59Z"}),
            json!({"created_at": "2026-10-19T10:00:00+02:00"}),
            json!({"created_at": "2026-10-19T20:00:00.000Z"}),
            json!({"created_at": "2026-10-19T20:00:01Z"}),
        ],
    );

    let query = Query::all()
        .gte("created_at", "2026-10-19T08:00:00Z")
        .lte("created_at", "2026-10-19T20:00:00Z");
    let rows = store.select(Collection::Payments, &query).await.unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[tokio::test]
async fn test_update_merges_patch_into_matching_rows() {
    let store = MemoryStore::new();
    store.seed(
        Collection::Orders,
        vec![
            json!({"table_id": "T1", "order_id": "a", "payment_status": null}),
            json!({"table_id": "T1", "order_id": "b", "payment_status": null}),
        ],
    );

    let updated = store
        .update(
            Collection::Orders,
            &Query::all().eq("table_id", "T1").eq("order_id", "a").is_null("payment_status"),
            json!({"payment_status": "paid"}),
        )
        .await
        .unwrap();
    assert_eq!(updated.len(), 1);

    let remaining = store.select(Collection::Orders, &unpaid()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["order_id"], "b");
}

#[tokio::test]
async fn test_delete_returns_count() {
    let store = MemoryStore::new();
    store.seed(
        Collection::Orders,
        vec![
            json!({"status": "active"}),
            json!({"status": "completed"}),
            json!({"status": "archived"}),
        ],
    );
    let query = Query::all().any_of(vec![
        Filter::eq("status", "active"),
        Filter::eq("status", "completed"),
    ]);
    assert_eq!(store.delete(Collection::Orders, &query).await.unwrap(), 2);
    assert_eq!(store.rows(Collection::Orders).len(), 1);
}

#[tokio::test]
async fn test_injected_failures_fire_once_per_target() {
    let store = MemoryStore::new();
    store.fail_next(
        Some(StoreOp::Insert),
        StoreError::Unauthorized("JWT expired".into()),
    );

    // selects are not affected by an insert failure
    store.select(Collection::Menu, &Query::all()).await.unwrap();

    let err = store
        .insert(Collection::Menu, vec![json!({"name": "x"})])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::Unauthorized);
    assert!(store.rows(Collection::Menu).is_empty());

    store
        .insert(Collection::Menu, vec![json!({"name": "x"})])
        .await
        .unwrap();
    assert_eq!(store.rows(Collection::Menu).len(), 1);
}

#[tokio::test]
async fn test_refresh_failures_are_counted() {
    let store = MemoryStore::new();
    store.fail_refreshes(1);
    assert!(store.refresh_session().await.is_err());
    assert!(store.refresh_session().await.is_ok());
    assert_eq!(store.refresh_calls(), 2);
}
