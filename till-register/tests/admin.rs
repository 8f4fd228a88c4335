//! Menu and table administration

mod common;

use common::{Harness, order_row, seeded_store};
use rust_decimal::Decimal;
use shared::error::ErrorCode;
use shared::models::{DiningTableDraft, Menu, MenuItemDraft, Destination};
use till_client::Collection;
use till_register::{Mode, RegisterError};

#[tokio::test(start_paused = true)]
async fn test_replace_menu_rewrites_every_row() {
    let h = Harness::new().await;
    let mut menu = Menu::new();
    menu.add_category("Dolci").unwrap();
    menu.add_item("Dolci", MenuItemDraft::new("Tiramisù", Decimal::from(6), Destination::Kitchen))
        .unwrap();
    menu.add_item("Dolci", MenuItemDraft::new("Affogato", Decimal::new(450, 2), Destination::Bar))
        .unwrap();

    h.register.replace_menu(menu).await.unwrap();

    let rows = h.store.rows(Collection::Menu);
    let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["Affogato", "Tiramisù"]);
    assert_eq!(rows[0]["destinazione"], "bar");

    let menu = h.register.menu();
    assert!(menu.find_by_name("Margherita").is_none());
    assert_eq!(menu.category("Dolci").unwrap().len(), 2);

    // Reloads to the same menu
    h.register.fetch_menu().await.unwrap();
    assert_eq!(h.register.menu().items().count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_replace_tables_drops_orders_of_removed_tables() {
    let store = seeded_store(true);
    store.seed(
        Collection::Orders,
        vec![
            order_row("T1", "T1_o", "Birra", 5.0, 1),
            order_row("T2", "T2_o", "Acqua", 2.0, 2),
        ],
    );
    let h = Harness::with_store(store).await;
    h.register.select_table("T1").unwrap();

    let tables = h
        .register
        .replace_tables(vec![
            DiningTableDraft::new("T4").with_notes("terrace"),
            DiningTableDraft::new("T2"),
        ])
        .await
        .unwrap();

    let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["T2", "T4"]);
    assert!(tables.iter().all(|t| t.id.is_some()));
    assert_eq!(h.store.rows(Collection::Tables).len(), 2);

    assert_eq!(h.register.mode(), Mode::Idle);
    assert!(!h.register.orders().is_occupied("T1"));
    assert!(h.register.orders().is_occupied("T2"));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_table_names_are_rejected() {
    let h = Harness::new().await;
    let err = h
        .register
        .replace_tables(vec![DiningTableDraft::new("T1"), DiningTableDraft::new("T1")])
        .await
        .unwrap_err();
    assert!(matches!(err, RegisterError::Invalid(ref e) if e.code == ErrorCode::TableNameExists));
    assert_eq!(err.code(), ErrorCode::TableNameExists);
    assert_eq!(h.store.rows(Collection::Tables).len(), 3);
    assert!(h.store.journal().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_table_notes_travel_with_the_order() {
    let h = Harness::new().await;
    h.register.select_table("T3").unwrap();
    h.register.update_table_notes("allergy: nuts").await.unwrap();

    let tables = h.store.rows(Collection::Tables);
    let t3 = tables.iter().find(|t| t["name"] == "T3").unwrap();
    assert_eq!(t3["notes"], "allergy: nuts");

    h.register.add_menu_item(&h.menu_item("Birra")).unwrap();
    h.register.confirm_order().await.unwrap();
    let orders = h.store.rows(Collection::Orders);
    assert_eq!(orders[0]["notes"], "allergy: nuts");
}

#[tokio::test(start_paused = true)]
async fn test_table_notes_need_a_selected_table() {
    let h = Harness::new().await;
    let err = h.register.update_table_notes("window").await.unwrap_err();
    assert!(matches!(err, RegisterError::NoTableSelected));
}
