//! Register test harness: in-memory store, in-memory cache, fixed clock

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use shared::models::MenuItem;
use till_client::{Collection, MemoryStore, RemoteStore};
use till_register::core::{ManualClock, SequentialIds};
use till_register::{LocalOrderCache, Register, RegisterConfig, RegisterEvent};
use tokio::sync::broadcast;

pub const SESSION_START: &str = "2026-10-19T17:00:00Z";
pub const NOW: &str = "2026-10-19T18:00:00Z";

pub fn at(instant: &str) -> DateTime<Utc> {
    instant.parse().unwrap()
}

pub fn now() -> DateTime<Utc> {
    at(NOW)
}

pub fn config() -> RegisterConfig {
    let mut config = RegisterConfig::with_overrides("./target/register-tests");
    config.order_sync_debounce_ms = 500;
    config.inactivity_timeout_ms = 15_000;
    config.autosave_notice_ms = 3_000;
    config.order_poll_ms = 5_000;
    config.table_poll_ms = 10_000;
    config.menu_poll_ms = 60_000;
    config
}

/// Tables T1..T3 and a small menu; optionally an open cash session
pub fn seeded_store(with_session: bool) -> MemoryStore {
    let store = MemoryStore::new();
    store.seed(
        Collection::Tables,
        ["T1", "T2", "T3"].map(|name| json!({"name": name, "notes": null})),
    );
    store.seed(
        Collection::Menu,
        vec![
            json!({"category": "Pizze", "name": "Margherita", "price": 8.0, "destinazione": "cucina"}),
            json!({"category": "Bevande", "name": "Birra", "price": 5.0, "destinazione": "bar"}),
            json!({"category": "Bevande", "name": "Acqua", "price": 2.0, "destinazione": "bar"}),
        ],
    );
    if with_session {
        store.seed(
            Collection::CashSessions,
            vec![json!({"start_time": SESSION_START, "end_time": null, "is_active": true})],
        );
    }
    store
}

/// Unpaid order row as another terminal would have written it
pub fn order_row(table: &str, order_id: &str, name: &str, price: f64, quantity: i32) -> Value {
    json!({
        "table_id": table,
        "order_id": order_id,
        "items": [{"id": format!("{}-line", order_id), "name": name, "price": price, "quantity": quantity}],
        "created_at": "2026-10-19T17:30:00Z",
        "status": "active",
        "payment_status": null,
        "notes": "",
    })
}

pub fn payment_row(table: &str, total: f64, cash: f64, card: f64, change: f64, created_at: &str) -> Value {
    json!({
        "table_id": table,
        "total_amount": total,
        "cash_amount": cash,
        "card_amount": card,
        "change_amount": change,
        "items": [],
        "created_at": created_at,
        "server_name": "Default Server",
        "notes": "",
    })
}

pub struct Harness {
    pub register: Register,
    pub store: Arc<MemoryStore>,
    pub cache: LocalOrderCache,
    pub clock: Arc<ManualClock>,
    pub events: broadcast::Receiver<RegisterEvent>,
}

impl Harness {
    /// Seeded store with an open cash session
    pub async fn new() -> Self {
        Self::with_store(seeded_store(true)).await
    }

    pub async fn without_session() -> Self {
        Self::with_store(seeded_store(false)).await
    }

    /// Build a register over `store` and load its initial state, without
    /// starting the polls
    pub async fn with_store(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self::with_remote(store.clone(), store).await
    }

    /// Register talking to `remote`, which forwards to `store`
    pub async fn with_remote(store: Arc<MemoryStore>, remote: Arc<dyn RemoteStore>) -> Self {
        let cache = LocalOrderCache::open_in_memory().unwrap();
        let clock = Arc::new(ManualClock::new(now()));
        let register = Register::builder(config(), remote, cache.clone())
            .ids(Arc::new(SequentialIds::new()))
            .clock(clock.clone())
            .build();
        let events = register.subscribe();

        register.check_active_session().await.unwrap();
        register.fetch_tables().await.unwrap();
        register.fetch_menu().await.unwrap();
        register.fetch_orders().await.unwrap();

        Self {
            register,
            store,
            cache,
            clock,
            events,
        }
    }

    pub fn menu_item(&self, name: &str) -> MenuItem {
        self.register.menu().find_by_name(name).cloned().unwrap()
    }

    /// Select `table` and add one unit of each named menu item
    pub fn order(&self, table: &str, items: &[&str]) {
        self.register.select_table(table).unwrap();
        for name in items {
            self.register.add_menu_item(&self.menu_item(name)).unwrap();
        }
    }

    pub fn drain_events(&mut self) -> Vec<RegisterEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn notices(&mut self) -> Vec<String> {
        self.drain_events()
            .into_iter()
            .filter_map(|event| match event {
                RegisterEvent::Notice(message) => Some(message),
                _ => None,
            })
            .collect()
    }
}

/// Advance paused time
pub async fn wait_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
