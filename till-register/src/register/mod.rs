//! Order session controller
//!
//! [`Register`] owns the application session: selected table, per-table
//! orders, tables, menu and the open cash session. Everything time-driven
//! (debounced order writes, inactivity autosave, polls) is a keyed task on
//! the register's [`Scheduler`].
//!
//! # 状态机
//!
//! ```text
//! Idle ──select_table──▶ Editing{table}
//!   ▲                        │ edits: memory → local cache → debounced remote write
//!   │                        │ 15s inactivity → autosave notice → confirm
//!   └── confirm / cancel / pay
//! ```
//!
//! Order polling runs only while Idle. Remote order writes always carry the
//! in-memory snapshot taken when the write starts.

mod admin;
mod checkout;
mod editing;
mod state;
mod sync;

pub use checkout::PaymentOutcome;
pub use editing::{ConfirmOutcome, CurrentOrder};
pub use state::{Modal, Mode};

use std::future::Future;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::models::{CashSession, DiningTable, Menu};
use shared::order::OrderLine;
use till_client::{Collection, Query, RemoteStore, RemoteStoreExt, StoreError, StoreResult};
use tokio::sync::broadcast;

use crate::core::{Clock, IdProvider, RegisterConfig, Scheduler, SystemClock, UuidIds};
use crate::events::{EVENT_CAPACITY, RegisterEvent};
use crate::orders::{LocalOrderCache, TableOrders};
use crate::utils::{RegisterError, RegisterResult, Severity};
use state::SessionState;

const ORDER_POLL: &str = "poll:orders";
const TABLE_POLL: &str = "poll:tables";
const MENU_POLL: &str = "poll:menu";
const AUTOSAVE: &str = "autosave";
const AUTOSAVE_COMMIT: &str = "autosave:commit";

fn sync_key(table: &str) -> String {
    format!("order-sync:{}", table)
}

/// Builder for [`Register`]
pub struct RegisterBuilder {
    config: RegisterConfig,
    store: Arc<dyn RemoteStore>,
    cache: LocalOrderCache,
    ids: Arc<dyn IdProvider>,
    clock: Arc<dyn Clock>,
}

impl RegisterBuilder {
    pub fn ids(mut self, ids: Arc<dyn IdProvider>) -> Self {
        self.ids = ids;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Register {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Register {
            inner: Arc::new(RegisterInner {
                config: self.config,
                store: self.store,
                cache: self.cache,
                ids: self.ids,
                clock: self.clock,
                scheduler: Scheduler::new(),
                state: Mutex::new(SessionState::new()),
                events,
                order_writes: tokio::sync::Mutex::new(()),
            }),
        }
    }
}

struct RegisterInner {
    config: RegisterConfig,
    store: Arc<dyn RemoteStore>,
    cache: LocalOrderCache,
    ids: Arc<dyn IdProvider>,
    clock: Arc<dyn Clock>,
    scheduler: Scheduler,
    state: Mutex<SessionState>,
    events: broadcast::Sender<RegisterEvent>,
    /// Serialises remote order writes
    order_writes: tokio::sync::Mutex<()>,
}

/// The register engine; cheap to clone
#[derive(Clone)]
pub struct Register {
    inner: Arc<RegisterInner>,
}

impl Register {
    pub fn builder(
        config: RegisterConfig,
        store: Arc<dyn RemoteStore>,
        cache: LocalOrderCache,
    ) -> RegisterBuilder {
        RegisterBuilder {
            config,
            store,
            cache,
            ids: Arc::new(UuidIds),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn new(config: RegisterConfig, store: Arc<dyn RemoteStore>, cache: LocalOrderCache) -> Self {
        Self::builder(config, store, cache).build()
    }

    fn downgrade(&self) -> Weak<RegisterInner> {
        Arc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<RegisterInner>) -> Option<Register> {
        weak.upgrade().map(|inner| Register { inner })
    }

    // ========== Lifecycle ==========

    /// Load the open session, tables, menu and orders, then start polling.
    ///
    /// Failures are reported as events; the register stays usable.
    pub async fn start(&self) {
        tracing::info!("Register starting");
        if let Err(e) = self.check_active_session().await {
            self.report("check_active_session", &e);
        }
        if let Err(e) = self.fetch_tables().await {
            self.report("fetch_tables", &e);
        }
        if let Err(e) = self.fetch_menu().await {
            self.report("fetch_menu", &e);
        }
        if let Err(e) = self.fetch_orders().await {
            self.report("fetch_orders", &e);
        }
        self.start_polls();
        tracing::info!(
            session_active = self.is_session_active(),
            tables = self.tables().len(),
            "Register started"
        );
    }

    /// Cancel every scheduled task
    pub fn shutdown(&self) {
        self.inner.scheduler.shutdown();
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegisterEvent> {
        self.inner.events.subscribe()
    }

    pub fn config(&self) -> &RegisterConfig {
        &self.inner.config
    }

    fn emit(&self, event: RegisterEvent) {
        // No receivers is fine
        let _ = self.inner.events.send(event);
    }

    // ========== Queries ==========

    pub fn mode(&self) -> Mode {
        self.inner.state.lock().mode.clone()
    }

    pub fn is_editing(&self) -> bool {
        self.inner.state.lock().mode.is_editing()
    }

    pub fn selected_table(&self) -> Option<String> {
        self.inner.state.lock().mode.table().map(str::to_string)
    }

    /// Current lines of `table`
    pub fn lines(&self, table: &str) -> Vec<OrderLine> {
        self.inner.state.lock().orders.lines(table).to_vec()
    }

    pub fn table_total(&self, table: &str) -> Decimal {
        self.inner.state.lock().orders.total(table)
    }

    /// Snapshot of every table's order
    pub fn orders(&self) -> TableOrders {
        self.inner.state.lock().orders.clone()
    }

    pub fn tables(&self) -> Vec<DiningTable> {
        self.inner.state.lock().tables.clone()
    }

    pub fn menu(&self) -> Menu {
        self.inner.state.lock().menu.clone()
    }

    pub fn active_session(&self) -> Option<CashSession> {
        self.inner.state.lock().session.clone()
    }

    pub fn is_session_active(&self) -> bool {
        self.inner.state.lock().session.is_some()
    }

    pub fn has_open_tables(&self) -> bool {
        self.inner.state.lock().orders.has_open_tables()
    }

    /// Live value of all unpaid orders
    pub fn total_open_tables(&self) -> Decimal {
        self.inner.state.lock().orders.total_all()
    }

    pub fn is_modal_open(&self) -> bool {
        !self.inner.state.lock().modals.is_empty()
    }

    /// Whether a remote write of `table`'s order is waiting for its debounce
    pub fn is_sync_pending(&self, table: &str) -> bool {
        self.inner.scheduler.is_scheduled(&sync_key(table))
    }

    /// Whether the inactivity timer or its commit is armed
    pub fn is_autosave_pending(&self) -> bool {
        self.inner.scheduler.is_scheduled(AUTOSAVE) || self.inner.scheduler.is_scheduled(AUTOSAVE_COMMIT)
    }

    pub fn is_order_poll_running(&self) -> bool {
        self.inner.scheduler.is_scheduled(ORDER_POLL)
    }

    pub fn is_expired(&self) -> bool {
        self.inner.state.lock().expired
    }

    /// Leave the "please reload" state after credentials were fixed
    pub fn reset_expired(&self) {
        self.inner.state.lock().expired = false;
    }

    // ========== Error reporting ==========

    /// Log `err` and tell the user about it
    fn report(&self, op: &'static str, err: &RegisterError) {
        match err.severity() {
            Severity::Notice => {
                tracing::info!(op = %op, error = %err, "Operation refused");
                self.emit(RegisterEvent::Notice(err.to_string()));
            }
            Severity::Alert => {
                tracing::error!(op = %op, error = %err, code = %err.code(), "Operation failed");
                self.emit(RegisterEvent::Alert(format!("{}. Please retry.", err)));
            }
            Severity::Fatal => {
                tracing::error!(op = %op, "Store session expired");
                self.emit(RegisterEvent::SessionExpired);
            }
        }
    }

    fn reported(&self, op: &'static str, err: RegisterError) -> RegisterError {
        self.report(op, &err);
        err
    }

    fn fail<T>(&self, op: &'static str, err: RegisterError) -> RegisterResult<T> {
        Err(self.reported(op, err))
    }

    // ========== Remote store access ==========

    /// Run `call`; on `Unauthorized` refresh the session once and retry.
    /// A second rejection puts the register into the expired state.
    async fn remote<T, F, Fut>(&self, op: &'static str, call: F) -> RegisterResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        if self.is_expired() {
            return Err(RegisterError::SessionExpired);
        }
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_unauthorized() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(op = %op, error = %e, "Store rejected credentials, refreshing session");
            }
        }
        if let Err(e) = self.inner.store.refresh_session().await {
            tracing::error!(op = %op, error = %e, "Session refresh failed");
            return Err(self.expire());
        }
        match call().await {
            Ok(value) => Ok(value),
            Err(e) if e.is_unauthorized() => Err(self.expire()),
            Err(e) => Err(e.into()),
        }
    }

    fn expire(&self) -> RegisterError {
        self.inner.state.lock().expired = true;
        RegisterError::SessionExpired
    }

    async fn select<T>(&self, collection: Collection, query: &Query) -> RegisterResult<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        let store = &self.inner.store;
        self.remote("select", move || store.select_as(collection, query))
            .await
    }

    async fn insert<T, R>(&self, collection: Collection, rows: &[T]) -> RegisterResult<Vec<R>>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let values = rows
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::from)?;
        let store = &self.inner.store;
        let stored = self
            .remote("insert", move || store.insert(collection, values.clone()))
            .await?;
        stored
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| RegisterError::from(StoreError::from(e)))
            })
            .collect()
    }

    /// Returns how many rows were updated
    async fn update<P>(&self, collection: Collection, query: &Query, patch: &P) -> RegisterResult<usize>
    where
        P: Serialize,
    {
        let patch = serde_json::to_value(patch).map_err(StoreError::from)?;
        let store = &self.inner.store;
        let updated = self
            .remote("update", move || store.update(collection, query, patch.clone()))
            .await?;
        Ok(updated.len())
    }

    async fn delete(&self, collection: Collection, query: &Query) -> RegisterResult<usize> {
        let store = &self.inner.store;
        self.remote("delete", move || store.delete(collection, query))
            .await
    }
}
