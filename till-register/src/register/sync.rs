//! Remote reads, polling and order persistence

use chrono::SecondsFormat;
use serde_json::Value;
use shared::models::{CashSession, DiningTable, Menu, MenuItem};
use shared::order::{OrderRow, OrderStatus, PaymentStatus};
use till_client::{Collection, Filter, Query};

use super::{MENU_POLL, ORDER_POLL, Register, TABLE_POLL, sync_key};
use crate::events::RegisterEvent;
use crate::orders::TableOrders;
use crate::utils::RegisterResult;

/// Rows of orders still awaiting payment
pub(super) fn unpaid_orders() -> Query {
    Query::all().any_of(vec![
        Filter::is_null("payment_status"),
        Filter::neq("payment_status", PaymentStatus::Paid.as_str()),
    ])
}

/// Timestamps travel as RFC 3339 text
pub(super) fn instant(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Register {
    // ========== Fetch ==========

    /// Refresh the open cash session (no end time, newest start)
    pub async fn check_active_session(&self) -> RegisterResult<Option<CashSession>> {
        let query = Query::all()
            .is_null("end_time")
            .order_desc("start_time")
            .limit(1);
        let sessions: Vec<CashSession> = self.select(Collection::CashSessions, &query).await?;
        let session = sessions.into_iter().next();
        self.inner.state.lock().session = session.clone();
        tracing::debug!(session_id = ?session.as_ref().map(|s| s.id), "Active session checked");
        Ok(session)
    }

    pub async fn fetch_tables(&self) -> RegisterResult<()> {
        let tables: Vec<DiningTable> = self
            .select(Collection::Tables, &Query::all().order_asc("id"))
            .await?;
        self.inner.state.lock().tables = tables;
        self.emit(RegisterEvent::TablesRefreshed);
        Ok(())
    }

    pub async fn fetch_menu(&self) -> RegisterResult<()> {
        let items: Vec<MenuItem> = self.select(Collection::Menu, &Query::all()).await?;
        self.inner.state.lock().menu = Menu::from_items(items).sorted();
        self.emit(RegisterEvent::MenuRefreshed);
        Ok(())
    }

    /// Replace the in-memory orders with the unpaid rows.
    ///
    /// Never runs while editing: the in-memory order is authoritative then.
    /// Returns whether the result was applied.
    pub async fn fetch_orders(&self) -> RegisterResult<bool> {
        if self.is_editing() {
            tracing::debug!("Order fetch skipped while editing");
            return Ok(false);
        }
        let query = unpaid_orders().order_asc("created_at");
        let rows: Vec<OrderRow> = self.select(Collection::Orders, &query).await?;

        // Oldest first, so the newest row of a table wins
        let mut orders = TableOrders::new();
        for row in rows {
            orders.set(&row.table_id, row.items);
        }

        {
            let mut state = self.inner.state.lock();
            if state.mode.is_editing() {
                tracing::debug!("Order fetch discarded, editing started meanwhile");
                return Ok(false);
            }
            state.orders = orders;
        }
        self.emit(RegisterEvent::OrdersRefreshed);
        Ok(true)
    }

    // ========== Persist ==========

    /// Order id of the table's newest unpaid row, or a fresh one
    pub(super) async fn get_or_create_order_id(&self, table: &str) -> RegisterResult<String> {
        let query = unpaid_orders()
            .eq("table_id", table)
            .order_desc("created_at")
            .limit(1);
        let rows: Vec<Value> = self.select(Collection::Orders, &query).await?;
        let existing = rows
            .first()
            .and_then(|row| row.get("order_id"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(existing.unwrap_or_else(|| self.inner.ids.order_id(table)))
    }

    /// Write the table's current lines to its unpaid order row.
    ///
    /// Updates the row when it exists, inserts it otherwise. The snapshot is
    /// taken once the write slot is acquired, so a late write never carries
    /// stale lines.
    pub(super) async fn persist_order(&self, table: &str) -> RegisterResult<String> {
        let _slot = self.inner.order_writes.lock().await;
        let order_id = self.get_or_create_order_id(table).await?;

        let (lines, notes) = {
            let state = self.inner.state.lock();
            (
                state.orders.lines(table).to_vec(),
                state.table_notes(table).unwrap_or_default(),
            )
        };
        let line_count = lines.len();
        let row = OrderRow {
            id: None,
            table_id: table.to_string(),
            order_id: order_id.clone(),
            items: lines,
            created_at: self.inner.clock.now(),
            status: OrderStatus::Active,
            payment_status: None,
            notes: Some(notes),
        };

        let query = unpaid_orders()
            .eq("table_id", table)
            .eq("order_id", order_id.as_str());
        let updated = self.update(Collection::Orders, &query, &row).await?;
        if updated == 0 {
            let _: Vec<Value> = self.insert(Collection::Orders, &[row]).await?;
        }
        tracing::debug!(
            table = %table,
            order_id = %order_id,
            lines = line_count,
            inserted = updated == 0,
            "Order persisted"
        );
        Ok(order_id)
    }

    /// (Re)arm the debounced remote write of `table`'s order
    pub(super) fn schedule_sync(&self, table: &str) {
        let weak = self.downgrade();
        let table = table.to_string();
        self.inner.scheduler.schedule_debounced(
            sync_key(&table),
            self.inner.config.order_sync_debounce(),
            move || async move {
                let Some(register) = Register::upgrade(&weak) else {
                    return;
                };
                if let Err(e) = register.persist_order(&table).await {
                    register.report("order_sync", &e);
                }
            },
        );
    }

    // ========== Polling ==========

    pub(super) fn start_polls(&self) {
        self.inner.state.lock().polling = true;

        let weak = self.downgrade();
        self.inner.scheduler.schedule_repeating(
            TABLE_POLL,
            self.inner.config.table_poll(),
            false,
            move || {
                let weak = weak.clone();
                async move {
                    let Some(register) = Register::upgrade(&weak) else {
                        return;
                    };
                    if register.is_expired() || register.is_editing() {
                        return;
                    }
                    if let Err(e) = register.fetch_tables().await {
                        register.report("fetch_tables", &e);
                    }
                }
            },
        );

        let weak = self.downgrade();
        self.inner.scheduler.schedule_repeating(
            MENU_POLL,
            self.inner.config.menu_poll(),
            false,
            move || {
                let weak = weak.clone();
                async move {
                    let Some(register) = Register::upgrade(&weak) else {
                        return;
                    };
                    if register.is_expired() || !register.is_session_active() {
                        return;
                    }
                    if let Err(e) = register.fetch_menu().await {
                        register.report("fetch_menu", &e);
                    }
                }
            },
        );

        self.start_order_poll(false);
    }

    /// Order polling runs only while idle
    pub(super) fn start_order_poll(&self, immediate: bool) {
        if !self.inner.state.lock().polling {
            return;
        }
        let weak = self.downgrade();
        self.inner.scheduler.schedule_repeating(
            ORDER_POLL,
            self.inner.config.order_poll(),
            immediate,
            move || {
                let weak = weak.clone();
                async move {
                    let Some(register) = Register::upgrade(&weak) else {
                        return;
                    };
                    if register.is_expired() {
                        return;
                    }
                    if let Err(e) = register.fetch_orders().await {
                        register.report("fetch_orders", &e);
                    }
                }
            },
        );
    }

    pub(super) fn stop_order_poll(&self) {
        if self.inner.scheduler.cancel(ORDER_POLL) {
            tracing::debug!("Order poll suspended");
        }
    }
}
