//! Table selection, order editing and the inactivity autosave

use rust_decimal::Decimal;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Destination, MenuItem};
use shared::order::{OrderLine, lines_total};

use super::{AUTOSAVE, AUTOSAVE_COMMIT, Modal, Mode, Register, sync_key};
use crate::events::RegisterEvent;
use crate::orders::{LineChange, LineSpec};
use crate::utils::{RegisterError, RegisterResult};

/// The selected table's order, for the order summary dialog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentOrder {
    pub table: String,
    pub lines: Vec<OrderLine>,
    pub total: Decimal,
}

/// Result of [`Register::confirm_order`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConfirmOutcome {
    /// Lines were written to the order row
    Committed { table: String, order_id: String, total: Decimal },
    /// The order was empty
    NothingToConfirm { table: String },
}

impl Register {
    pub(super) fn require_session(&self, op: &'static str) -> RegisterResult<()> {
        if self.is_session_active() {
            Ok(())
        } else {
            self.fail(op, RegisterError::NoActiveSession)
        }
    }

    pub(super) fn require_table(&self, op: &'static str) -> RegisterResult<String> {
        match self.selected_table() {
            Some(table) => Ok(table),
            None => self.fail(op, RegisterError::NoTableSelected),
        }
    }

    /// Mutations need an open cash session and a selected table that is not
    /// being paid
    pub(super) fn begin_edit(&self, op: &'static str) -> RegisterResult<String> {
        self.require_session(op)?;
        let table = self.require_table(op)?;
        self.require_not_settling(op, Some(table.as_str()))?;
        Ok(table)
    }

    /// `None` refuses while any table is being paid
    fn require_not_settling(&self, op: &'static str, table: Option<&str>) -> RegisterResult<()> {
        let settling = {
            let state = self.inner.state.lock();
            match table {
                Some(table) if state.is_settling(table) => Some(table.to_string()),
                Some(_) => None,
                None => state.settling.clone(),
            }
        };
        match settling {
            Some(table) => self.fail(op, RegisterError::PaymentInProgress(table)),
            None => Ok(()),
        }
    }

    /// Mirror locally, arm the remote write, restart the inactivity timer
    fn after_edit(&self, table: &str) {
        let lines = self.lines(table);
        if let Err(e) = self.inner.cache.save(table, &lines) {
            self.report("cache_save", &RegisterError::from(e));
        }
        self.schedule_sync(table);
        self.restart_inactivity_timer();
    }

    // ========== Selection ==========

    /// Enter editing mode on `table`.
    ///
    /// Lines come from the local cache when present, else from the last
    /// fetch. Selecting does not need an open cash session.
    pub fn select_table(&self, table: &str) -> RegisterResult<()> {
        if !self.inner.state.lock().has_table(table) {
            return self.fail("select_table", RegisterError::TableNotFound(table.to_string()));
        }
        self.require_not_settling("select_table", None)?;
        let cached = match self.inner.cache.load(table) {
            Ok(cached) => cached,
            Err(e) => {
                self.report("cache_load", &RegisterError::from(e));
                None
            }
        };

        {
            let mut state = self.inner.state.lock();
            match cached {
                Some(lines) => state.orders.set(table, lines),
                None if state.orders.is_occupied(table) => {}
                None => state.orders.set(table, Vec::new()),
            }
            state.mode = Mode::Editing {
                table: table.to_string(),
            };
        }

        self.stop_order_poll();
        tracing::info!(table = %table, "Editing started");
        self.emit(RegisterEvent::TableSelected {
            table: table.to_string(),
        });
        self.restart_inactivity_timer();
        Ok(())
    }

    /// The selected table's order; refused when nothing is selected or the
    /// order is empty
    pub fn current_order(&self) -> RegisterResult<CurrentOrder> {
        let table = self.require_table("current_order")?;
        let lines = self.lines(&table);
        if lines.is_empty() {
            return self.fail("current_order", RegisterError::EmptyOrder);
        }
        Ok(CurrentOrder {
            total: lines_total(&lines),
            table,
            lines,
        })
    }

    /// Lines of the selected order going to `destination`, looked up on the
    /// menu by line name. Lines with no menu item of that name are left out.
    pub fn lines_for_destination(&self, destination: Destination) -> RegisterResult<Vec<OrderLine>> {
        let table = self.require_table("lines_for_destination")?;
        let state = self.inner.state.lock();
        Ok(state
            .orders
            .lines(&table)
            .iter()
            .filter(|line| {
                state
                    .menu
                    .find_by_name(&line.name)
                    .is_some_and(|item| item.destination == destination)
            })
            .cloned()
            .collect())
    }

    // ========== Line edits ==========

    /// Add `delta` units to the selected order (see
    /// [`TableOrders::add_or_increment`](crate::orders::TableOrders::add_or_increment))
    pub fn add_item(
        &self,
        spec: &LineSpec,
        delta: i32,
        price_override: Option<Decimal>,
    ) -> RegisterResult<LineChange> {
        let table = self.begin_edit("add_item")?;
        let change = self.inner.state.lock().orders.add_or_increment(
            &table,
            spec,
            delta,
            price_override,
            self.inner.ids.as_ref(),
        );
        if change != LineChange::Unchanged {
            self.after_edit(&table);
        }
        Ok(change)
    }

    /// Menu tap: one more unit
    pub fn add_menu_item(&self, item: &MenuItem) -> RegisterResult<LineChange> {
        self.add_item(&LineSpec::from(item), 1, None)
    }

    fn existing_line(&self, op: &'static str, table: &str, line_id: &str) -> RegisterResult<OrderLine> {
        let line = self.inner.state.lock().orders.line(table, line_id).cloned();
        match line {
            Some(line) => Ok(line),
            None => self.fail(op, RegisterError::LineNotFound(line_id.to_string())),
        }
    }

    /// +/- buttons; a line reaching zero is removed
    pub fn change_quantity(&self, line_id: &str, delta: i32) -> RegisterResult<LineChange> {
        let table = self.begin_edit("change_quantity")?;
        let line = self.existing_line("change_quantity", &table, line_id)?;
        self.add_item(&LineSpec::line(&line), delta, None)
    }

    pub fn set_line_quantity(&self, line_id: &str, quantity: i32) -> RegisterResult<LineChange> {
        let table = self.begin_edit("set_line_quantity")?;
        let line = self.existing_line("set_line_quantity", &table, line_id)?;
        self.add_item(&LineSpec::line(&line), quantity.saturating_sub(line.quantity), None)
    }

    /// Manual price edit; the line stops matching its menu item
    pub fn set_line_price(&self, line_id: &str, price: Decimal) -> RegisterResult<OrderLine> {
        let table = self.begin_edit("set_line_price")?;
        if price < Decimal::ZERO {
            let err = AppError::with_message(ErrorCode::MenuItemInvalidPrice, "Price cannot be negative");
            return self.fail("set_line_price", err.into());
        }
        self.edit_line("set_line_price", &table, line_id, |line| {
            line.price = price;
            line.modified = true;
        })
    }

    /// Manual rename; the line stops matching its menu item
    pub fn rename_line(&self, line_id: &str, name: &str) -> RegisterResult<OrderLine> {
        let table = self.begin_edit("rename_line")?;
        let name = name.trim();
        if name.is_empty() {
            return self.fail("rename_line", AppError::required("name").into());
        }
        self.edit_line("rename_line", &table, line_id, |line| {
            line.name = name.to_string();
            line.modified = true;
        })
    }

    fn edit_line(
        &self,
        op: &'static str,
        table: &str,
        line_id: &str,
        edit: impl FnOnce(&mut OrderLine),
    ) -> RegisterResult<OrderLine> {
        let edited = self.inner.state.lock().orders.edit_line(table, line_id, edit);
        match edited {
            Some(line) => {
                self.after_edit(table);
                Ok(line)
            }
            None => self.fail(op, RegisterError::LineNotFound(line_id.to_string())),
        }
    }

    pub fn remove_line(&self, line_id: &str) -> RegisterResult<OrderLine> {
        let table = self.begin_edit("remove_line")?;
        let removed = self.inner.state.lock().orders.remove_line(&table, line_id);
        match removed {
            Some(line) => {
                self.after_edit(&table);
                Ok(line)
            }
            None => self.fail("remove_line", RegisterError::LineNotFound(line_id.to_string())),
        }
    }

    // ========== Confirm / cancel ==========

    /// Write the order now and leave editing mode.
    ///
    /// A failed write keeps the register editing with nothing lost.
    pub async fn confirm_order(&self) -> RegisterResult<ConfirmOutcome> {
        let table = self.begin_edit("confirm_order")?;
        let had_pending = self.inner.scheduler.cancel(&sync_key(&table));
        self.cancel_autosave();

        let lines = self.lines(&table);
        let outcome = if lines.is_empty() {
            // Flush a pending removal of the last line
            if had_pending && let Err(e) = self.persist_order(&table).await {
                return Err(self.reported("confirm_order", e));
            }
            self.emit(RegisterEvent::Notice("No items in the order to confirm.".into()));
            ConfirmOutcome::NothingToConfirm {
                table: table.clone(),
            }
        } else {
            let order_id = match self.persist_order(&table).await {
                Ok(order_id) => order_id,
                Err(e) => {
                    self.schedule_sync(&table);
                    self.restart_inactivity_timer();
                    return Err(self.reported("confirm_order", e));
                }
            };
            tracing::info!(table = %table, order_id = %order_id, lines = lines.len(), "Order confirmed");
            self.emit(RegisterEvent::Notice("Order confirmed.".into()));
            ConfirmOutcome::Committed {
                table: table.clone(),
                order_id,
                total: lines_total(&lines),
            }
        };

        if !self.is_modal_open() {
            self.return_to_idle();
        }
        if let Err(e) = self.fetch_orders().await {
            self.report("fetch_orders", &e);
        }
        Ok(outcome)
    }

    /// Drop unsaved local edits of the selected table and leave editing
    /// mode; nothing is written remotely
    pub async fn cancel_order(&self) -> RegisterResult<()> {
        let table = self.require_table("cancel_order")?;
        self.require_not_settling("cancel_order", Some(table.as_str()))?;
        self.inner.scheduler.cancel(&sync_key(&table));
        self.cancel_autosave();
        if let Err(e) = self.inner.cache.remove(&table) {
            self.report("cache_remove", &RegisterError::from(e));
        }
        tracing::info!(table = %table, "Editing cancelled");
        self.return_to_idle();
        if let Err(e) = self.fetch_orders().await {
            self.report("fetch_orders", &e);
        }
        Ok(())
    }

    pub(super) fn return_to_idle(&self) {
        let was_editing = {
            let mut state = self.inner.state.lock();
            let was_editing = state.mode.is_editing();
            state.mode = Mode::Idle;
            was_editing
        };
        self.cancel_autosave();
        if was_editing {
            self.emit(RegisterEvent::EditingEnded);
            self.start_order_poll(true);
        }
    }

    // ========== Modals & inactivity ==========

    /// Opening any dialog suspends the inactivity timer
    pub fn open_modal(&self, modal: Modal) {
        self.inner.state.lock().modals.insert(modal);
        self.cancel_autosave();
    }

    /// Closing the last dialog while editing restarts the timer
    pub fn close_modal(&self, modal: Modal) {
        let resume = {
            let mut state = self.inner.state.lock();
            state.modals.remove(&modal);
            state.modals.is_empty() && state.mode.is_editing()
        };
        if resume {
            self.restart_inactivity_timer();
        }
    }

    /// Any keypress, click or touch while editing
    pub fn user_activity(&self) {
        self.restart_inactivity_timer();
    }

    pub(super) fn cancel_autosave(&self) {
        self.inner.scheduler.cancel(AUTOSAVE);
        self.inner.scheduler.cancel(AUTOSAVE_COMMIT);
    }

    pub(super) fn restart_inactivity_timer(&self) {
        let table = {
            let state = self.inner.state.lock();
            match state.mode.table() {
                Some(table) if state.modals.is_empty() => table.to_string(),
                _ => return,
            }
        };
        // A pending autosave commit survives user activity

        let weak = self.downgrade();
        self.inner.scheduler.schedule_debounced(
            AUTOSAVE,
            self.inner.config.inactivity_timeout(),
            move || async move {
                if let Some(register) = Register::upgrade(&weak) {
                    register.on_inactivity(table);
                }
            },
        );
    }

    /// Still editing `table` with no dialog open
    fn autosave_applies(&self, table: &str) -> bool {
        let state = self.inner.state.lock();
        state.modals.is_empty() && state.mode.table() == Some(table)
    }

    fn on_inactivity(&self, table: String) {
        if !self.autosave_applies(&table) {
            return;
        }
        tracing::info!(table = %table, "Inactivity timeout, autosaving");
        self.emit(RegisterEvent::AutosaveStarted {
            table: table.clone(),
        });

        let weak = self.downgrade();
        self.inner.scheduler.schedule_debounced(
            AUTOSAVE_COMMIT,
            self.inner.config.autosave_notice(),
            move || async move {
                if let Some(register) = Register::upgrade(&weak) {
                    register.autosave_commit(&table).await;
                }
            },
        );
    }

    async fn autosave_commit(&self, table: &str) {
        self.emit(RegisterEvent::AutosaveFinished {
            table: table.to_string(),
        });
        let occupied = self.inner.state.lock().orders.is_occupied(table);
        if !occupied || !self.autosave_applies(table) {
            return;
        }
        // Failures were already reported
        let _ = self.confirm_order().await;
    }
}
