//! Cash sessions, payments and refunds

use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{
    CashReport, CashSession, CashSessionCreate, CashSessionEnd, CashSessionTotals, PaymentRecord,
};
use shared::order::{OrderLine, PaymentStatus, lines_total};
use till_client::{Collection, Filter, Query};

use super::sync::{instant, unpaid_orders};
use super::{Modal, Register, sync_key};
use crate::cash;
use crate::events::RegisterEvent;
use crate::orders::TableOrders;
use crate::payment::{self, PaymentDraft, PaymentQuote, RefundDraft};
use crate::split::SplitAllocator;
use crate::utils::{RegisterError, RegisterResult};

/// A recorded payment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentOutcome {
    pub order_id: String,
    /// Ledger row as stored
    pub record: PaymentRecord,
    /// Change handed back
    pub change: Decimal,
}

#[derive(Serialize)]
struct MarkPaid {
    payment_status: PaymentStatus,
}

impl Register {
    // ========== Cash session ==========

    /// Open a new cash session; refused while one is open
    pub async fn start_session(&self) -> RegisterResult<CashSession> {
        let existing = self
            .check_active_session()
            .await
            .map_err(|e| self.reported("start_session", e))?;
        if existing.is_some() {
            return self.fail("start_session", RegisterError::SessionAlreadyActive);
        }

        let create = CashSessionCreate::starting_at(self.inner.clock.now());
        let mut stored: Vec<CashSession> = self
            .insert(Collection::CashSessions, &[create])
            .await
            .map_err(|e| self.reported("start_session", e))?;
        let Some(session) = stored.pop() else {
            let err = till_client::StoreError::Decode("no cash session row returned".into());
            return self.fail("start_session", err.into());
        };

        self.inner.state.lock().session = Some(session.clone());
        tracing::info!(session_id = session.id, start_time = %session.start_time, "Cash session started");
        self.emit(RegisterEvent::SessionStarted(session.clone()));
        Ok(session)
    }

    /// Close the open session, write its reconciled totals and purge the
    /// session's order rows. Refused while any table holds an order.
    pub async fn end_session(&self) -> RegisterResult<CashReport> {
        let Some(session) = self.active_session() else {
            return self.fail("end_session", RegisterError::NoActiveSession);
        };
        let open = self.inner.state.lock().orders.open_tables().len();
        if open > 0 {
            return self.fail("end_session", RegisterError::OpenTables { count: open });
        }

        let report = self
            .close_session(&session)
            .await
            .map_err(|e| self.reported("end_session", e))?;

        {
            let mut state = self.inner.state.lock();
            state.session = None;
            state.orders = TableOrders::new();
            state.modals.remove(&Modal::EndSession);
        }
        if let Err(e) = self.inner.cache.clear() {
            self.report("cache_clear", &RegisterError::from(e));
        }
        self.return_to_idle();
        self.emit(RegisterEvent::SessionClosed(report.clone()));
        Ok(report)
    }

    async fn close_session(&self, session: &CashSession) -> RegisterResult<CashReport> {
        let end_time = self.inner.clock.now();
        let by_id = Query::all().eq("id", session.id);
        self.update(
            Collection::CashSessions,
            &by_id,
            &CashSessionEnd {
                end_time,
                is_active: false,
            },
        )
        .await?;

        let report = self.reconcile(session, end_time).await?;
        self.update(
            Collection::CashSessions,
            &by_id,
            &CashSessionTotals {
                total_cash: report.combined.cash,
                total_card: report.combined.card,
                total_amount: report.combined.total,
            },
        )
        .await?;

        let purge = Query::all().any_of(vec![
            Filter::eq("status", "active"),
            Filter::eq("status", "completed"),
        ]);
        let purged = self.delete(Collection::Orders, &purge).await?;
        tracing::info!(
            session_id = session.id,
            total = %report.combined.total,
            purged_orders = purged,
            "Cash session closed"
        );
        Ok(report)
    }

    /// Totals over the payments of `session` up to `end_time`
    async fn reconcile(
        &self,
        session: &CashSession,
        end_time: chrono::DateTime<chrono::Utc>,
    ) -> RegisterResult<CashReport> {
        let query = Query::all()
            .gte("created_at", instant(session.start_time))
            .lte("created_at", instant(end_time));
        let records: Vec<PaymentRecord> = self.select(Collection::Payments, &query).await?;
        Ok(cash::build_report(
            session,
            end_time,
            &records,
            self.total_open_tables(),
        ))
    }

    /// Cash control preview of the most recent session, open or closed.
    /// An open session is reconciled up to now.
    pub async fn cash_control(&self) -> RegisterResult<CashReport> {
        let query = Query::all().order_desc("start_time").limit(1);
        let sessions: Vec<CashSession> = self
            .select(Collection::CashSessions, &query)
            .await
            .map_err(|e| self.reported("cash_control", e))?;
        let Some(session) = sessions.into_iter().next() else {
            return self.fail("cash_control", RegisterError::NoSessionFound);
        };
        let end_time = session.end_time.unwrap_or_else(|| self.inner.clock.now());
        self.reconcile(&session, end_time)
            .await
            .map_err(|e| self.reported("cash_control", e))
    }

    // ========== Payment ==========

    /// Begin a split of the selected order
    pub fn open_split(&self) -> RegisterResult<SplitAllocator> {
        let table = self.begin_edit("open_split")?;
        let lines = self.lines(&table);
        if lines.is_empty() {
            return self.fail("open_split", RegisterError::EmptyOrder);
        }
        self.open_modal(Modal::Split);
        Ok(SplitAllocator::from_lines(&lines))
    }

    /// Take payment for the selected table.
    ///
    /// Appends the ledger row, marks the order row paid and frees the
    /// table. When the tender is short nothing is written.
    pub async fn confirm_payment(&self, draft: PaymentDraft) -> RegisterResult<PaymentOutcome> {
        let table = self.begin_edit("confirm_payment")?;
        let lines = self.lines(&table);
        if lines.is_empty() {
            return self.fail("confirm_payment", RegisterError::EmptyOrder);
        }
        let quote = payment::quote(lines_total(&lines), &draft)
            .map_err(|e| self.reported("confirm_payment", e))?;

        self.inner.scheduler.cancel(&sync_key(&table));
        self.cancel_autosave();

        // Edits are refused until the ledger row and the paid mark land
        self.inner.state.lock().settling = Some(table.clone());
        let settled = self.settle(&table, &lines, &quote).await;
        self.inner.state.lock().settling = None;

        let (order_id, record) = match settled {
            Ok(settled) => settled,
            Err(e) => {
                // Unpaid edits still need to reach the store
                self.schedule_sync(&table);
                self.restart_inactivity_timer();
                return Err(self.reported("confirm_payment", e));
            }
        };

        {
            let mut state = self.inner.state.lock();
            state.orders.clear(&table);
            state.modals.remove(&Modal::Payment);
            state.modals.remove(&Modal::Split);
        }
        if let Err(e) = self.inner.cache.remove(&table) {
            self.report("cache_remove", &RegisterError::from(e));
        }
        tracing::info!(
            table = %table,
            order_id = %order_id,
            total = %record.total_amount,
            change = %quote.change,
            "Payment recorded"
        );
        self.return_to_idle();
        self.emit(RegisterEvent::PaymentRecorded(record.clone()));
        if let Err(e) = self.fetch_orders().await {
            self.report("fetch_orders", &e);
        }

        Ok(PaymentOutcome {
            order_id,
            record,
            change: quote.change,
        })
    }

    async fn settle(
        &self,
        table: &str,
        lines: &[OrderLine],
        quote: &PaymentQuote,
    ) -> RegisterResult<(String, PaymentRecord)> {
        let _slot = self.inner.order_writes.lock().await;
        let order_id = self.get_or_create_order_id(table).await?;

        let record = payment::sale_record(table, lines, quote, self.inner.clock.now());
        let mut stored: Vec<PaymentRecord> =
            self.insert(Collection::Payments, &[record.clone()]).await?;

        let unpaid = unpaid_orders()
            .eq("table_id", table)
            .eq("order_id", order_id.as_str());
        let marked = self
            .update(
                Collection::Orders,
                &unpaid,
                &MarkPaid {
                    payment_status: PaymentStatus::Paid,
                },
            )
            .await?;
        if marked == 0 {
            tracing::warn!(table = %table, order_id = %order_id, "No unpaid order row to mark paid");
        }
        Ok((order_id, stored.pop().unwrap_or(record)))
    }

    // ========== Refund & receipts ==========

    /// Append a refund row to the ledger
    pub async fn record_refund(&self, draft: RefundDraft) -> RegisterResult<PaymentRecord> {
        self.require_session("record_refund")?;
        let record = payment::refund_record(&draft, self.inner.clock.now())
            .map_err(|e| self.reported("record_refund", e))?;
        let mut stored: Vec<PaymentRecord> = self
            .insert(Collection::Payments, &[record.clone()])
            .await
            .map_err(|e| self.reported("record_refund", e))?;
        let record = stored.pop().unwrap_or(record);
        tracing::info!(amount = %record.total_amount, "Refund recorded");
        self.close_modal(Modal::Refund);
        self.emit(RegisterEvent::RefundRecorded(record.clone()));
        Ok(record)
    }

    /// Every ledger row, newest first
    pub async fn receipts(&self) -> RegisterResult<Vec<PaymentRecord>> {
        self.select(Collection::Payments, &Query::all().order_desc("created_at"))
            .await
            .map_err(|e| self.reported("receipts", e))
    }
}
