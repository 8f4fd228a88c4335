//! In-memory session state owned by the register

use std::collections::HashSet;

use serde::Serialize;
use shared::models::{CashSession, DiningTable, Menu};

use crate::orders::TableOrders;

/// Editing mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// Table list visible, no table selected
    Idle,
    /// Order of `table` being edited
    Editing { table: String },
}

impl Mode {
    pub fn table(&self) -> Option<&str> {
        match self {
            Mode::Idle => None,
            Mode::Editing { table } => Some(table),
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, Mode::Editing { .. })
    }
}

/// Modal dialogs; while any is open the inactivity timer is suspended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Modal {
    Payment,
    Split,
    Receipts,
    CurrentOrder,
    EndSession,
    Refund,
    CashControl,
}

pub(crate) struct SessionState {
    pub mode: Mode,
    /// Single source of truth while editing
    pub orders: TableOrders,
    pub tables: Vec<DiningTable>,
    pub menu: Menu,
    /// The open cash session, if any
    pub session: Option<CashSession>,
    pub modals: HashSet<Modal>,
    /// Credentials could not be renewed
    pub expired: bool,
    /// Background polls were started
    pub polling: bool,
    /// Table whose payment is being written
    pub settling: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            mode: Mode::Idle,
            orders: TableOrders::new(),
            tables: Vec::new(),
            menu: Menu::new(),
            session: None,
            modals: HashSet::new(),
            expired: false,
            polling: false,
            settling: None,
        }
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.name == name)
    }

    pub fn is_settling(&self, table: &str) -> bool {
        self.settling.as_deref() == Some(table)
    }

    pub fn table_notes(&self, name: &str) -> Option<String> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .and_then(|t| t.notes.clone())
    }
}
