//! redb-based local durable order cache
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `table_orders` | table name | `Vec<OrderLine>` (JSON) | Order being edited on that table |
//!
//! Written on every in-memory order change, read once when a table is
//! selected, dropped on cancel and on payment. Survives restarts so a reload
//! resumes the same order.
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate`: once `commit()` returns the
//! entry is on disk, and the file stays consistent across power loss.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::order::OrderLine;
use thiserror::Error;

/// key = table name, value = JSON-serialized order lines
const TABLE_ORDERS: TableDefinition<&str, &[u8]> = TableDefinition::new("table_orders");

/// Cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Per-table order cache backed by redb
#[derive(Clone)]
pub struct LocalOrderCache {
    db: Arc<Database>,
}

impl LocalOrderCache {
    /// Open or create the cache file, creating parent directories
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory cache (tests, ephemeral registers)
    pub fn open_in_memory() -> CacheResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> CacheResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(TABLE_ORDERS)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Store the current lines of `table`
    pub fn save(&self, table: &str, lines: &[OrderLine]) -> CacheResult<()> {
        let value = serde_json::to_vec(lines)?;
        let txn = self.db.begin_write()?;
        {
            let mut orders = txn.open_table(TABLE_ORDERS)?;
            orders.insert(table, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Cached lines of `table`, if any were saved
    pub fn load(&self, table: &str) -> CacheResult<Option<Vec<OrderLine>>> {
        let read_txn = self.db.begin_read()?;
        let orders = read_txn.open_table(TABLE_ORDERS)?;

        match orders.get(table)? {
            Some(value) => {
                let lines: Vec<OrderLine> = serde_json::from_slice(value.value())?;
                Ok(Some(lines))
            }
            None => Ok(None),
        }
    }

    /// Drop the entry of `table`; returns whether one existed
    pub fn remove(&self, table: &str) -> CacheResult<bool> {
        let txn = self.db.begin_write()?;
        let existed = {
            let mut orders = txn.open_table(TABLE_ORDERS)?;
            orders.remove(table)?.is_some()
        };
        txn.commit()?;
        Ok(existed)
    }

    /// Names of every cached table
    pub fn tables(&self) -> CacheResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let orders = read_txn.open_table(TABLE_ORDERS)?;

        let mut names = Vec::new();
        for result in orders.iter()? {
            let (key, _value) = result?;
            names.push(key.value().to_string());
        }
        Ok(names)
    }

    /// Drop every entry
    pub fn clear(&self) -> CacheResult<usize> {
        let names = self.tables()?;
        let txn = self.db.begin_write()?;
        {
            let mut orders = txn.open_table(TABLE_ORDERS)?;
            for name in &names {
                orders.remove(name.as_str())?;
            }
        }
        txn.commit()?;
        Ok(names.len())
    }
}
