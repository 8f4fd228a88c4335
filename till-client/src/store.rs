//! Remote store trait

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Query, StoreError, StoreResult};

/// Collections the register reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Tables,
    Menu,
    Orders,
    Payments,
    CashSessions,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Tables => "tables",
            Collection::Menu => "menu",
            Collection::Orders => "orders",
            Collection::Payments => "payments",
            Collection::CashSessions => "cash_sessions",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generic filtered CRUD over the register's collections
///
/// Rows travel as JSON objects; [`RemoteStoreExt`] adds typed helpers.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Rows matching `query`
    async fn select(&self, collection: Collection, query: &Query) -> StoreResult<Vec<Value>>;

    /// Insert rows, returning them as stored (with assigned ids)
    async fn insert(&self, collection: Collection, rows: Vec<Value>) -> StoreResult<Vec<Value>>;

    /// Apply `patch` to every row matching `query`, returning updated rows
    async fn update(
        &self,
        collection: Collection,
        query: &Query,
        patch: Value,
    ) -> StoreResult<Vec<Value>>;

    /// Delete every row matching `query`, returning how many went
    async fn delete(&self, collection: Collection, query: &Query) -> StoreResult<usize>;

    /// Renew expired credentials
    async fn refresh_session(&self) -> StoreResult<()>;
}

/// Typed helpers over [`RemoteStore`]
#[async_trait]
pub trait RemoteStoreExt: RemoteStore {
    async fn select_as<T: DeserializeOwned + Send>(
        &self,
        collection: Collection,
        query: &Query,
    ) -> StoreResult<Vec<T>> {
        self.select(collection, query)
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(StoreError::from))
            .collect()
    }

    async fn insert_as<T: Serialize + Sync, R: DeserializeOwned + Send>(
        &self,
        collection: Collection,
        rows: &[T],
    ) -> StoreResult<Vec<R>> {
        let values = rows
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.insert(collection, values)
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(StoreError::from))
            .collect()
    }

    async fn update_with<P: Serialize + Sync>(
        &self,
        collection: Collection,
        query: &Query,
        patch: &P,
    ) -> StoreResult<Vec<Value>> {
        let patch = serde_json::to_value(patch)?;
        self.update(collection, query, patch).await
    }
}

impl<S: RemoteStore + ?Sized> RemoteStoreExt for S {}
