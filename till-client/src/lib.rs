//! Till Client - remote tabular store boundary
//!
//! The register talks to its backend only through [`RemoteStore`]: select,
//! insert, update and delete over named collections, narrowed by a typed
//! [`Query`]. [`RestStore`] speaks a PostgREST-style HTTP dialect;
//! [`MemoryStore`] (feature `in-memory`) keeps rows in process.

pub mod error;
pub mod query;
pub mod rest;
pub mod store;

#[cfg(feature = "in-memory")]
pub mod memory;

pub use error::{StoreError, StoreErrorKind, StoreResult};
pub use query::{Clause, Condition, Filter, Order, Query};
pub use rest::{RestStore, RestStoreConfig, SessionRefresher};
pub use store::{Collection, RemoteStore, RemoteStoreExt};

#[cfg(feature = "in-memory")]
pub use memory::{MemoryStore, StoreOp, WriteRecord};
