//! Order model and local persistence
//!
//! - [`book`]: per-table order lines and the add/increment rules
//! - [`cache`]: redb mirror of the order being edited

pub mod book;
pub mod cache;

pub use book::{LineChange, LineSpec, TableOrders};
pub use cache::{CacheError, CacheResult, LocalOrderCache};
