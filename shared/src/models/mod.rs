//! Register domain models
//!
//! Rows mirror the remote store's collections: `tables`, `menu`,
//! `payments`, `cash_sessions`. Order rows live in [`crate::order`].

pub mod cash_session;
pub mod dining_table;
pub mod menu;
pub mod payment;

pub use cash_session::*;
pub use dining_table::*;
pub use menu::*;
pub use payment::*;
