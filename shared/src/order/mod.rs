//! Order value types
//!
//! - [`OrderLine`]: one line of a table's in-progress order
//! - [`OrderRow`]: the remote `orders` row mirroring that order
//! - [`SplitContribution`]: what one split customer paid

pub mod line;
pub mod row;
pub mod split;

pub use line::{OrderLine, lines_total};
pub use row::{OrderRow, OrderStatus, PaymentStatus};
pub use split::SplitContribution;
