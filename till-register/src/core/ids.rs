//! Id and time providers
//!
//! Injected into the register so line ids, order ids and timestamps stay
//! deterministic under test.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

/// Mints unique identifiers
pub trait IdProvider: Send + Sync {
    /// Id of a new order line on `table`
    fn line_id(&self, table: &str) -> String;

    /// Id of a new order on `table`
    fn order_id(&self, table: &str) -> String;
}

/// UUID v4 backed ids
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdProvider for UuidIds {
    fn line_id(&self, _table: &str) -> String {
        Uuid::new_v4().to_string()
    }

    fn order_id(&self, table: &str) -> String {
        format!("{}_{}", table, Uuid::new_v4().simple())
    }
}

/// Counter backed ids (`line-1`, `T1_order-2`, ...)
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl IdProvider for SequentialIds {
    fn line_id(&self, _table: &str) -> String {
        format!("line-{}", self.bump())
    }

    fn order_id(&self, table: &str) -> String {
        format!("{}_order-{}", table, self.bump())
    }
}

/// Wall clock
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uuid_ids_are_unique() {
        let ids = UuidIds;
        let minted: HashSet<_> = (0..1000).map(|_| ids.line_id("T1")).collect();
        assert_eq!(minted.len(), 1000);
        assert!(ids.order_id("T1").starts_with("T1_"));
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::new();
        assert_eq!(ids.line_id("T1"), "line-1");
        assert_eq!(ids.order_id("T1"), "T1_order-2");
    }

    #[test]
    fn test_manual_clock() {
        let start = "2026-10-19T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let clock = ManualClock::new(start);
        clock.advance(Duration::hours(2));
        assert_eq!(clock.now(), start + Duration::hours(2));
    }
}
