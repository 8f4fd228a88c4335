//! In-process [`RemoteStore`]
//!
//! Rows live in a mutex-guarded map; ids are assigned on insert. Filters
//! follow SQL null semantics: `eq`, `neq`, `gte` and `lte` never match a
//! null column. Timestamps are compared as instants when both sides parse
//! as RFC 3339.
//!
//! Every write is appended to a journal, and failures can be queued per
//! operation so tests can drive the error paths.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use parking_lot::Mutex;
use serde_json::Value;

use crate::query::value_text;
use crate::{Clause, Collection, Condition, Filter, Query, RemoteStore, StoreError, StoreResult};

/// Store operation, used to target injected failures and label journal entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Select,
    Insert,
    Update,
    Delete,
}

/// One journaled write
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    pub op: StoreOp,
    pub collection: Collection,
    /// Rows as written (inserted, updated or deleted)
    pub rows: Vec<Value>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<Collection, Vec<Value>>,
    next_id: i64,
    journal: Vec<WriteRecord>,
    failures: VecDeque<(Option<StoreOp>, StoreError)>,
    refresh_failures: usize,
    refresh_calls: usize,
}

impl Inner {
    fn take_failure(&mut self, op: StoreOp) -> Option<StoreError> {
        let index = self
            .failures
            .iter()
            .position(|(target, _)| target.is_none_or(|t| t == op))?;
        self.failures.remove(index).map(|(_, err)| err)
    }
}

/// In-memory remote store
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows directly, bypassing the journal
    pub fn seed(&self, collection: Collection, rows: impl IntoIterator<Item = Value>) {
        let mut inner = self.inner.lock();
        for row in rows {
            let row = assign_id(&mut inner.next_id, row);
            inner.collections.entry(collection).or_default().push(row);
        }
    }

    /// Current rows of a collection, in insertion order
    pub fn rows(&self, collection: Collection) -> Vec<Value> {
        self.inner
            .lock()
            .collections
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    /// All journaled writes so far
    pub fn journal(&self) -> Vec<WriteRecord> {
        self.inner.lock().journal.clone()
    }

    /// Journaled writes of one kind against one collection
    pub fn writes(&self, op: StoreOp, collection: Collection) -> Vec<WriteRecord> {
        self.inner
            .lock()
            .journal
            .iter()
            .filter(|w| w.op == op && w.collection == collection)
            .cloned()
            .collect()
    }

    pub fn clear_journal(&self) {
        self.inner.lock().journal.clear();
    }

    /// Fail the next `op` (any op when `None`) with `error`
    pub fn fail_next(&self, op: Option<StoreOp>, error: StoreError) {
        self.inner.lock().failures.push_back((op, error));
    }

    /// Make the next `count` session refreshes fail
    pub fn fail_refreshes(&self, count: usize) {
        self.inner.lock().refresh_failures = count;
    }

    pub fn refresh_calls(&self) -> usize {
        self.inner.lock().refresh_calls
    }
}

fn assign_id(next_id: &mut i64, row: Value) -> Value {
    match row {
        Value::Object(mut map) => {
            match map.get("id").and_then(Value::as_i64) {
                Some(id) => *next_id = (*next_id).max(id),
                None => {
                    *next_id += 1;
                    map.insert("id".to_string(), Value::from(*next_id));
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

fn column<'a>(row: &'a Value, name: &str) -> Option<&'a Value> {
    row.get(name).filter(|v| !v.is_null())
}

fn parse_instant(value: &Value) -> Option<DateTime<FixedOffset>> {
    value.as_str().and_then(|s| DateTime::parse_from_rfc3339(s).ok())
}

/// Ordering between two non-null values
fn compare(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (parse_instant(a), parse_instant(b)) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    if let (Some(x), Some(y)) = (a.as_bool(), b.as_bool()) {
        return x.cmp(&y);
    }
    value_text(a).cmp(&value_text(b))
}

fn matches_filter(row: &Value, filter: &Filter) -> bool {
    let value = column(row, &filter.column);
    match (&filter.condition, value) {
        (Condition::IsNull, v) => v.is_none(),
        (Condition::NotNull, v) => v.is_some(),
        (_, None) => false,
        (Condition::Eq(expected), Some(v)) => compare(v, expected) == Ordering::Equal,
        (Condition::Neq(expected), Some(v)) => compare(v, expected) != Ordering::Equal,
        (Condition::Gte(bound), Some(v)) => compare(v, bound) != Ordering::Less,
        (Condition::Lte(bound), Some(v)) => compare(v, bound) != Ordering::Greater,
    }
}

fn matches(row: &Value, query: &Query) -> bool {
    query.clauses.iter().all(|clause| match clause {
        Clause::Where(filter) => matches_filter(row, filter),
        Clause::AnyOf(filters) => filters.iter().any(|f| matches_filter(row, f)),
    })
}

fn merge(row: &mut Value, patch: &Value) {
    if let (Value::Object(target), Value::Object(source)) = (row, patch) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, collection: Collection, query: &Query) -> StoreResult<Vec<Value>> {
        let mut inner = self.inner.lock();
        if let Some(err) = inner.take_failure(StoreOp::Select) {
            return Err(err);
        }
        let mut rows: Vec<Value> = inner
            .collections
            .get(&collection)
            .map(|rows| rows.iter().filter(|r| matches(r, query)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = match (column(a, &order.column), column(b, &order.column)) {
                    (Some(x), Some(y)) => compare(x, y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, collection: Collection, rows: Vec<Value>) -> StoreResult<Vec<Value>> {
        let mut inner = self.inner.lock();
        if let Some(err) = inner.take_failure(StoreOp::Insert) {
            return Err(err);
        }
        if let Some(bad) = rows.iter().find(|r| !r.is_object()) {
            return Err(StoreError::Validation(format!("row is not an object: {}", bad)));
        }
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let row = assign_id(&mut inner.next_id, row);
            stored.push(row);
        }
        inner
            .collections
            .entry(collection)
            .or_default()
            .extend(stored.iter().cloned());
        inner.journal.push(WriteRecord {
            op: StoreOp::Insert,
            collection,
            rows: stored.clone(),
        });
        Ok(stored)
    }

    async fn update(
        &self,
        collection: Collection,
        query: &Query,
        patch: Value,
    ) -> StoreResult<Vec<Value>> {
        let mut inner = self.inner.lock();
        if let Some(err) = inner.take_failure(StoreOp::Update) {
            return Err(err);
        }
        if !patch.is_object() {
            return Err(StoreError::Validation("patch is not an object".into()));
        }
        let mut updated = Vec::new();
        if let Some(rows) = inner.collections.get_mut(&collection) {
            for row in rows.iter_mut().filter(|r| matches(r, query)) {
                merge(row, &patch);
                updated.push(row.clone());
            }
        }
        inner.journal.push(WriteRecord {
            op: StoreOp::Update,
            collection,
            rows: updated.clone(),
        });
        Ok(updated)
    }

    async fn delete(&self, collection: Collection, query: &Query) -> StoreResult<usize> {
        let mut inner = self.inner.lock();
        if let Some(err) = inner.take_failure(StoreOp::Delete) {
            return Err(err);
        }
        let mut removed = Vec::new();
        if let Some(rows) = inner.collections.get_mut(&collection) {
            let (gone, kept): (Vec<Value>, Vec<Value>) =
                rows.drain(..).partition(|r| matches(r, query));
            *rows = kept;
            removed = gone;
        }
        let count = removed.len();
        inner.journal.push(WriteRecord {
            op: StoreOp::Delete,
            collection,
            rows: removed,
        });
        Ok(count)
    }

    async fn refresh_session(&self) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner.refresh_calls += 1;
        if inner.refresh_failures > 0 {
            inner.refresh_failures -= 1;
            return Err(StoreError::Unauthorized("refresh token rejected".into()));
        }
        Ok(())
    }
}

