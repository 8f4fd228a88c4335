//! Per-table order collections
//!
//! A table absent from the book, or mapped to no lines, is free. Totals are
//! exact `Decimal` sums; rounding happens only at ledger/report boundaries.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use shared::models::{Destination, MenuItem};
use shared::order::{OrderLine, lines_total};

use crate::core::IdProvider;

/// What to add: a menu item, or an existing line when `id` is set
#[derive(Debug, Clone, PartialEq)]
pub struct LineSpec {
    pub id: Option<String>,
    pub name: String,
    pub price: Decimal,
    pub destination: Option<Destination>,
}

impl LineSpec {
    /// Target an existing line by id
    pub fn line(line: &OrderLine) -> Self {
        Self {
            id: Some(line.id.clone()),
            name: line.name.clone(),
            price: line.price,
            destination: line.destination,
        }
    }
}

impl From<&MenuItem> for LineSpec {
    fn from(item: &MenuItem) -> Self {
        Self {
            id: None,
            name: item.name.clone(),
            price: item.price,
            destination: Some(item.destination),
        }
    }
}

/// Outcome of [`TableOrders::add_or_increment`]
#[derive(Debug, Clone, PartialEq)]
pub enum LineChange {
    Added(OrderLine),
    Updated(OrderLine),
    Removed(OrderLine),
    /// Nothing matched and the delta was not positive
    Unchanged,
}

/// Table name → order lines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableOrders {
    tables: BTreeMap<String, Vec<OrderLine>>,
}

impl TableOrders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self, table: &str) -> &[OrderLine] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn line(&self, table: &str, line_id: &str) -> Option<&OrderLine> {
        self.lines(table).iter().find(|l| l.id == line_id)
    }

    /// Replace a table's lines wholesale
    pub fn set(&mut self, table: &str, lines: Vec<OrderLine>) {
        self.tables.insert(table.to_string(), lines);
    }

    /// Drop a table's order; returns the lines it held
    pub fn clear(&mut self, table: &str) -> Vec<OrderLine> {
        self.tables.remove(table).unwrap_or_default()
    }

    pub fn is_occupied(&self, table: &str) -> bool {
        !self.lines(table).is_empty()
    }

    /// Names of tables holding a nonempty order
    pub fn open_tables(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|(_, lines)| !lines.is_empty())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn has_open_tables(&self) -> bool {
        self.tables.values().any(|lines| !lines.is_empty())
    }

    /// Σ(price × quantity) over one table
    pub fn total(&self, table: &str) -> Decimal {
        lines_total(self.lines(table))
    }

    /// Σ(price × quantity) over every table
    pub fn total_all(&self) -> Decimal {
        self.tables.values().map(|lines| lines_total(lines)).sum()
    }

    /// Keep only tables whose name passes `keep`
    pub fn retain_tables(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.tables.retain(|name, _| keep(name));
    }

    /// Add `delta` units of `spec` to `table`.
    ///
    /// Matches by `spec.id` when given, otherwise by name among lines that
    /// were never edited by hand. A matched line reaching quantity ≤ 0 is
    /// removed. `price_override` replaces the price; on an existing line a
    /// different price marks it modified.
    pub fn add_or_increment(
        &mut self,
        table: &str,
        spec: &LineSpec,
        delta: i32,
        price_override: Option<Decimal>,
        ids: &dyn IdProvider,
    ) -> LineChange {
        let lines = self.tables.entry(table.to_string()).or_default();
        let index = match &spec.id {
            Some(id) => lines.iter().position(|l| &l.id == id),
            None => lines.iter().position(|l| l.name == spec.name && !l.modified),
        };

        match index {
            Some(i) => {
                let quantity = lines[i].quantity.saturating_add(delta);
                if quantity <= 0 {
                    return LineChange::Removed(lines.remove(i));
                }
                let line = &mut lines[i];
                line.quantity = quantity;
                if let Some(price) = price_override
                    && price != line.price
                {
                    line.price = price;
                    line.modified = true;
                }
                LineChange::Updated(line.clone())
            }
            None if delta > 0 => {
                let line = OrderLine {
                    id: ids.line_id(table),
                    name: spec.name.clone(),
                    price: price_override.unwrap_or(spec.price),
                    quantity: delta,
                    modified: false,
                    destination: spec.destination,
                };
                lines.push(line.clone());
                LineChange::Added(line)
            }
            None => LineChange::Unchanged,
        }
    }

    /// Delete every line whose quantity is ≤ 0; returns how many went
    pub fn remove_if_zero(&mut self, table: &str) -> usize {
        match self.tables.get_mut(table) {
            Some(lines) => {
                let before = lines.len();
                lines.retain(|l| l.quantity > 0);
                before - lines.len()
            }
            None => 0,
        }
    }

    /// Edit a line in place by id; `None` when no such line
    pub fn edit_line(
        &mut self,
        table: &str,
        line_id: &str,
        edit: impl FnOnce(&mut OrderLine),
    ) -> Option<OrderLine> {
        let line = self
            .tables
            .get_mut(table)?
            .iter_mut()
            .find(|l| l.id == line_id)?;
        edit(line);
        Some(line.clone())
    }

    /// Remove a line by id
    pub fn remove_line(&mut self, table: &str, line_id: &str) -> Option<OrderLine> {
        let lines = self.tables.get_mut(table)?;
        let index = lines.iter().position(|l| l.id == line_id)?;
        Some(lines.remove(index))
    }
}

impl FromIterator<(String, Vec<OrderLine>)> for TableOrders {
    fn from_iter<I: IntoIterator<Item = (String, Vec<OrderLine>)>>(iter: I) -> Self {
        Self {
            tables: iter.into_iter().collect(),
        }
    }
}
