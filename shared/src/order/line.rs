//! Order line value type

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Destination;

/// One line of a table's order (订单行)
///
/// `id` is the stable identity for edits and removal. `modified` marks a
/// line whose name or price no longer matches its menu item; such lines never
/// absorb later menu adds of the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    #[serde(default)]
    pub modified: bool,
    #[serde(default, rename = "destinazione", skip_serializing_if = "Option::is_none")]
    pub destination: Option<Destination>,
}

impl OrderLine {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal, quantity: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            quantity,
            modified: false,
            destination: None,
        }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }

    /// price × quantity, unrounded
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Σ(price × quantity), unrounded
pub fn lines_total(lines: &[OrderLine]) -> Decimal {
    lines.iter().map(OrderLine::line_total).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total_is_exact() {
        let lines = vec![
            OrderLine::new("a", "Caffè", Decimal::new(110, 2), 3),
            OrderLine::new("b", "Acqua", Decimal::new(5, 1), 1),
        ];
        assert_eq!(lines_total(&lines), Decimal::new(380, 2));
    }

    #[test]
    fn test_line_without_optional_fields() {
        let line: OrderLine = serde_json::from_value(serde_json::json!({
            "id": "T1_1", "name": "Pane", "price": 2, "quantity": 1
        }))
        .unwrap();
        assert!(!line.modified);
        assert!(line.destination.is_none());
    }
}
