//! Split payment allocator
//!
//! An order is expanded into unit items (one per unit of quantity, id
//! `lineId-n` with n counting from 1) so that single units can go to
//! different customers.
//! Customers are served one at a time: only the last, unsettled customer can
//! select units or tender money. Confirming moves the selected units into the
//! claimed set, reduces the remaining total and reports the customer's
//! (cash, card) as a [`SplitContribution`]. Settled customers stay in the list
//! read-only.
//!
//! Nothing here touches the ledger; the payment flow folds the contributions
//! into the final payment.

use std::collections::{BTreeSet, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;
use shared::order::{OrderLine, SplitContribution, lines_total};

use crate::utils::{RegisterError, RegisterResult};

/// One unit of an order line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitItem {
    /// `lineId-n`, 1-based
    pub id: String,
    pub line_id: String,
    pub name: String,
    pub price: Decimal,
}

/// A customer of the split dialog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitCustomer {
    /// 1-based, in creation order
    pub id: u32,
    pub selected: BTreeSet<String>,
    pub cash: Decimal,
    pub card: Decimal,
    pub is_paid: bool,
}

impl SplitCustomer {
    fn new(id: u32) -> Self {
        Self {
            id,
            selected: BTreeSet::new(),
            cash: Decimal::ZERO,
            card: Decimal::ZERO,
            is_paid: false,
        }
    }

    pub fn tendered(&self) -> Decimal {
        self.cash + self.card
    }
}

/// Result of a successful confirm
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitSettlement {
    pub customer_id: u32,
    pub items_total: Decimal,
    /// Handed back to the customer, never stored
    pub change: Decimal,
    pub contribution: SplitContribution,
    pub remaining_total: Decimal,
    /// Whole order settled; the dialog closes
    pub complete: bool,
}

/// Split payment dialog state
#[derive(Debug, Clone)]
pub struct SplitAllocator {
    units: Vec<UnitItem>,
    customers: Vec<SplitCustomer>,
    claimed: HashSet<String>,
    remaining_total: Decimal,
    contributions: Vec<SplitContribution>,
}

/// Expand lines into unit items
pub fn expand_units(lines: &[OrderLine]) -> Vec<UnitItem> {
    lines
        .iter()
        .flat_map(|line| {
            (1..=line.quantity.max(0)).map(move |index| UnitItem {
                id: format!("{}-{}", line.id, index),
                line_id: line.id.clone(),
                name: line.name.clone(),
                price: line.price,
            })
        })
        .collect()
}

impl SplitAllocator {
    /// Start a split over `lines` with the given grand total
    pub fn new(lines: &[OrderLine], total: Decimal) -> Self {
        Self {
            units: expand_units(lines),
            customers: vec![SplitCustomer::new(1)],
            claimed: HashSet::new(),
            remaining_total: total,
            contributions: Vec::new(),
        }
    }

    /// Start a split whose total is the lines' own total
    pub fn from_lines(lines: &[OrderLine]) -> Self {
        Self::new(lines, lines_total(lines))
    }

    pub fn units(&self) -> &[UnitItem] {
        &self.units
    }

    /// Units not claimed by a settled customer
    pub fn available_units(&self) -> impl Iterator<Item = &UnitItem> {
        self.units.iter().filter(|u| !self.claimed.contains(&u.id))
    }

    pub fn is_claimed(&self, unit_id: &str) -> bool {
        self.claimed.contains(unit_id)
    }

    pub fn customers(&self) -> &[SplitCustomer] {
        &self.customers
    }

    pub fn remaining_total(&self) -> Decimal {
        self.remaining_total
    }

    pub fn is_complete(&self) -> bool {
        self.remaining_total <= Decimal::ZERO
    }

    /// Contributions reported so far, one per settled customer
    pub fn contributions(&self) -> &[SplitContribution] {
        &self.contributions
    }

    /// Sum of every reported contribution
    pub fn total_contribution(&self) -> SplitContribution {
        SplitContribution::sum(&self.contributions)
    }

    /// The customer currently being served
    pub fn active_customer(&self) -> Option<&SplitCustomer> {
        self.customers.last().filter(|c| !c.is_paid)
    }

    fn active_mut(&mut self) -> RegisterResult<&mut SplitCustomer> {
        if self.is_complete() {
            return Err(RegisterError::SplitComplete);
        }
        self.customers
            .last_mut()
            .filter(|c| !c.is_paid)
            .ok_or(RegisterError::SplitComplete)
    }

    /// Toggle a unit for the active customer; returns whether it is now selected
    pub fn toggle_unit(&mut self, unit_id: &str) -> RegisterResult<bool> {
        if !self.units.iter().any(|u| u.id == unit_id) || self.claimed.contains(unit_id) {
            return Err(RegisterError::UnitUnavailable(unit_id.to_string()));
        }
        let customer = self.active_mut()?;
        if customer.selected.remove(unit_id) {
            Ok(false)
        } else {
            customer.selected.insert(unit_id.to_string());
            Ok(true)
        }
    }

    /// Set what the active customer hands over
    pub fn set_tender(&mut self, cash: Decimal, card: Decimal) -> RegisterResult<()> {
        let customer = self.active_mut()?;
        customer.cash = cash;
        customer.card = card;
        Ok(())
    }

    /// Σ price of the active customer's selected units
    pub fn customer_items_total(&self) -> Decimal {
        match self.active_customer() {
            Some(customer) => self
                .units
                .iter()
                .filter(|u| customer.selected.contains(&u.id))
                .map(|u| u.price)
                .sum(),
            None => Decimal::ZERO,
        }
    }

    pub fn customer_tendered(&self) -> Decimal {
        self.active_customer()
            .map(SplitCustomer::tendered)
            .unwrap_or(Decimal::ZERO)
    }

    /// Settle the active customer.
    ///
    /// Fails without touching any state when the tender does not cover the
    /// selected units.
    pub fn confirm(&mut self) -> RegisterResult<SplitSettlement> {
        let items_total = self.customer_items_total();
        let tendered = self.customer_tendered();
        let customer = self.active_mut()?;
        if tendered < items_total {
            return Err(RegisterError::SplitInsufficientAmount {
                tendered,
                due: items_total,
            });
        }

        customer.is_paid = true;
        let customer_id = customer.id;
        let contribution = SplitContribution::new(customer.cash, customer.card);
        let selected: Vec<String> = customer.selected.iter().cloned().collect();

        self.claimed.extend(selected);
        self.remaining_total -= items_total;
        self.contributions.push(contribution);

        let complete = self.is_complete();
        if !complete {
            let next_id = customer_id + 1;
            self.customers.push(SplitCustomer::new(next_id));
        }
        tracing::debug!(
            customer = customer_id,
            items_total = %items_total,
            remaining = %self.remaining_total,
            "split customer settled"
        );

        Ok(SplitSettlement {
            customer_id,
            items_total,
            change: tendered - items_total,
            contribution,
            remaining_total: self.remaining_total,
            complete,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Vec<OrderLine> {
        vec![
            OrderLine::new("pizza", "Margherita", Decimal::from(8), 2),
            OrderLine::new("beer", "Birra", Decimal::from(5), 3),
        ]
    }

    #[test]
    fn test_expand_units() {
        let units = expand_units(&order());
        let ids: Vec<_> = units.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["pizza-1", "pizza-2", "beer-1", "beer-2", "beer-3"]);
    }

    #[test]
    fn test_confirm_rejects_short_tender_without_change() {
        let mut split = SplitAllocator::from_lines(&order());
        split.toggle_unit("pizza-1").unwrap();
        split.toggle_unit("beer-1").unwrap();
        split.set_tender(Decimal::from(10), Decimal::from(2)).unwrap();

        let err = split.confirm().unwrap_err();
        assert!(matches!(err, RegisterError::SplitInsufficientAmount { .. }));
        assert_eq!(split.remaining_total(), Decimal::from(31));
        assert_eq!(split.customers().len(), 1);
        assert!(!split.customers()[0].is_paid);
        assert_eq!(split.available_units().count(), 5);
        assert!(split.contributions().is_empty());
    }

    #[test]
    fn test_claimed_units_leave_the_pool() {
        let mut split = SplitAllocator::from_lines(&order());
        split.toggle_unit("pizza-1").unwrap();
        split.set_tender(Decimal::from(10), Decimal::ZERO).unwrap();
        let settled = split.confirm().unwrap();

        assert_eq!(settled.change, Decimal::from(2));
        assert_eq!(settled.remaining_total, Decimal::from(23));
        assert!(!settled.complete);
        assert_eq!(split.customers().len(), 2);

        let err = split.toggle_unit("pizza-1").unwrap_err();
        assert!(matches!(err, RegisterError::UnitUnavailable(_)));
        assert!(split.toggle_unit("no-such-unit").is_err());
    }

    #[test]
    fn test_toggle_deselects() {
        let mut split = SplitAllocator::from_lines(&order());
        assert!(split.toggle_unit("beer-2").unwrap());
        assert_eq!(split.customer_items_total(), Decimal::from(5));
        assert!(!split.toggle_unit("beer-2").unwrap());
        assert_eq!(split.customer_items_total(), Decimal::ZERO);
    }

    #[test]
    fn test_full_run_claims_every_unit_once() {
        let lines = order();
        let mut split = SplitAllocator::from_lines(&lines);
        let groups: [&[&str]; 3] = [
            &["pizza-1", "beer-1"],
            &["pizza-2"],
            &["beer-2", "beer-3"],
        ];
        let mut settled_units: Vec<String> = Vec::new();

        for (i, group) in groups.iter().enumerate() {
            for unit in group.iter() {
                split.toggle_unit(unit).unwrap();
            }
            let due = split.customer_items_total();
            // alternate cash and card payers
            if i % 2 == 0 {
                split.set_tender(due, Decimal::ZERO).unwrap();
            } else {
                split.set_tender(Decimal::ZERO, due).unwrap();
            }
            let customer = split.active_customer().unwrap().clone();
            let settlement = split.confirm().unwrap();
            settled_units.extend(customer.selected.into_iter());
            assert_eq!(settlement.complete, i == groups.len() - 1);
        }

        assert!(split.is_complete());
        assert_eq!(split.remaining_total(), Decimal::ZERO);
        assert!(split.active_customer().is_none());
        assert!(matches!(split.confirm(), Err(RegisterError::SplitComplete)));

        let mut expected: Vec<String> = expand_units(&lines).into_iter().map(|u| u.id).collect();
        expected.sort();
        settled_units.sort();
        assert_eq!(settled_units, expected);

        let total = split.total_contribution();
        assert_eq!(total.cash, Decimal::from(23));
        assert_eq!(total.card, Decimal::from(8));
        assert_eq!(total.tendered(), lines_total(&lines));
    }

    #[test]
    fn test_settled_customers_are_read_only() {
        let mut split = SplitAllocator::from_lines(&order());
        split.toggle_unit("pizza-1").unwrap();
        split.set_tender(Decimal::from(8), Decimal::ZERO).unwrap();
        split.confirm().unwrap();

        // The tender now applies to the new customer only
        split.set_tender(Decimal::from(1), Decimal::ZERO).unwrap();
        assert_eq!(split.customers()[0].cash, Decimal::from(8));
        assert_eq!(split.customers()[1].cash, Decimal::from(1));
        assert_eq!(split.customers()[1].id, 2);
    }
}
