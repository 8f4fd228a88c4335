//! Split payment contribution

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// (cash, card) paid by one settled split customer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitContribution {
    pub cash: Decimal,
    pub card: Decimal,
}

impl SplitContribution {
    pub fn new(cash: Decimal, card: Decimal) -> Self {
        Self { cash, card }
    }

    pub fn tendered(&self) -> Decimal {
        self.cash + self.card
    }

    /// Fold many contributions into one (cash, card) pair
    pub fn sum<'a>(contributions: impl IntoIterator<Item = &'a SplitContribution>) -> SplitContribution {
        contributions
            .into_iter()
            .fold(SplitContribution::default(), |acc, c| SplitContribution {
                cash: acc.cash + c.cash,
                card: acc.card + c.card,
            })
    }
}
