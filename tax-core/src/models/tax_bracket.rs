use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One tier of the progressive personal income tax schedule.
///
/// `upper_bound` is `None` for the top tier, which has no ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBracket {
    pub lower_bound: Decimal,
    #[serde(default)]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBracket {
    pub fn new(
        lower_bound: Decimal,
        upper_bound: Option<Decimal>,
        rate: Decimal,
    ) -> Self {
        Self {
            lower_bound,
            upper_bound,
            rate,
        }
    }

    /// Width of the tier, or `None` when it is unbounded.
    pub fn width(&self) -> Option<Decimal> {
        self.upper_bound.map(|upper| upper - self.lower_bound)
    }

    /// Portion of `remaining` income that falls inside this tier.
    pub fn portion_of(
        &self,
        remaining: Decimal,
    ) -> Decimal {
        match self.width() {
            Some(width) => remaining.min(width),
            None => remaining,
        }
    }
}
