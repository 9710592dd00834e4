//! Flat-rate corporate income tax.
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::TaxRules;
//! use tax_core::calculations::{CorporateTaxCalculator, CorporateTaxInput};
//!
//! let rules = TaxRules::vietnam_2020();
//! let result = CorporateTaxCalculator::new(&rules).compute(&CorporateTaxInput {
//!     revenue: dec!(5000000000),
//!     expenses: dec!(3000000000),
//!     depreciation: Some(dec!(200000000)),
//!     other_deductions: None,
//! });
//!
//! assert_eq!(result.taxable_income, dec!(1800000000));
//! assert_eq!(result.tax_amount, dec!(360000000));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::TaxRules;
use crate::calculations::common::non_negative;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorporateTaxInput {
    /// Revenue for the period.
    pub revenue: Decimal,

    /// Deductible operating expenses.
    pub expenses: Decimal,

    /// Depreciation of fixed assets; counts as 0 when absent.
    #[serde(default)]
    pub depreciation: Option<Decimal>,

    /// Any other deductible costs; counts as 0 when absent.
    #[serde(default)]
    pub other_deductions: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorporateTaxResult {
    /// Revenue, as given.
    pub revenue: Decimal,

    /// Expenses + depreciation + other deductions.
    pub total_expenses: Decimal,

    /// Revenue minus total expenses, never negative.
    pub taxable_income: Decimal,

    /// Corporate rate from the rule set, as a fraction.
    pub tax_rate: Decimal,

    /// Taxable income × rate.
    pub tax_amount: Decimal,

    /// Taxable income after tax.
    pub net_income: Decimal,
}

#[derive(Debug, Clone)]
pub struct CorporateTaxCalculator<'a> {
    rules: &'a TaxRules,
}

impl<'a> CorporateTaxCalculator<'a> {
    pub fn new(rules: &'a TaxRules) -> Self {
        Self { rules }
    }

    /// Computes the tax for one period. Never fails; a loss yields zero tax,
    /// and sums that leave the `Decimal` range saturate at its bounds.
    pub fn compute(
        &self,
        input: &CorporateTaxInput,
    ) -> CorporateTaxResult {
        let total_expenses = input
            .expenses
            .saturating_add(input.depreciation.unwrap_or(Decimal::ZERO))
            .saturating_add(input.other_deductions.unwrap_or(Decimal::ZERO));

        let profit = input.revenue.saturating_sub(total_expenses);
        if profit < Decimal::ZERO {
            debug!(revenue = %input.revenue, %total_expenses, "loss-making period, no corporate tax");
        }
        let taxable_income = non_negative(profit);

        let tax_rate = self.rules.corporate_rate;
        let tax_amount = taxable_income.saturating_mul(tax_rate);

        CorporateTaxResult {
            revenue: input.revenue,
            total_expenses: total_expenses.normalize(),
            taxable_income: taxable_income.normalize(),
            tax_rate,
            tax_amount: tax_amount.normalize(),
            net_income: taxable_income.saturating_sub(tax_amount).normalize(),
        }
    }
}
