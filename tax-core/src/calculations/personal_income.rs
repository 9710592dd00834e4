//! Progressive personal income tax on monthly employment income.
//!
//! # Calculation
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Total deductions = personal + dependents × per-dependent + insurance |
//! | 2    | Taxable income = income − total deductions (minimum 0) |
//! | 3    | Each bracket taxes the slice of taxable income inside its range |
//! | 4    | Tax = sum of the bracket amounts |
//! | 5    | Effective rate = tax ÷ taxable income; net income = income − tax |
//!
//! An amount sitting exactly on a bracket boundary is taxed entirely in the
//! lower bracket, since that bracket's range is closed at its upper bound.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::TaxRules;
//! use tax_core::calculations::{PersonalIncomeTaxCalculator, PersonalIncomeTaxInput};
//!
//! let rules = TaxRules::vietnam_2020();
//! let calculator = PersonalIncomeTaxCalculator::new(&rules);
//!
//! let result = calculator.compute(&PersonalIncomeTaxInput {
//!     monthly_income: dec!(15000000),
//!     dependents: 0,
//!     insurance: dec!(0),
//! });
//!
//! assert_eq!(result.taxable_income, dec!(4000000));
//! assert_eq!(result.tax_amount, dec!(200000));
//! assert_eq!(result.net_income, dec!(14800000));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::TaxRules;
use crate::calculations::common::non_negative;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalIncomeTaxInput {
    /// Gross monthly income.
    pub monthly_income: Decimal,

    /// Number of registered dependents.
    #[serde(default)]
    pub dependents: u32,

    /// Compulsory insurance contributions paid by the employee this month.
    #[serde(default)]
    pub insurance: Decimal,
}

/// Tax owed on the slice of income that falls into one bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketTax {
    /// 1-based bracket number.
    pub level: usize,

    /// Lower bound of the bracket.
    pub from: Decimal,

    /// Upper bound of the bracket; `None` for the unbounded top bracket.
    pub to: Option<Decimal>,

    /// Marginal rate as a fraction (e.g. 0.05 for 5%).
    pub rate: Decimal,

    /// Tax on the slice of taxable income inside this bracket.
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalIncomeTaxResult {
    /// Gross monthly income, as given.
    pub monthly_income: Decimal,

    /// Number of dependents, as given.
    pub dependents: u32,

    /// Insurance contributions, as given.
    pub insurance: Decimal,

    /// Personal deduction from the rule set.
    pub personal_deduction: Decimal,

    /// Dependents × per-dependent deduction.
    pub dependent_deduction: Decimal,

    /// Personal + dependent deductions + insurance.
    pub total_deductions: Decimal,

    /// Income left after deductions, never negative.
    pub taxable_income: Decimal,

    /// Sum of the bracket amounts.
    pub tax_amount: Decimal,

    /// Tax as a fraction of taxable income; 0 when nothing is taxable.
    pub effective_rate: Decimal,

    /// Gross income minus tax.
    pub net_income: Decimal,

    /// Brackets that contributed a non-zero amount, lowest first.
    pub breakdown: Vec<BracketTax>,
}

/// Calculator for progressive personal income tax.
///
/// Borrows a validated [`TaxRules`]; brackets must be ascending and
/// contiguous with an unbounded top bracket.
#[derive(Debug, Clone)]
pub struct PersonalIncomeTaxCalculator<'a> {
    rules: &'a TaxRules,
}

impl<'a> PersonalIncomeTaxCalculator<'a> {
    pub fn new(rules: &'a TaxRules) -> Self {
        Self { rules }
    }

    /// Computes the tax owed for one month. Never fails; income below the
    /// deductions simply yields zero tax and an empty breakdown. Sums that
    /// leave the `Decimal` range saturate at its bounds.
    pub fn compute(
        &self,
        input: &PersonalIncomeTaxInput,
    ) -> PersonalIncomeTaxResult {
        let dependent_deduction = self.dependent_deduction(input.dependents);
        let total_deductions = self
            .rules
            .personal_deduction
            .saturating_add(dependent_deduction)
            .saturating_add(input.insurance);

        let taxable_income = self.taxable_income(input.monthly_income, total_deductions);
        let breakdown = self.breakdown(taxable_income);
        let tax_amount = breakdown
            .iter()
            .fold(Decimal::ZERO, |total, line| total.saturating_add(line.amount));

        let effective_rate = if taxable_income > Decimal::ZERO {
            tax_amount
                .checked_div(taxable_income)
                .unwrap_or(Decimal::ZERO)
        } else {
            Decimal::ZERO
        };

        PersonalIncomeTaxResult {
            monthly_income: input.monthly_income,
            dependents: input.dependents,
            insurance: input.insurance,
            personal_deduction: self.rules.personal_deduction,
            dependent_deduction,
            total_deductions: total_deductions.normalize(),
            taxable_income: taxable_income.normalize(),
            tax_amount: tax_amount.normalize(),
            effective_rate: effective_rate.normalize(),
            net_income: input.monthly_income.saturating_sub(tax_amount).normalize(),
            breakdown,
        }
    }

    fn dependent_deduction(
        &self,
        dependents: u32,
    ) -> Decimal {
        Decimal::from(dependents)
            .saturating_mul(self.rules.dependent_deduction)
            .normalize()
    }

    fn taxable_income(
        &self,
        monthly_income: Decimal,
        total_deductions: Decimal,
    ) -> Decimal {
        let taxable = monthly_income.saturating_sub(total_deductions);
        if taxable < Decimal::ZERO {
            debug!(%monthly_income, %total_deductions, "deductions exceed income, nothing taxable");
        }
        non_negative(taxable)
    }

    /// Walks the brackets carrying the untaxed remainder forward.
    fn breakdown(
        &self,
        taxable_income: Decimal,
    ) -> Vec<BracketTax> {
        let (_, lines) = self.rules.brackets.iter().enumerate().fold(
            (taxable_income, Vec::new()),
            |(remaining, mut lines), (index, bracket)| {
                if remaining <= Decimal::ZERO {
                    return (remaining, lines);
                }

                let portion = bracket.portion_of(remaining);
                let amount = portion.saturating_mul(bracket.rate).normalize();
                if amount != Decimal::ZERO {
                    lines.push(BracketTax {
                        level: index + 1,
                        from: bracket.lower_bound,
                        to: bracket.upper_bound,
                        rate: bracket.rate,
                        amount,
                    });
                }

                (remaining - portion, lines)
            },
        );
        lines
    }
}
