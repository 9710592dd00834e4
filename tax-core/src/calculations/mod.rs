//! Tax calculators for Vietnamese personal income tax, corporate income
//! tax and VAT.
//!
//! Each calculator borrows a validated [`TaxRules`](crate::TaxRules) and is a
//! pure function of its input.

pub mod common;
pub mod corporate;
pub mod personal_income;
pub mod vat;

#[cfg(test)]
mod test_tracing;

pub use corporate::{CorporateTaxCalculator, CorporateTaxInput, CorporateTaxResult};
pub use personal_income::{
    BracketTax, PersonalIncomeTaxCalculator, PersonalIncomeTaxInput, PersonalIncomeTaxResult,
};
pub use vat::{VatCalculator, VatError, VatInput, VatResult};
