//! Value-added tax settlement for one period.
//!
//! Payable VAT is output VAT (on sales) minus input VAT (on purchases),
//! floored at zero. Excess input credit is not carried forward.
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::TaxRules;
//! use tax_core::calculations::{VatCalculator, VatInput};
//!
//! let rules = TaxRules::vietnam_2020();
//! let result = VatCalculator::new(&rules)
//!     .compute(&VatInput {
//!         sales_amount: dec!(100000000),
//!         purchase_amount: dec!(60000000),
//!         vat_rate: 10,
//!     })
//!     .unwrap();
//!
//! assert_eq!(result.vat_payable, dec!(4000000));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::TaxRules;
use crate::calculations::common::non_negative;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VatError {
    /// The requested rate is not one of the legal VAT rates.
    #[error("VAT rate {rate}% is not allowed; expected one of {allowed:?}")]
    UnsupportedRate { rate: u32, allowed: Vec<u32> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VatInput {
    /// Taxable sales for the period, before VAT.
    pub sales_amount: Decimal,

    /// Purchases carrying deductible input VAT, before VAT.
    pub purchase_amount: Decimal,

    /// Whole percent, e.g. `10`. Must be listed in the rule set.
    pub vat_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VatResult {
    /// Sales, as given.
    pub sales_amount: Decimal,

    /// Purchases, as given.
    pub purchase_amount: Decimal,

    /// Rate applied, in whole percent.
    pub vat_rate: u32,

    /// VAT charged on sales.
    #[serde(rename = "outputVAT")]
    pub output_vat: Decimal,

    /// VAT paid on purchases.
    #[serde(rename = "inputVAT")]
    pub input_vat: Decimal,

    /// Output minus input VAT, never negative.
    pub vat_payable: Decimal,
}

#[derive(Debug, Clone)]
pub struct VatCalculator<'a> {
    rules: &'a TaxRules,
}

impl<'a> VatCalculator<'a> {
    pub fn new(rules: &'a TaxRules) -> Self {
        Self { rules }
    }

    /// Settles VAT for the period.
    ///
    /// # Errors
    ///
    /// Returns [`VatError::UnsupportedRate`] when `input.vat_rate` is not
    /// listed in the rule set.
    pub fn compute(
        &self,
        input: &VatInput,
    ) -> Result<VatResult, VatError> {
        if !self.rules.allows_vat_rate(input.vat_rate) {
            warn!(rate = input.vat_rate, "rejected VAT rate");
            return Err(VatError::UnsupportedRate {
                rate: input.vat_rate,
                allowed: self.rules.vat_rates.clone(),
            });
        }

        let rate = Decimal::new(i64::from(input.vat_rate), 2);
        let output_vat = input.sales_amount.saturating_mul(rate);
        let input_vat = input.purchase_amount.saturating_mul(rate);

        let net = output_vat.saturating_sub(input_vat);
        if net < Decimal::ZERO {
            debug!(%output_vat, %input_vat, "input VAT exceeds output VAT, nothing payable");
        }

        Ok(VatResult {
            sales_amount: input.sales_amount,
            purchase_amount: input.purchase_amount,
            vat_rate: input.vat_rate,
            output_vat: output_vat.normalize(),
            input_vat: input_vat.normalize(),
            vat_payable: non_negative(net).normalize(),
        })
    }
}
