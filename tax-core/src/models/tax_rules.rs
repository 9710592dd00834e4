//! Versioned rule set: deduction constants, rates and lookup tables.
//!
//! Every legally defined constant the calculators depend on lives in a
//! [`TaxRules`] value so that an amendment only needs a new rule-set file,
//! not a new build. [`TaxRules::vietnam_2020`] is the built-in default.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Carrier, TaxBracket};

/// Reasons a rule set is rejected by [`TaxRules::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleSetError {
    #[error("rule set '{0}' has no tax brackets")]
    NoBrackets(String),

    #[error("first bracket must start at 0, got {0}")]
    FirstBracketNotAtZero(Decimal),

    #[error("bracket {level} starts at {found} but the previous bracket ends at {expected}")]
    NotContiguous {
        level: usize,
        expected: Decimal,
        found: Decimal,
    },

    #[error("bracket {level} is unbounded but is not the last bracket")]
    UnboundedBeforeTop { level: usize },

    #[error("the last bracket must be unbounded")]
    BoundedTopBracket,

    #[error("bracket {level} has an upper bound that is not above its lower bound")]
    EmptyBracket { level: usize },

    #[error("bracket {level} has rate {rate}, expected a value between 0 and 1")]
    RateOutOfRange { level: usize, rate: Decimal },

    #[error("bracket {level} rate must be higher than the bracket below it")]
    RateNotIncreasing { level: usize },

    #[error("personal deduction must be non-negative, got {0}")]
    NegativePersonalDeduction(Decimal),

    #[error("dependent deduction must be non-negative, got {0}")]
    NegativeDependentDeduction(Decimal),

    #[error("corporate tax rate must be between 0 and 1, got {0}")]
    InvalidCorporateRate(Decimal),

    #[error("at least one VAT rate is required")]
    NoVatRates,

    #[error("VAT rate {0}% is out of range")]
    InvalidVatRate(u32),

    #[error("rule set has no carriers")]
    NoCarriers,

    #[error("carrier '{carrier}' has malformed prefix '{prefix}'")]
    InvalidPrefix { carrier: String, prefix: String },

    #[error("prefix '{prefix}' is assigned to both '{first}' and '{second}'")]
    DuplicatePrefix {
        prefix: String,
        first: String,
        second: String,
    },

    #[error("rule set version '{0}' is defined more than once")]
    DuplicateVersion(String),

    #[error("no rule sets were provided")]
    EmptyRuleBook,
}

/// One versioned set of tax rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRules {
    /// Identifier of this rule set, e.g. `"2020"`.
    pub version: String,

    /// First day the rule set applies.
    pub effective_from: NaiveDate,

    /// Monthly deduction every taxpayer receives.
    pub personal_deduction: Decimal,

    /// Monthly deduction per registered dependent.
    pub dependent_deduction: Decimal,

    /// Flat corporate income tax rate as a fraction (0.20 = 20%).
    pub corporate_rate: Decimal,

    /// Legal VAT rates, in whole percent.
    pub vat_rates: Vec<u32>,

    /// Progressive income tax tiers, ascending.
    pub brackets: Vec<TaxBracket>,

    pub carriers: Vec<Carrier>,
}

impl TaxRules {
    /// Personal income tax rules in force from 1 July 2020
    /// (11,000,000 VND personal and 4,400,000 VND dependent deduction).
    pub fn vietnam_2020() -> Self {
        let million = Decimal::from(1_000_000);
        let bound = |m: i64| Some(Decimal::from(m) * million);

        Self {
            version: "2020".to_string(),
            effective_from: NaiveDate::from_ymd_opt(2020, 7, 1).unwrap_or(NaiveDate::MIN),
            personal_deduction: Decimal::from(11) * million,
            dependent_deduction: Decimal::new(44, 1) * million,
            corporate_rate: Decimal::new(20, 2),
            vat_rates: vec![0, 5, 10],
            brackets: vec![
                TaxBracket::new(Decimal::ZERO, bound(5), Decimal::new(5, 2)),
                TaxBracket::new(Decimal::from(5) * million, bound(10), Decimal::new(10, 2)),
                TaxBracket::new(Decimal::from(10) * million, bound(18), Decimal::new(15, 2)),
                TaxBracket::new(Decimal::from(18) * million, bound(32), Decimal::new(20, 2)),
                TaxBracket::new(Decimal::from(32) * million, bound(52), Decimal::new(25, 2)),
                TaxBracket::new(Decimal::from(52) * million, bound(80), Decimal::new(30, 2)),
                TaxBracket::new(Decimal::from(80) * million, None, Decimal::new(35, 2)),
            ],
            carriers: vec![
                Carrier::new(
                    "viettel",
                    "Viettel",
                    &[
                        "086", "096", "097", "098", "032", "033", "034", "035", "036", "037",
                        "038", "039",
                    ],
                ),
                Carrier::new(
                    "vinaphone",
                    "Vinaphone",
                    &["088", "091", "094", "081", "082", "083", "084", "085"],
                ),
                Carrier::new(
                    "mobifone",
                    "Mobifone",
                    &["089", "090", "093", "070", "076", "077", "078", "079"],
                ),
                Carrier::new("vietnamobile", "Vietnamobile", &["092", "056", "058"]),
                Carrier::new("gmobile", "Gmobile", &["099", "059"]),
                Carrier::new("itelecom", "Itelecom", &["087"]),
            ],
        }
    }

    /// Checks every structural invariant the calculators rely on.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuleSetError`] found.
    pub fn validate(&self) -> Result<(), RuleSetError> {
        self.validate_brackets()?;

        if self.personal_deduction < Decimal::ZERO {
            return Err(RuleSetError::NegativePersonalDeduction(
                self.personal_deduction,
            ));
        }
        if self.dependent_deduction < Decimal::ZERO {
            return Err(RuleSetError::NegativeDependentDeduction(
                self.dependent_deduction,
            ));
        }
        if self.corporate_rate < Decimal::ZERO || self.corporate_rate > Decimal::ONE {
            return Err(RuleSetError::InvalidCorporateRate(self.corporate_rate));
        }

        if self.vat_rates.is_empty() {
            return Err(RuleSetError::NoVatRates);
        }
        if let Some(&rate) = self.vat_rates.iter().find(|&&r| r > 100) {
            return Err(RuleSetError::InvalidVatRate(rate));
        }

        self.validate_carriers()
    }

    /// Whether `rate` (whole percent) is one of the legal VAT rates.
    pub fn allows_vat_rate(
        &self,
        rate: u32,
    ) -> bool {
        self.vat_rates.contains(&rate)
    }

    fn validate_brackets(&self) -> Result<(), RuleSetError> {
        let first = self
            .brackets
            .first()
            .ok_or_else(|| RuleSetError::NoBrackets(self.version.clone()))?;
        if first.lower_bound != Decimal::ZERO {
            return Err(RuleSetError::FirstBracketNotAtZero(first.lower_bound));
        }

        let last_index = self.brackets.len() - 1;
        let mut previous: Option<&TaxBracket> = None;

        for (index, bracket) in self.brackets.iter().enumerate() {
            let level = index + 1;

            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(RuleSetError::RateOutOfRange {
                    level,
                    rate: bracket.rate,
                });
            }

            match bracket.upper_bound {
                Some(upper) if upper <= bracket.lower_bound => {
                    return Err(RuleSetError::EmptyBracket { level });
                }
                None if index != last_index => {
                    return Err(RuleSetError::UnboundedBeforeTop { level });
                }
                _ => {}
            }

            if let Some(prev) = previous {
                // Only the last bracket may be unbounded, so `prev` has an upper bound.
                let expected = prev.upper_bound.unwrap_or(prev.lower_bound);
                if bracket.lower_bound != expected {
                    return Err(RuleSetError::NotContiguous {
                        level,
                        expected,
                        found: bracket.lower_bound,
                    });
                }
                if bracket.rate <= prev.rate {
                    return Err(RuleSetError::RateNotIncreasing { level });
                }
            }

            previous = Some(bracket);
        }

        if self.brackets[last_index].upper_bound.is_some() {
            return Err(RuleSetError::BoundedTopBracket);
        }

        Ok(())
    }

    fn validate_carriers(&self) -> Result<(), RuleSetError> {
        if self.carriers.is_empty() {
            return Err(RuleSetError::NoCarriers);
        }

        let mut owners: HashMap<&str, &str> = HashMap::new();

        for carrier in &self.carriers {
            for prefix in &carrier.prefixes {
                let well_formed = prefix.len() == 3
                    && prefix.starts_with('0')
                    && prefix.bytes().all(|b| b.is_ascii_digit());
                if !well_formed {
                    return Err(RuleSetError::InvalidPrefix {
                        carrier: carrier.code.clone(),
                        prefix: prefix.clone(),
                    });
                }

                if let Some(first) = owners.insert(prefix.as_str(), carrier.code.as_str()) {
                    return Err(RuleSetError::DuplicatePrefix {
                        prefix: prefix.clone(),
                        first: first.to_string(),
                        second: carrier.code.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

impl Default for TaxRules {
    fn default() -> Self {
        Self::vietnam_2020()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn builtin_rules_are_valid() {
        assert_eq!(TaxRules::vietnam_2020().validate(), Ok(()));
    }

    #[test]
    fn builtin_rules_constants() {
        let rules = TaxRules::default();

        assert_eq!(rules.personal_deduction, dec!(11000000));
        assert_eq!(rules.dependent_deduction, dec!(4400000));
        assert_eq!(rules.corporate_rate, dec!(0.20));
        assert_eq!(rules.vat_rates, vec![0, 5, 10]);
        assert_eq!(rules.brackets.len(), 7);
        assert_eq!(rules.carriers.len(), 6);
        assert_eq!(
            rules.effective_from,
            NaiveDate::from_ymd_opt(2020, 7, 1).unwrap()
        );
    }

    #[test]
    fn builtin_brackets_match_schedule() {
        let rules = TaxRules::default();
        let bracket_5 = &rules.brackets[4];

        assert_eq!(bracket_5.lower_bound, dec!(32000000));
        assert_eq!(bracket_5.upper_bound, Some(dec!(52000000)));
        assert_eq!(bracket_5.rate, dec!(0.25));
        assert_eq!(rules.brackets[6].upper_bound, None);
        assert_eq!(rules.brackets[6].rate, dec!(0.35));
    }

    #[test]
    fn allows_only_enumerated_vat_rates() {
        let rules = TaxRules::default();

        assert!(rules.allows_vat_rate(0));
        assert!(rules.allows_vat_rate(5));
        assert!(rules.allows_vat_rate(10));
        assert!(!rules.allows_vat_rate(8));
    }

    #[test]
    fn rejects_empty_brackets() {
        let mut rules = TaxRules::default();
        rules.brackets.clear();

        assert_eq!(
            rules.validate(),
            Err(RuleSetError::NoBrackets("2020".to_string()))
        );
    }

    #[test]
    fn rejects_first_bracket_above_zero() {
        let mut rules = TaxRules::default();
        rules.brackets[0].lower_bound = dec!(100);

        assert_eq!(
            rules.validate(),
            Err(RuleSetError::FirstBracketNotAtZero(dec!(100)))
        );
    }

    #[test]
    fn rejects_gap_between_brackets() {
        let mut rules = TaxRules::default();
        rules.brackets[2].lower_bound = dec!(11000000);

        assert_eq!(
            rules.validate(),
            Err(RuleSetError::NotContiguous {
                level: 3,
                expected: dec!(10000000),
                found: dec!(11000000),
            })
        );
    }

    #[test]
    fn rejects_overlapping_brackets() {
        let mut rules = TaxRules::default();
        rules.brackets[1].upper_bound = Some(dec!(12000000));

        assert_eq!(
            rules.validate(),
            Err(RuleSetError::NotContiguous {
                level: 3,
                expected: dec!(12000000),
                found: dec!(10000000),
            })
        );
    }

    #[test]
    fn rejects_bounded_top_bracket() {
        let mut rules = TaxRules::default();
        rules.brackets[6].upper_bound = Some(dec!(100000000));

        assert_eq!(rules.validate(), Err(RuleSetError::BoundedTopBracket));
    }

    #[test]
    fn rejects_unbounded_middle_bracket() {
        let mut rules = TaxRules::default();
        rules.brackets[3].upper_bound = None;

        assert_eq!(
            rules.validate(),
            Err(RuleSetError::UnboundedBeforeTop { level: 4 })
        );
    }

    #[test]
    fn rejects_non_increasing_rates() {
        let mut rules = TaxRules::default();
        rules.brackets[2].rate = dec!(0.10);

        assert_eq!(
            rules.validate(),
            Err(RuleSetError::RateNotIncreasing { level: 3 })
        );
    }

    #[test]
    fn rejects_rate_above_one() {
        let mut rules = TaxRules::default();
        rules.brackets[6].rate = dec!(1.5);

        assert_eq!(
            rules.validate(),
            Err(RuleSetError::RateOutOfRange {
                level: 7,
                rate: dec!(1.5),
            })
        );
    }

    #[test]
    fn rejects_invalid_corporate_rate() {
        let mut rules = TaxRules::default();
        rules.corporate_rate = dec!(-0.1);

        assert_eq!(
            rules.validate(),
            Err(RuleSetError::InvalidCorporateRate(dec!(-0.1)))
        );
    }

    #[test]
    fn rejects_missing_vat_rates() {
        let mut rules = TaxRules::default();
        rules.vat_rates.clear();

        assert_eq!(rules.validate(), Err(RuleSetError::NoVatRates));
    }

    #[test]
    fn rejects_missing_carriers() {
        let mut rules = TaxRules::default();
        rules.carriers.clear();

        assert_eq!(rules.validate(), Err(RuleSetError::NoCarriers));
    }

    #[test]
    fn rejects_shared_prefix() {
        let mut rules = TaxRules::default();
        rules.carriers[5].prefixes.push("096".to_string());

        assert_eq!(
            rules.validate(),
            Err(RuleSetError::DuplicatePrefix {
                prefix: "096".to_string(),
                first: "viettel".to_string(),
                second: "itelecom".to_string(),
            })
        );
    }

    #[test]
    fn rejects_malformed_prefix() {
        let mut rules = TaxRules::default();
        rules.carriers[0].prefixes.push("96".to_string());

        assert!(matches!(
            rules.validate(),
            Err(RuleSetError::InvalidPrefix { ref prefix, .. }) if prefix == "96"
        ));
    }
}
