use chrono::NaiveDate;

use super::{RuleSetError, TaxRules};

/// All known rule-set versions, ordered by the date they take effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBook {
    sets: Vec<TaxRules>,
}

impl RuleBook {
    /// Builds a rule book from validated rule sets.
    ///
    /// # Errors
    /// * [`RuleSetError::EmptyRuleBook`] when `sets` is empty.
    /// * [`RuleSetError::DuplicateVersion`] when two sets share a version.
    /// * Any error from [`TaxRules::validate`].
    pub fn new(mut sets: Vec<TaxRules>) -> Result<Self, RuleSetError> {
        if sets.is_empty() {
            return Err(RuleSetError::EmptyRuleBook);
        }

        for rules in &sets {
            rules.validate()?;
        }

        sets.sort_by(|a, b| a.effective_from.cmp(&b.effective_from));

        for (index, rules) in sets.iter().enumerate() {
            if sets[..index].iter().any(|s| s.version == rules.version) {
                return Err(RuleSetError::DuplicateVersion(rules.version.clone()));
            }
        }

        Ok(Self { sets })
    }

    /// The rule set in force on `date`: the latest one whose
    /// `effective_from` is on or before it.
    pub fn effective_on(
        &self,
        date: NaiveDate,
    ) -> Option<&TaxRules> {
        self.sets
            .iter()
            .rev()
            .find(|rules| rules.effective_from <= date)
    }

    pub fn latest(&self) -> &TaxRules {
        // `new` guarantees at least one set.
        &self.sets[self.sets.len() - 1]
    }

    pub fn version(
        &self,
        version: &str,
    ) -> Option<&TaxRules> {
        self.sets.iter().find(|rules| rules.version == version)
    }

    /// Version identifiers in effective-date order.
    pub fn versions(&self) -> Vec<&str> {
        self.sets.iter().map(|rules| rules.version.as_str()).collect()
    }
}

impl Default for RuleBook {
    fn default() -> Self {
        Self {
            sets: vec![TaxRules::default()],
        }
    }
}
