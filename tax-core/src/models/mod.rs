mod calculation_record;
mod carrier;
mod rule_book;
mod tax_bracket;
mod tax_rules;

pub use calculation_record::{CalculationRecord, CalculationType};
pub use carrier::Carrier;
pub use rule_book::RuleBook;
pub use tax_bracket::TaxBracket;
pub use tax_rules::{RuleSetError, TaxRules};
