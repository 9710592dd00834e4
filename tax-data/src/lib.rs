//! Loading of versioned tax rule sets from disk.

pub mod loader;
pub mod rules;

pub use loader::{CarrierLoader, CarrierRecord, TableLoaderError, TaxBracketLoader, TaxBracketRecord};
pub use rules::{RuleBookLoader, RuleSetLoader, RuleSetLoaderError};
