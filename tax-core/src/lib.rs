//! Pure Vietnamese tax rules: progressive personal income tax, flat-rate
//! corporate income tax, VAT settlement and mobile number classification.
//!
//! Nothing in this crate performs I/O. Rule sets are plain values that a
//! caller builds in code ([`TaxRules::vietnam_2020`]) or loads with the
//! `tax-data` crate.

pub mod calculations;
pub mod format;
pub mod models;
pub mod phone;

pub use models::*;
