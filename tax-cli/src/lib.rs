//! Command-line front end for the Vietnamese tax calculators.
//!
//! [`cli`] holds the argument definitions; [`app`] selects a rule set, runs
//! a command and renders its output.

pub mod app;
pub mod cli;
