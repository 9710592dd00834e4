use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tax_core::format::Locale;

/// Vietnamese tax calculator.
///
/// Runs one calculation against the built-in rule set, a rule-set file,
/// or the version in force on a date from a directory of rule sets.
#[derive(Debug, Parser)]
#[command(name = "tax-cli", version, about)]
pub struct Cli {
    /// Rule-set TOML file to use instead of the built-in rules.
    #[arg(long, conflicts_with = "rules_dir")]
    pub rules: Option<PathBuf>,

    /// Directory of rule-set TOML files; the one in force on `--date` is used.
    #[arg(long)]
    pub rules_dir: Option<PathBuf>,

    /// Date used to pick a rule set from `--rules-dir` (defaults to today).
    #[arg(long, requires = "rules_dir")]
    pub date: Option<NaiveDate>,

    /// Number format for input and output: `vi` or `en`.
    #[arg(long, default_value = "vi", value_parser = parse_locale)]
    pub locale: Locale,

    /// Print the result as JSON instead of a report.
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Personal income tax on one month of salary.
    Pit {
        /// Gross monthly income.
        #[arg(long)]
        income: String,

        /// Number of registered dependents.
        #[arg(long, default_value_t = 0)]
        dependents: u32,

        /// Compulsory insurance paid by the employee.
        #[arg(long, default_value = "0")]
        insurance: String,
    },

    /// Corporate income tax for one period.
    Cit {
        #[arg(long)]
        revenue: String,

        #[arg(long)]
        expenses: String,

        #[arg(long)]
        depreciation: Option<String>,

        /// Other deductible costs.
        #[arg(long = "other")]
        other_deductions: Option<String>,
    },

    /// VAT payable for one period.
    Vat {
        #[arg(long)]
        sales: String,

        #[arg(long)]
        purchases: String,

        /// VAT rate in whole percent.
        #[arg(long, default_value_t = 10)]
        rate: u32,
    },

    /// Validate a mobile number and identify its carrier.
    Phone { number: String },

    /// Show the active rule set.
    Rules,
}

fn parse_locale(s: &str) -> Result<Locale, String> {
    Locale::parse(s).ok_or_else(|| format!("unknown locale '{s}', expected 'vi' or 'en'"))
}
