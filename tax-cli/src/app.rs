use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use tax_core::calculations::{
    CorporateTaxCalculator, CorporateTaxInput, CorporateTaxResult, PersonalIncomeTaxCalculator,
    PersonalIncomeTaxInput, PersonalIncomeTaxResult, VatCalculator, VatInput, VatResult,
};
use tax_core::format::{Locale, format_currency, format_percent, parse_amount};
use tax_core::phone::PhoneValidator;
use tax_core::{CalculationRecord, CalculationType, TaxRules};
use tax_data::{RuleBookLoader, RuleSetLoader};
use tracing::{debug, info};

use crate::cli::Command;

/// What a command produced.
///
/// `Rejected` covers input the calculators refuse (an unsupported VAT rate,
/// a phone number that does not classify); the binary prints it on stderr
/// and exits with status 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Rejected(String),
}

/// Picks the rule set for this run.
///
/// * `rules`: a single rule-set file.
/// * `rules_dir`: every rule set in the directory; the one in force on
///   `date` (today when `None`) wins.
/// * neither: the built-in 2020 rules.
pub fn select_rules(
    rules: Option<&Path>,
    rules_dir: Option<&Path>,
    date: Option<NaiveDate>,
) -> Result<TaxRules> {
    if let Some(path) = rules {
        return RuleSetLoader::from_path(path)
            .with_context(|| format!("failed to load rule set {}", path.display()));
    }

    if let Some(dir) = rules_dir {
        let book = RuleBookLoader::from_dir(dir)
            .with_context(|| format!("failed to load rule sets from {}", dir.display()))?;
        let date = date.unwrap_or_else(|| Local::now().date_naive());
        let rules = book
            .effective_on(date)
            .ok_or_else(|| anyhow!("no rule set in {} is in force on {date}", dir.display()))?;
        info!(version = %rules.version, %date, "selected rule set");
        return Ok(rules.clone());
    }

    debug!("using built-in rule set");
    Ok(TaxRules::default())
}

/// Runs one command against `rules` and renders its output.
pub fn run(
    command: &Command,
    rules: &TaxRules,
    locale: Locale,
    json: bool,
) -> Result<Outcome> {
    match command {
        Command::Pit {
            income,
            dependents,
            insurance,
        } => {
            let input = PersonalIncomeTaxInput {
                monthly_income: amount("income", income, locale)?,
                dependents: *dependents,
                insurance: amount("insurance", insurance, locale)?,
            };
            let result = PersonalIncomeTaxCalculator::new(rules).compute(&input);
            info!(tax = %result.tax_amount, "personal income tax computed");

            if json {
                record(CalculationType::PersonalIncomeTax, &input, &result)
            } else {
                Ok(Outcome::Success(pit_report(&result, locale)))
            }
        }

        Command::Cit {
            revenue,
            expenses,
            depreciation,
            other_deductions,
        } => {
            let input = CorporateTaxInput {
                revenue: amount("revenue", revenue, locale)?,
                expenses: amount("expenses", expenses, locale)?,
                depreciation: optional_amount("depreciation", depreciation.as_deref(), locale)?,
                other_deductions: optional_amount("other", other_deductions.as_deref(), locale)?,
            };
            let result = CorporateTaxCalculator::new(rules).compute(&input);
            info!(tax = %result.tax_amount, "corporate tax computed");

            if json {
                record(CalculationType::CorporateTax, &input, &result)
            } else {
                Ok(Outcome::Success(cit_report(&result, locale)))
            }
        }

        Command::Vat {
            sales,
            purchases,
            rate,
        } => {
            let input = VatInput {
                sales_amount: amount("sales", sales, locale)?,
                purchase_amount: amount("purchases", purchases, locale)?,
                vat_rate: *rate,
            };
            let result = match VatCalculator::new(rules).compute(&input) {
                Ok(result) => result,
                Err(err) => return Ok(Outcome::Rejected(err.to_string())),
            };
            info!(payable = %result.vat_payable, "VAT computed");

            if json {
                record(CalculationType::Vat, &input, &result)
            } else {
                Ok(Outcome::Success(vat_report(&result, locale)))
            }
        }

        Command::Phone { number } => {
            let result = PhoneValidator::new(&rules.carriers).validate(number);

            let text = if json {
                serde_json::to_string_pretty(&result)?
            } else if result.is_valid {
                format!(
                    "{} ({})",
                    result.formatted_phone.as_deref().unwrap_or_default(),
                    result.network.as_deref().unwrap_or_default()
                )
            } else {
                result.error.clone().unwrap_or_default()
            };

            if result.is_valid {
                Ok(Outcome::Success(text))
            } else {
                Ok(Outcome::Rejected(text))
            }
        }

        Command::Rules => {
            if json {
                Ok(Outcome::Success(serde_json::to_string_pretty(rules)?))
            } else {
                Ok(Outcome::Success(rules_report(rules, locale)))
            }
        }
    }
}

fn amount(
    field: &str,
    text: &str,
    locale: Locale,
) -> Result<Decimal> {
    parse_amount(text, locale).with_context(|| format!("--{field}"))
}

fn optional_amount(
    field: &str,
    text: Option<&str>,
    locale: Locale,
) -> Result<Option<Decimal>> {
    text.map(|text| amount(field, text, locale)).transpose()
}

fn record<I, R>(
    calculation_type: CalculationType,
    input: &I,
    result: &R,
) -> Result<Outcome>
where
    I: serde::Serialize,
    R: serde::Serialize,
{
    let record = CalculationRecord::new(calculation_type, input, result)?;
    Ok(Outcome::Success(serde_json::to_string_pretty(&record)?))
}

// ─── text reports ────────────────────────────────────────────────────────────

fn line(
    out: &mut String,
    label: &str,
    value: &str,
) {
    let _ = writeln!(out, "  {label:<22}{value:>20}");
}

fn pit_report(
    result: &PersonalIncomeTaxResult,
    locale: Locale,
) -> String {
    let money = |value| format_currency(value, locale);
    let mut out = String::from("Personal income tax\n");

    line(&mut out, "Monthly income", &money(result.monthly_income));
    line(&mut out, "Insurance", &money(result.insurance));
    line(&mut out, "Personal deduction", &money(result.personal_deduction));
    line(
        &mut out,
        &format!("Dependents ({})", result.dependents),
        &money(result.dependent_deduction),
    );
    line(&mut out, "Taxable income", &money(result.taxable_income));
    line(&mut out, "Tax", &money(result.tax_amount));
    line(
        &mut out,
        "Effective rate",
        &format_percent(result.effective_rate, locale),
    );
    line(&mut out, "Net income", &money(result.net_income));

    if !result.breakdown.is_empty() {
        out.push_str("\n  Bracket breakdown\n");
        for item in &result.breakdown {
            let to = item.to.map_or_else(|| "…".to_string(), money);
            let _ = writeln!(
                out,
                "  {:>2}. {:>16} – {:<16} {:>6} {:>16}",
                item.level,
                money(item.from),
                to,
                format_percent(item.rate, locale),
                money(item.amount)
            );
        }
    }

    out
}

fn cit_report(
    result: &CorporateTaxResult,
    locale: Locale,
) -> String {
    let money = |value| format_currency(value, locale);
    let mut out = String::from("Corporate income tax\n");

    line(&mut out, "Revenue", &money(result.revenue));
    line(&mut out, "Total expenses", &money(result.total_expenses));
    line(&mut out, "Taxable income", &money(result.taxable_income));
    line(&mut out, "Rate", &format_percent(result.tax_rate, locale));
    line(&mut out, "Tax", &money(result.tax_amount));
    line(&mut out, "Net income", &money(result.net_income));

    out
}

fn vat_report(
    result: &VatResult,
    locale: Locale,
) -> String {
    let money = |value| format_currency(value, locale);
    let mut out = format!("VAT at {}%\n", result.vat_rate);

    line(&mut out, "Sales", &money(result.sales_amount));
    line(&mut out, "Purchases", &money(result.purchase_amount));
    line(&mut out, "Output VAT", &money(result.output_vat));
    line(&mut out, "Input VAT", &money(result.input_vat));
    line(&mut out, "VAT payable", &money(result.vat_payable));

    out
}

fn rules_report(
    rules: &TaxRules,
    locale: Locale,
) -> String {
    let money = |value| format_currency(value, locale);
    let mut out = format!(
        "Rule set {} (from {})\n",
        rules.version, rules.effective_from
    );

    line(&mut out, "Personal deduction", &money(rules.personal_deduction));
    line(
        &mut out,
        "Dependent deduction",
        &money(rules.dependent_deduction),
    );
    line(
        &mut out,
        "Corporate rate",
        &format_percent(rules.corporate_rate, locale),
    );
    let vat_rates = rules
        .vat_rates
        .iter()
        .map(|rate| format!("{rate}%"))
        .collect::<Vec<_>>()
        .join(", ");
    line(&mut out, "VAT rates", &vat_rates);

    out.push_str("\n  Brackets\n");
    for (index, bracket) in rules.brackets.iter().enumerate() {
        let to = bracket.upper_bound.map_or_else(|| "…".to_string(), money);
        let _ = writeln!(
            out,
            "  {:>2}. {:>16} – {:<16} {:>6}",
            index + 1,
            money(bracket.lower_bound),
            to,
            format_percent(bracket.rate, locale)
        );
    }

    out.push_str("\n  Carriers\n");
    for carrier in &rules.carriers {
        let _ = writeln!(
            out,
            "  {:<14}{}",
            carrier.display_name,
            carrier.prefixes.join(" ")
        );
    }

    out
}
