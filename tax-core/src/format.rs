//! Display formatting for computed amounts.
//!
//! The calculators never format anything; front ends call these helpers on
//! finished results. Amounts are Vietnamese đồng (VND), which has no minor
//! unit in everyday use.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::calculations::common::round_half_up;

/// Number formatting conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    /// `15.000.000 ₫`, `15,5%`
    #[default]
    ViVn,
    /// `₫15,000,000`, `15.5%`
    EnUs,
}

impl Locale {
    pub fn group_separator(self) -> char {
        match self {
            Self::ViVn => '.',
            Self::EnUs => ',',
        }
    }

    pub fn decimal_separator(self) -> char {
        match self {
            Self::ViVn => ',',
            Self::EnUs => '.',
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "vi" | "vi-vn" | "vi_vn" => Some(Self::ViVn),
            "en" | "en-us" | "en_us" => Some(Self::EnUs),
            _ => None,
        }
    }
}

const CURRENCY_SYMBOL: &str = "₫";

/// Formats `value` with thousands grouping and at most
/// `max_fraction_digits` decimals (rounded half away from zero, trailing
/// zeros dropped).
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::format::{Locale, format_number};
///
/// assert_eq!(format_number(dec!(34600000), Locale::ViVn, 0), "34.600.000");
/// assert_eq!(format_number(dec!(1234.5), Locale::EnUs, 2), "1,234.5");
/// ```
pub fn format_number(
    value: Decimal,
    locale: Locale,
    max_fraction_digits: u32,
) -> String {
    let rounded = round_half_up(value, max_fraction_digits).normalize();
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    let plain = rounded.abs().to_string();
    let (whole, fraction) = match plain.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (plain.as_str(), None),
    };

    let mut out = String::with_capacity(plain.len() + plain.len() / 3 + 1);
    out.push_str(sign);
    out.push_str(&group_digits(whole, locale.group_separator()));
    if let Some(fraction) = fraction {
        out.push(locale.decimal_separator());
        out.push_str(fraction);
    }
    out
}

/// Formats a VND amount, rounded to whole đồng.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::format::{Locale, format_currency};
///
/// assert_eq!(format_currency(dec!(5400000), Locale::ViVn), "5.400.000 ₫");
/// assert_eq!(format_currency(dec!(5400000), Locale::EnUs), "₫5,400,000");
/// ```
pub fn format_currency(
    value: Decimal,
    locale: Locale,
) -> String {
    let number = format_number(value.abs(), locale, 0);
    let sign = if round_half_up(value, 0) < Decimal::ZERO {
        "-"
    } else {
        ""
    };

    match locale {
        Locale::ViVn => format!("{sign}{number} {CURRENCY_SYMBOL}"),
        Locale::EnUs => format!("{sign}{CURRENCY_SYMBOL}{number}"),
    }
}

/// Formats a fractional rate (`0.05`) as a percentage (`5%`), one decimal
/// at most.
pub fn format_percent(
    rate: Decimal,
    locale: Locale,
) -> String {
    format!(
        "{}%",
        format_number(rate.saturating_mul(Decimal::ONE_HUNDRED), locale, 1)
    )
}

fn group_digits(
    digits: &str,
    separator: char,
) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (len - index) % 3 == 0 {
            out.push(separator);
        }
        out.push(digit);
    }
    out
}

/// Error returned when text cannot be read as an amount.
#[derive(Debug, Error)]
#[error("invalid amount '{input}': {source}")]
pub struct ParseAmountError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Reads an amount typed in `locale` conventions.
///
/// Grouping separators, whitespace and currency marks (`₫`, `đ`, `VND`)
/// are ignored. Blank input reads as 0.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::format::{Locale, parse_amount};
///
/// assert_eq!(parse_amount("15.000.000 ₫", Locale::ViVn).unwrap(), dec!(15000000));
/// assert_eq!(parse_amount("1,234.5", Locale::EnUs).unwrap(), dec!(1234.5));
/// ```
pub fn parse_amount(
    s: &str,
    locale: Locale,
) -> Result<Decimal, ParseAmountError> {
    let stripped = s
        .trim()
        .trim_end_matches("VND")
        .trim_end_matches("vnd")
        .trim_matches(|c: char| c == '₫' || c == 'đ' || c.is_whitespace());

    let normalized: String = stripped
        .chars()
        .filter(|&c| c != locale.group_separator() && !c.is_whitespace())
        .map(|c| if c == locale.decimal_separator() { '.' } else { c })
        .collect();

    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }

    normalized.parse().map_err(|e| {
        tracing::warn!(input = %s, "invalid amount: {}", e);
        ParseAmountError {
            input: s.to_string(),
            source: e,
        }
    })
}
