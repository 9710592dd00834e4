//! Vietnamese mobile number normalization and carrier lookup.
//!
//! A raw number goes through four steps:
//!
//! 1. punctuation (whitespace, `-`, `(`, `)`, `.`) is removed;
//! 2. an international prefix (`+84`, or `84` on an 11-digit number) becomes `0`;
//! 3. the result must be exactly 10 digits starting with `0`;
//! 4. the first three digits select the carrier.
//!
//! ```
//! use tax_core::TaxRules;
//! use tax_core::phone::PhoneValidator;
//!
//! let rules = TaxRules::vietnam_2020();
//! let result = PhoneValidator::new(&rules.carriers).validate("+84 932-123 456");
//!
//! assert!(result.is_valid);
//! assert_eq!(result.formatted_phone.as_deref(), Some("0932 123 456"));
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::Carrier;

// ASCII digits only: `\d` would also accept other scripts, and the prefix
// and grouping code slices by byte offset.
static NATIONAL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0[0-9]{9}$").expect("national number pattern is valid"));

/// Why a phone number was rejected. The messages are shown to end users
/// as-is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PhoneError {
    #[error("Vui lòng nhập số điện thoại")]
    Empty,

    #[error("Số điện thoại không hợp lệ. Số điện thoại phải có 10 chữ số và bắt đầu bằng 0")]
    InvalidFormat,

    #[error("Đầu số không hợp lệ hoặc không thuộc nhà mạng nào tại Việt Nam")]
    UnknownPrefix(String),
}

/// A number that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedPhone {
    /// Ten digits, no separators.
    pub normalized: String,
    pub carrier_code: String,
    /// Carrier display name.
    pub network: String,
    /// `XXXX XXX XXX`.
    pub formatted: String,
}

/// Outcome of [`PhoneValidator::validate`]: either `network` and
/// `formatted_phone` are set, or `error` is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneValidationResult {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<ClassifiedPhone, PhoneError>> for PhoneValidationResult {
    fn from(result: Result<ClassifiedPhone, PhoneError>) -> Self {
        match result {
            Ok(phone) => Self {
                is_valid: true,
                network: Some(phone.network),
                formatted_phone: Some(phone.formatted),
                error: None,
            },
            Err(error) => Self {
                is_valid: false,
                network: None,
                formatted_phone: None,
                error: Some(error.to_string()),
            },
        }
    }
}

/// Strips punctuation and rewrites an international prefix to the national
/// trunk prefix `0`. Does not check the result.
pub fn normalize(raw: &str) -> String {
    let digits: String = raw
        .chars()
        .filter(|c| !(c.is_whitespace() || matches!(c, '-' | '(' | ')' | '.')))
        .collect();

    if let Some(rest) = digits.strip_prefix("+84") {
        format!("0{rest}")
    } else if digits.len() == 11 && digits.starts_with("84") {
        format!("0{}", &digits[2..])
    } else {
        digits
    }
}

/// Groups a 10-digit national number as `XXXX XXX XXX`.
fn group_4_3_3(normalized: &str) -> String {
    format!(
        "{} {} {}",
        &normalized[..4],
        &normalized[4..7],
        &normalized[7..]
    )
}

/// Validates numbers against a carrier prefix table.
#[derive(Debug, Clone)]
pub struct PhoneValidator<'a> {
    carriers: &'a [Carrier],
}

impl<'a> PhoneValidator<'a> {
    pub fn new(carriers: &'a [Carrier]) -> Self {
        Self { carriers }
    }

    /// Normalizes and classifies `raw`.
    ///
    /// # Errors
    ///
    /// * [`PhoneError::Empty`] for blank input.
    /// * [`PhoneError::InvalidFormat`] unless the normalized number is 10
    ///   digits starting with `0`.
    /// * [`PhoneError::UnknownPrefix`] when no carrier owns the prefix.
    pub fn classify(
        &self,
        raw: &str,
    ) -> Result<ClassifiedPhone, PhoneError> {
        if raw.trim().is_empty() {
            return Err(PhoneError::Empty);
        }

        let normalized = normalize(raw);
        if !NATIONAL_NUMBER.is_match(&normalized) {
            debug!(%normalized, "phone number has wrong shape");
            return Err(PhoneError::InvalidFormat);
        }

        let prefix = &normalized[..3];
        let carrier = self
            .carriers
            .iter()
            .find(|carrier| carrier.owns_prefix(prefix))
            .ok_or_else(|| {
                debug!(prefix, "no carrier owns prefix");
                PhoneError::UnknownPrefix(prefix.to_string())
            })?;

        Ok(ClassifiedPhone {
            formatted: group_4_3_3(&normalized),
            carrier_code: carrier.code.clone(),
            network: carrier.display_name.clone(),
            normalized,
        })
    }

    /// Same as [`classify`](Self::classify) but folds the outcome into a
    /// [`PhoneValidationResult`]. Never fails.
    pub fn validate(
        &self,
        raw: &str,
    ) -> PhoneValidationResult {
        self.classify(raw).into()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::TaxRules;

    fn classify(raw: &str) -> Result<ClassifiedPhone, PhoneError> {
        let rules = TaxRules::vietnam_2020();
        PhoneValidator::new(&rules.carriers).classify(raw)
    }

    fn validate(raw: &str) -> PhoneValidationResult {
        let rules = TaxRules::vietnam_2020();
        PhoneValidator::new(&rules.carriers).validate(raw)
    }

    // =========================================================================
    // normalize
    // =========================================================================

    #[test]
    fn normalize_strips_punctuation() {
        assert_eq!(normalize("(093) 212.3456"), "0932123456");
        assert_eq!(normalize("0932-123-456"), "0932123456");
    }

    #[test]
    fn normalize_rewrites_plus_84() {
        assert_eq!(normalize("+84 932-123 456"), "0932123456");
    }

    #[test]
    fn normalize_rewrites_bare_84_only_at_eleven_digits() {
        assert_eq!(normalize("84932123456"), "0932123456");
        // ten digits starting with 84 is left alone
        assert_eq!(normalize("8493212345"), "8493212345");
    }

    #[test]
    fn normalize_keeps_national_numbers() {
        assert_eq!(normalize("0841234567"), "0841234567");
    }

    // =========================================================================
    // classify
    // =========================================================================

    #[test]
    fn classifies_international_number() {
        let phone = classify("+84 932-123 456").unwrap();

        assert_eq!(phone.normalized, "0932123456");
        assert_eq!(phone.carrier_code, "mobifone");
        assert_eq!(phone.network, "Mobifone");
        assert_eq!(phone.formatted, "0932 123 456");
    }

    #[test]
    fn classifies_each_carrier() {
        let cases = [
            ("0961234567", "Viettel"),
            ("0351234567", "Viettel"),
            ("0911234567", "Vinaphone"),
            ("0831234567", "Vinaphone"),
            ("0701234567", "Mobifone"),
            ("0921234567", "Vietnamobile"),
            ("0991234567", "Gmobile"),
            ("0871234567", "Itelecom"),
        ];

        for (raw, network) in cases {
            assert_eq!(classify(raw).unwrap().network, network, "number {raw}");
        }
    }

    #[test]
    fn rejects_blank_input() {
        assert_eq!(classify(""), Err(PhoneError::Empty));
        assert_eq!(classify("   \t"), Err(PhoneError::Empty));
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(classify("093212345"), Err(PhoneError::InvalidFormat));
        assert_eq!(classify("09321234567"), Err(PhoneError::InvalidFormat));
    }

    #[test]
    fn rejects_letters_and_missing_trunk_prefix() {
        assert_eq!(classify("09321234ab"), Err(PhoneError::InvalidFormat));
        assert_eq!(classify("9932123456"), Err(PhoneError::InvalidFormat));
        assert_eq!(classify("--"), Err(PhoneError::InvalidFormat));
    }

    #[test]
    fn rejects_non_ascii_digits() {
        // Arabic-Indic, Devanagari and full-width digits
        for raw in ["096٩٩٩٩٩٩٩", "0०००००००००", "0961１１１１１１"] {
            assert_eq!(classify(raw), Err(PhoneError::InvalidFormat), "number {raw}");
        }
    }

    #[test]
    fn non_ascii_digits_validate_as_invalid() {
        let result = validate("096٩٩٩٩٩٩٩");

        assert!(!result.is_valid);
        assert_eq!(result.formatted_phone, None);
    }

    #[test]
    fn rejects_unassigned_prefix() {
        assert_eq!(
            classify("0123456789"),
            Err(PhoneError::UnknownPrefix("012".to_string()))
        );
    }

    // =========================================================================
    // validate
    // =========================================================================

    #[test]
    fn valid_result_carries_network_and_format() {
        assert_eq!(
            validate("0932123456"),
            PhoneValidationResult {
                is_valid: true,
                network: Some("Mobifone".to_string()),
                formatted_phone: Some("0932 123 456".to_string()),
                error: None,
            }
        );
    }

    #[test]
    fn invalid_result_carries_only_error() {
        let result = validate("0123456789");

        assert!(!result.is_valid);
        assert_eq!(result.network, None);
        assert_eq!(result.formatted_phone, None);
        assert_eq!(
            result.error.as_deref(),
            Some("Đầu số không hợp lệ hoặc không thuộc nhà mạng nào tại Việt Nam")
        );
    }

    #[test]
    fn revalidating_formatted_number_is_stable() {
        for raw in ["+84 932-123 456", "0961234567", "84871234567"] {
            let first = validate(raw);
            let formatted = first.formatted_phone.clone().unwrap();

            assert_eq!(validate(&formatted), first, "number {raw}");
        }
    }

    #[test]
    fn result_json_omits_absent_fields() {
        let valid = serde_json::to_value(validate("0961234567")).unwrap();
        let invalid = serde_json::to_value(validate("")).unwrap();

        assert_eq!(
            valid,
            serde_json::json!({
                "isValid": true,
                "network": "Viettel",
                "formattedPhone": "0961 234 567",
            })
        );
        assert_eq!(
            invalid,
            serde_json::json!({
                "isValid": false,
                "error": "Vui lòng nhập số điện thoại",
            })
        );
    }
}
