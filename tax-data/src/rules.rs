//! Rule-set files.
//!
//! A rule set is a TOML document. Brackets and carriers are either written
//! inline or pulled from CSV files next to it:
//!
//! ```toml
//! version = "2020"
//! effective_from = "2020-07-01"
//! personal_deduction = "11000000"
//! dependent_deduction = "4400000"
//! corporate_rate = "0.20"
//! vat_rates = [0, 5, 10]
//! brackets_csv = "brackets.csv"
//!
//! [[carriers]]
//! code = "viettel"
//! display_name = "Viettel"
//! prefixes = ["086", "096", "097"]
//! ```

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{Carrier, RuleBook, RuleSetError, TaxBracket, TaxRules};
use thiserror::Error;
use tracing::{debug, info};

use crate::loader::{CarrierLoader, TableLoaderError, TaxBracketLoader};

#[derive(Debug, Error)]
pub enum RuleSetLoaderError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rule-set file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Table(#[from] TableLoaderError),

    #[error("{0} are given both inline and as a CSV file")]
    ConflictingSources(&'static str),

    #[error("rule set rejected: {0}")]
    InvalidRules(#[from] RuleSetError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleSetFile {
    version: String,
    effective_from: NaiveDate,
    personal_deduction: Decimal,
    dependent_deduction: Decimal,
    corporate_rate: Decimal,
    vat_rates: Vec<u32>,
    #[serde(default)]
    brackets: Vec<BracketEntry>,
    brackets_csv: Option<PathBuf>,
    #[serde(default)]
    carriers: Vec<CarrierEntry>,
    carriers_csv: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BracketEntry {
    lower_bound: Decimal,
    upper_bound: Option<Decimal>,
    rate: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CarrierEntry {
    code: String,
    display_name: String,
    prefixes: Vec<String>,
}

/// Reads single rule-set files.
pub struct RuleSetLoader;

impl RuleSetLoader {
    /// Parses a rule set from TOML text and validates it.
    ///
    /// CSV paths inside the document are resolved against `base_dir`, or
    /// the working directory when `None`.
    pub fn from_toml_str(
        text: &str,
        base_dir: Option<&Path>,
    ) -> Result<TaxRules, RuleSetLoaderError> {
        let file: RuleSetFile = toml::from_str(text)?;

        let brackets = Self::brackets(&file, base_dir)?;
        let carriers = Self::carriers(&file, base_dir)?;

        let rules = TaxRules {
            version: file.version,
            effective_from: file.effective_from,
            personal_deduction: file.personal_deduction,
            dependent_deduction: file.dependent_deduction,
            corporate_rate: file.corporate_rate,
            vat_rates: file.vat_rates,
            brackets,
            carriers,
        };

        rules.validate()?;
        debug!(version = %rules.version, brackets = rules.brackets.len(), "rule set parsed");
        Ok(rules)
    }

    /// Reads and validates the rule set stored at `path`.
    pub fn from_path(path: &Path) -> Result<TaxRules, RuleSetLoaderError> {
        let text = fs::read_to_string(path).map_err(|source| RuleSetLoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let rules = Self::from_toml_str(&text, path.parent())?;
        info!(version = %rules.version, path = %path.display(), "loaded rule set");
        Ok(rules)
    }

    fn brackets(
        file: &RuleSetFile,
        base_dir: Option<&Path>,
    ) -> Result<Vec<TaxBracket>, RuleSetLoaderError> {
        match &file.brackets_csv {
            Some(_) if !file.brackets.is_empty() => {
                Err(RuleSetLoaderError::ConflictingSources("brackets"))
            }
            Some(csv_path) => {
                let path = resolve(base_dir, csv_path);
                let records = TaxBracketLoader::parse(open(&path)?)?;
                Ok(TaxBracketLoader::brackets_for(&records, &file.version)?)
            }
            None => Ok(file
                .brackets
                .iter()
                .map(|b| TaxBracket::new(b.lower_bound, b.upper_bound, b.rate))
                .collect()),
        }
    }

    fn carriers(
        file: &RuleSetFile,
        base_dir: Option<&Path>,
    ) -> Result<Vec<Carrier>, RuleSetLoaderError> {
        match &file.carriers_csv {
            Some(_) if !file.carriers.is_empty() => {
                Err(RuleSetLoaderError::ConflictingSources("carriers"))
            }
            Some(csv_path) => {
                let path = resolve(base_dir, csv_path);
                let records = CarrierLoader::parse(open(&path)?)?;
                Ok(CarrierLoader::carriers(&records))
            }
            None => Ok(file
                .carriers
                .iter()
                .map(|c| Carrier {
                    code: c.code.clone(),
                    display_name: c.display_name.clone(),
                    prefixes: c.prefixes.clone(),
                })
                .collect()),
        }
    }
}

/// Reads every `*.toml` rule set in a directory.
pub struct RuleBookLoader;

impl RuleBookLoader {
    /// Loads all rule sets in `dir` into a [`RuleBook`].
    ///
    /// Files are read in name order; the book itself orders versions by
    /// effective date.
    pub fn from_dir(dir: &Path) -> Result<RuleBook, RuleSetLoaderError> {
        let io_error = |source| RuleSetLoaderError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.extension().is_some_and(|ext| ext == "toml") {
                paths.push(path);
            }
        }
        paths.sort();

        let sets = paths
            .iter()
            .map(|path| RuleSetLoader::from_path(path))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RuleBook::new(sets)?)
    }
}

fn resolve(
    base_dir: Option<&Path>,
    path: &Path,
) -> PathBuf {
    match base_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}

fn open(path: &Path) -> Result<File, RuleSetLoaderError> {
    File::open(path).map_err(|source| RuleSetLoaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const INLINE: &str = r#"
version = "test"
effective_from = "2021-01-01"
personal_deduction = "11000000"
dependent_deduction = "4400000"
corporate_rate = "0.20"
vat_rates = [0, 5, 10]

[[brackets]]
lower_bound = "0"
upper_bound = "5000000"
rate = "0.05"

[[brackets]]
lower_bound = "5000000"
rate = "0.10"

[[carriers]]
code = "viettel"
display_name = "Viettel"
prefixes = ["096", "097"]
"#;

    #[test]
    fn parses_inline_rule_set() {
        let rules = RuleSetLoader::from_toml_str(INLINE, None).unwrap();

        assert_eq!(rules.version, "test");
        assert_eq!(
            rules.effective_from,
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()
        );
        assert_eq!(rules.personal_deduction, dec!(11000000));
        assert_eq!(rules.corporate_rate, dec!(0.20));
        assert_eq!(
            rules.brackets,
            vec![
                TaxBracket::new(dec!(0), Some(dec!(5000000)), dec!(0.05)),
                TaxBracket::new(dec!(5000000), None, dec!(0.10)),
            ]
        );
        assert_eq!(
            rules.carriers,
            vec![Carrier::new("viettel", "Viettel", &["096", "097"])]
        );
    }

    #[test]
    fn rejects_invalid_rules() {
        let text = INLINE.replace("rate = \"0.10\"", "rate = \"0.01\"");

        let err = RuleSetLoader::from_toml_str(&text, None).unwrap_err();

        assert!(matches!(
            err,
            RuleSetLoaderError::InvalidRules(RuleSetError::RateNotIncreasing { level: 2 })
        ));
    }

    #[test]
    fn rejects_unknown_keys() {
        let text = format!("{INLINE}\nsurcharge = 1\n");

        let err = RuleSetLoader::from_toml_str(&text, None).unwrap_err();

        assert!(matches!(err, RuleSetLoaderError::Toml(_)));
    }

    #[test]
    fn rejects_inline_and_csv_brackets_together() {
        let text = INLINE.replace(
            "vat_rates = [0, 5, 10]",
            "vat_rates = [0, 5, 10]\nbrackets_csv = \"brackets.csv\"",
        );

        let err = RuleSetLoader::from_toml_str(&text, None).unwrap_err();

        assert!(matches!(
            err,
            RuleSetLoaderError::ConflictingSources("brackets")
        ));
    }

    #[test]
    fn missing_csv_is_an_io_error() {
        let text = INLINE.replace(
            "vat_rates = [0, 5, 10]",
            "vat_rates = [0, 5, 10]\ncarriers_csv = \"nope.csv\"",
        );
        let text = text.replace(
            "[[carriers]]\ncode = \"viettel\"\ndisplay_name = \"Viettel\"\nprefixes = [\"096\", \"097\"]\n",
            "",
        );

        let err = RuleSetLoader::from_toml_str(&text, Some(Path::new("/nonexistent"))).unwrap_err();

        match err {
            RuleSetLoaderError::Io { path, .. } => {
                assert_eq!(path, PathBuf::from("/nonexistent/nope.csv"));
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        assert_eq!(
            resolve(Some(Path::new("/rules")), Path::new("/data/b.csv")),
            PathBuf::from("/data/b.csv")
        );
        assert_eq!(
            resolve(Some(Path::new("/rules")), Path::new("b.csv")),
            PathBuf::from("/rules/b.csv")
        );
        assert_eq!(resolve(None, Path::new("b.csv")), PathBuf::from("b.csv"));
    }
}
