use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{Carrier, TaxBracket};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur when loading bracket or carrier tables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("no brackets found for rule set version '{0}'")]
    UnknownVersion(String),

    #[error("version '{version}' expected bracket level {expected}, found {found}")]
    InvalidLevel {
        version: String,
        expected: usize,
        found: usize,
    },
}

impl From<csv::Error> for TableLoaderError {
    fn from(err: csv::Error) -> Self {
        TableLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from a tax brackets CSV file.
///
/// - `version`: rule-set version the bracket belongs to (e.g. `2020`)
/// - `level`: 1-based bracket number
/// - `lower_bound`: start of the bracket
/// - `upper_bound`: end of the bracket (empty for unlimited)
/// - `rate`: marginal rate as a decimal (e.g. 0.05 for 5%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaxBracketRecord {
    pub version: String,
    pub level: usize,
    pub lower_bound: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for progressive tax brackets kept in CSV.
///
/// One file can hold several rule-set versions; [`TaxBracketLoader::brackets_for`]
/// picks out one of them.
pub struct TaxBracketLoader;

impl TaxBracketLoader {
    /// Parse tax bracket records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<TaxBracketRecord>, TableLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: TaxBracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Ordered brackets for `version`.
    ///
    /// Rows may appear in any order but their levels must run 1, 2, 3, ...
    /// without gaps or repeats. Range and rate invariants are left to
    /// [`TaxRules::validate`](tax_core::TaxRules::validate).
    pub fn brackets_for(
        records: &[TaxBracketRecord],
        version: &str,
    ) -> Result<Vec<TaxBracket>, TableLoaderError> {
        let mut rows: Vec<&TaxBracketRecord> =
            records.iter().filter(|r| r.version == version).collect();

        if rows.is_empty() {
            return Err(TableLoaderError::UnknownVersion(version.to_string()));
        }

        rows.sort_by_key(|r| r.level);

        for (index, row) in rows.iter().enumerate() {
            if row.level != index + 1 {
                return Err(TableLoaderError::InvalidLevel {
                    version: version.to_string(),
                    expected: index + 1,
                    found: row.level,
                });
            }
        }

        Ok(rows
            .into_iter()
            .map(|r| TaxBracket::new(r.lower_bound, r.upper_bound, r.rate))
            .collect())
    }
}

/// A single record from a carrier prefix CSV file: one row per prefix.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CarrierRecord {
    pub carrier: String,
    pub display_name: String,
    pub prefix: String,
}

/// Loader for the carrier prefix table kept in CSV.
pub struct CarrierLoader;

impl CarrierLoader {
    /// Parse carrier prefix records from a CSV reader.
    ///
    /// Prefixes are read as text so leading zeros survive.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<CarrierRecord>, TableLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: CarrierRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Groups prefix rows into carriers, keeping the order in which each
    /// carrier first appears.
    pub fn carriers(records: &[CarrierRecord]) -> Vec<Carrier> {
        let mut carriers: Vec<Carrier> = Vec::new();

        for record in records {
            let prefix = record.prefix.trim().to_string();
            match carriers.iter_mut().find(|c| c.code == record.carrier) {
                Some(carrier) => {
                    if carrier.display_name != record.display_name {
                        warn!(
                            carrier = %record.carrier,
                            kept = %carrier.display_name,
                            ignored = %record.display_name,
                            "conflicting display names"
                        );
                    }
                    carrier.prefixes.push(prefix);
                }
                None => carriers.push(Carrier {
                    code: record.carrier.clone(),
                    display_name: record.display_name.clone(),
                    prefixes: vec![prefix],
                }),
            }
        }

        carriers
    }
}
